// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use anyhow::Result;
use dots::{find_config, validate_file, BaseDirs, DotsConfig};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs::{create_dir_all, write};
use tempfile::TempDir;

struct Project {
    tmp: TempDir,
}

impl Project {
    fn new(config: &str) -> Result<Self> {
        let tmp = TempDir::new()?;
        create_dir_all(tmp.path().join("dots/bspwm"))?;
        create_dir_all(tmp.path().join("dots/polybar/config"))?;
        create_dir_all(tmp.path().join("dots/polybar/scripts"))?;
        create_dir_all(tmp.path().join("dots/deep/nested"))?;
        write(tmp.path().join("dots/bspwm/bspwmrc"), "bspc monitor -d I II\n")?;
        write(tmp.path().join("dots/.dots.yml"), config)?;
        Ok(Self { tmp })
    }

    fn root(&self) -> std::path::PathBuf {
        self.tmp.path().join("dots")
    }

    fn dirs(&self) -> BaseDirs {
        BaseDirs::new(
            self.tmp.path().join("home"),
            self.tmp.path().join("home/.config"),
            self.tmp.path().join("home/.cache"),
        )
    }
}

#[test]
fn validate_file_accepts_sound_config() -> Result<()> {
    let project = Project::new(indoc! {r#"
        name: John/dotfiles
        license: GPLv3
        URL: https://github.com/John/dotfiles
        dotfiles:
          - name: bspwm
            description: Tiling window manager
          - name: polybar
            description: Status bar
            source: <root>/polybar
            destination: ~/.config/polybar
            install_children: true
    "#})?;

    let found = find_config(project.root().join("deep/nested"))?;
    assert_eq!(found, project.root().join(".dots.yml"));
    assert!(validate_file(&found, &project.dirs()).is_none());

    let config = DotsConfig::parse_file(&found, &project.dirs())?;
    assert_eq!(config.dotfiles[0].source, project.root().join("bspwm"));
    assert_eq!(
        config.dotfiles[1].destination,
        project.tmp.path().join("home/.config/polybar")
    );

    Ok(())
}

#[test]
fn validate_file_reports_fatal_error_with_warnings() -> Result<()> {
    let project = Project::new(indoc! {r#"
        license: MIT
        dotfiles:
          - name: bspwm
          - name: bspwm
            source: <root>/polybar
    "#})?;

    let result = validate_file(project.root().join(".dots.yml"), &project.dirs())
        .expect("validation should fail");
    assert!(result.is_err());
    assert_eq!(
        result.to_string(),
        "dotfiles with index `2` and `1` both have the same name `bspwm`"
    );
    assert!(!result.warnings.is_empty());

    Ok(())
}

#[test]
fn validate_file_reports_unreadable_config() -> Result<()> {
    let project = Project::new("dotfiles: [\n")?;

    let result = validate_file(project.root().join(".dots.yml"), &project.dirs())
        .expect("validation should fail");
    assert!(result.is_err());
    assert!(result.warnings.is_empty());

    Ok(())
}
