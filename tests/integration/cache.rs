// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{url_of, RepoFixture};

use anyhow::Result;
use dots::{
    cache::vcs::{Git2Vcs, Vcs},
    BaseDirs, Cache, UpgradeScope,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs::create_dir_all;
use tempfile::TempDir;

const IDENTIFIER: &str = "example.com/john/dots";

#[test]
fn cache_upgrades_cloned_repositories_only() -> Result<()> {
    let tmp = TempDir::new()?;
    let upstream = RepoFixture::init(tmp.path().join("upstream"))?;
    upstream.stage_and_commit(
        ".dots.yml",
        indoc! {r#"
            name: John/dots
            license: MIT
            dotfiles:
              - name: bash
                description: Bourne again shell
                destination: "~"
        "#},
    )?;

    let cache = Cache::open(tmp.path().join("cache"), Git2Vcs::default())?
        .with_scope(UpgradeScope::Repositories);
    assert!(!cache.is_hit(IDENTIFIER));

    let repo_path = cache.repo_path(IDENTIFIER)?;
    create_dir_all(repo_path.parent().unwrap())?;
    Git2Vcs::default().clone_repo(&url_of(tmp.path().join("upstream")), &repo_path)?;
    std::fs::write(cache.root().join("stray.txt"), "not a repository")?;
    assert!(cache.is_hit(IDENTIFIER));
    assert_eq!(cache.fetch(IDENTIFIER)?, repo_path);

    let dirs = BaseDirs::new(
        tmp.path().join("home"),
        tmp.path().join("config"),
        tmp.path().join("cache"),
    );
    let config = cache.config(IDENTIFIER, &dirs)?;
    assert_eq!(config.name, "John/dots");
    assert_eq!(config.dotfiles[0].source, repo_path.join("bash"));
    assert_eq!(config.dotfiles[0].destination, tmp.path().join("home"));

    let expect = upstream.stage_and_commit("bash/.bashrc", "set -o vi\n")?;
    cache.upgrade_all()?;
    assert_eq!(RepoFixture::open(&repo_path)?.head()?, expect);
    assert!(repo_path.join("bash/.bashrc").exists());

    cache.clean()?;
    assert!(!cache.root().exists());
    assert!(!cache.is_hit(IDENTIFIER));

    Ok(())
}

#[test]
fn cache_upgrade_every_node_fails_on_plain_directory() -> Result<()> {
    let tmp = TempDir::new()?;
    let cache = Cache::open(tmp.path().join("cache"), Git2Vcs::default())?;
    create_dir_all(cache.root().join("example.com"))?;

    assert!(cache.upgrade_all().is_err());

    Ok(())
}
