// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for dotfiles that need to be
//! validated or cached in some way.
//!
//! # Platform Directories
//!
//! The user's home, configuration, and cache directories are looked up once
//! through [`BaseDirs::try_new`] and then handed to whatever needs them. No
//! other part of the crate asks the operating system for these paths, so
//! parsing and validation only ever depend on their inputs.
//!
//! # Expansion Rules
//!
//! Each dotfile carries a raw source and destination string. Both go through
//! environment variable substitution, but they differ in their defaults and
//! in which placeholder they understand:
//!
//! | Field         | Default when blank        | Placeholder               |
//! |---------------|---------------------------|---------------------------|
//! | `source`      | `<root>/$name`            | leading `<root>`          |
//! | `destination` | `$XDG_CONFIG_HOME/$name`  | leading `~` or exact `~`  |
//!
//! Here `<root>` is the directory that contains the configuration file.
//! Undefined environment variables expand to nothing, and every result is
//! cleaned lexically, so `~/.vim/`, `~/./.vim`, and `~/.vim` all name the
//! same path.

use std::path::{is_separator, Component, Path, PathBuf};

/// Placeholder for the directory containing the configuration file.
pub const ROOT_TOKEN: &str = "<root>";

/// Absolute paths to the platform directories of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirs {
    home: PathBuf,
    config: PathBuf,
    cache: PathBuf,
}

impl BaseDirs {
    /// Construct from explicit paths.
    pub fn new(
        home: impl Into<PathBuf>,
        config: impl Into<PathBuf>,
        cache: impl Into<PathBuf>,
    ) -> Self {
        Self {
            home: home.into(),
            config: config.into(),
            cache: cache.into(),
        }
    }

    /// Ask the operating system for the current user's directories.
    ///
    /// Does not check if the paths returned actually exist.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if any of the directories cannot be determined.
    ///
    /// # See Also
    ///
    /// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            home: dirs::home_dir().ok_or(NoWayHome("home"))?,
            config: dirs::config_dir().ok_or(NoWayHome("config"))?,
            cache: dirs::cache_dir().ok_or(NoWayHome("cache"))?,
        })
    }

    /// User's home directory.
    pub fn home(&self) -> &Path {
        self.home.as_path()
    }

    /// User's configuration directory, e.g., `$XDG_CONFIG_HOME`.
    pub fn config(&self) -> &Path {
        self.config.as_path()
    }

    /// User's cache directory, e.g., `$XDG_CACHE_HOME`.
    pub fn cache(&self) -> &Path {
        self.cache.as_path()
    }
}

/// Expand raw source path of a dotfile.
///
/// A blank source defaults to `<root>/$name`. Environment variables are
/// substituted next, and finally a leading `<root>` is replaced with
/// `project_root`.
pub fn expand_source(name: &str, raw: &Path, project_root: &Path) -> PathBuf {
    let raw = if raw.as_os_str().is_empty() {
        format!("{ROOT_TOKEN}{}{name}", std::path::MAIN_SEPARATOR)
    } else {
        raw.to_string_lossy().into_owned()
    };
    let expanded = substitute_env(&raw);

    match expanded.strip_prefix(ROOT_TOKEN) {
        Some(rest) => join_relative(project_root, rest),
        None => clean(Path::new(&expanded)),
    }
}

/// Expand raw destination path of a dotfile.
///
/// A blank destination defaults to `$XDG_CONFIG_HOME/$name`. Environment
/// variables are substituted next, and finally `~` or a leading `~/` is
/// replaced with the user's home directory.
pub fn expand_destination(name: &str, raw: &Path, dirs: &BaseDirs) -> PathBuf {
    let raw = if raw.as_os_str().is_empty() {
        dirs.config().join(name).to_string_lossy().into_owned()
    } else {
        raw.to_string_lossy().into_owned()
    };
    let expanded = substitute_env(&raw);

    if expanded == "~" {
        return clean(dirs.home());
    }

    match expanded.strip_prefix("~/") {
        Some(rest) => join_relative(dirs.home(), rest),
        None => clean(Path::new(&expanded)),
    }
}

// INVARIANT: Undefined or non-unicode variables become empty, never an error.
fn substitute_env(raw: &str) -> String {
    shellexpand::env_with_context_no_errors(raw, |var: &str| {
        Some(std::env::var(var).unwrap_or_default())
    })
    .into_owned()
}

// INVARIANT: Leading separators must not turn the remainder into an absolute
// path, otherwise Path::join would discard the base entirely.
fn join_relative(base: &Path, rest: &str) -> PathBuf {
    let rest = rest.trim_start_matches(is_separator);
    clean(&base.join(rest))
}

/// Lexically clean a path.
///
/// Drops `.` segments, repeated and trailing separators, and resolves `..`
/// against the preceding segment. A `..` directly under the root is dropped,
/// a leading `..` of a relative path is kept. Never touches the file system,
/// so symlinks are not resolved.
pub fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                cleaned.pop();
                depth -= 1;
            }
            Component::ParentDir if cleaned.has_root() => {}
            Component::ParentDir => cleaned.push(".."),
            Component::Normal(segment) => {
                cleaned.push(segment);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => cleaned.push(component),
        }
    }

    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }

    cleaned
}

/// No way to determine one of the user's platform directories.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's {0} directory")]
pub struct NoWayHome(pub &'static str);

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
