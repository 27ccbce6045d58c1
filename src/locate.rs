// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration file discovery.
//!
//! A dots configuration file is always named either `.dots.yml` or
//! `.dots.yaml`. It can be discovered in two ways:
//!
//! 1. __Upward search__ through [`find_config`]. Starting from some
//!    directory, check its immediate entries, then those of its parent, and
//!    so on until the mount point is reached.
//! 2. __Single directory search__ through [`find_config_in_dir`]. Only check
//!    the immediate entries of one directory. The repository cache uses this
//!    to decide whether a cached repository is usable.
//!
//! # Tie Breaking
//!
//! Directory entries are inspected in file name order. Thus, if both
//! `.dots.yaml` and `.dots.yml` live in the same directory, then `.dots.yaml`
//! always wins.

use std::{
    fs::read_dir,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Valid file names for a dots configuration file.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".dots.yml", ".dots.yaml"];

/// Check if file name belongs to a dots configuration file.
pub fn is_config_file_name(name: impl AsRef<std::ffi::OsStr>) -> bool {
    CONFIG_FILE_NAMES
        .iter()
        .any(|valid| name.as_ref() == std::ffi::OsStr::new(valid))
}

/// Find configuration file going upward until mount point is reached.
///
/// The mount point is reached once the parent of the current directory is
/// the current directory itself, or does not exist at all.
///
/// # Errors
///
/// - Return [`Error::ReadDir`] if any visited directory cannot be listed.
/// - Return [`Error::MountPoint`] if no configuration file was found.
pub fn find_config(start: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start.as_ref();
    let mut current = start;

    loop {
        debug!("search for dots config in {:?}", current.display());
        if let Some(found) = scan_dir(current)? {
            return Ok(found);
        }

        match current.parent() {
            Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                current = parent;
            }
            _ => {
                return Err(Error::MountPoint(MountPointError {
                    start_point: start.to_path_buf(),
                    end_point: current.to_path_buf(),
                }))
            }
        }
    }
}

/// Find configuration file among the immediate entries of a directory.
///
/// # Errors
///
/// - Return [`Error::ReadDir`] if directory cannot be listed.
/// - Return [`Error::NotInDir`] if no configuration file was found.
pub fn find_config_in_dir(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    scan_dir(dir)?.ok_or_else(|| Error::NotInDir {
        dir: dir.to_path_buf(),
    })
}

fn scan_dir(dir: &Path) -> Result<Option<PathBuf>> {
    let to_error = |err| Error::ReadDir {
        source: err,
        path: dir.to_path_buf(),
    };

    let mut names = Vec::new();
    for entry in read_dir(dir).map_err(to_error)? {
        names.push(entry.map_err(to_error)?.file_name());
    }

    // INVARIANT: Inspect entries in name order so the winner is stable.
    names.sort();

    Ok(names
        .into_iter()
        .find(|name| is_config_file_name(name))
        .map(|name| dir.join(name)))
}

/// Upward search reached the mount point without finding a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "failed to find `.dots.ya?ml` starting from: `{}` reached mount point `{}`",
    start_point.display(),
    end_point.display()
)]
pub struct MountPointError {
    /// Directory where search started at.
    pub start_point: PathBuf,

    /// Highest directory reached that ended discovery, generally `/` on Unix.
    pub end_point: PathBuf,
}

/// Configuration discovery error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Directory could not be listed.
    #[error("failed to read directory `{}`", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Upward search was exhausted.
    #[error(transparent)]
    MountPoint(#[from] MountPointError),

    /// Single directory search found nothing.
    #[error("`.dots.ya?ml` doesn't exist in dir {}", dir.display())]
    NotInDir { dir: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
