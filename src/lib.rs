// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Discover, resolve, and validate dots configurations.
//!
//! A __dots configuration__ describes a named collection of dotfiles: where
//! each dotfile lives inside its repository, and where it should be installed
//! to. Dots locates the configuration file, expands every path in it, checks
//! that the result is safe to use, and keeps a local cache of downloaded
//! dotfile repositories.
//!
//! # Flow
//!
//! 1. [`locate::find_config`] walks upward to the nearest `.dots.ya?ml`.
//! 2. [`DotsConfig::parse_file`] loads it and expands paths via [`path`].
//! 3. [`validate::validate`] reports errors and warnings.
//!
//! The [`Cache`] works on its own, keeping repositories under
//! `$XDG_CACHE_HOME/dots`.

pub mod cache;
pub mod config;
pub mod locate;
pub mod path;
pub mod validate;

pub use cache::{vcs::Git2Vcs, Cache, UpgradeScope};
pub use config::{DotsConfig, Dotfile};
pub use locate::{find_config, find_config_in_dir, MountPointError};
pub use path::BaseDirs;
pub use validate::{validate, validate_file, ValidationError, Warning};
