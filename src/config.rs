// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the dots configuration file, and resolve it into a
//! typed [`DotsConfig`] whose dotfile paths are fully expanded.
//!
//! # General Layout
//!
//! A dots configuration is a YAML file named `.dots.yml` or `.dots.yaml`
//! that lives at the top-level of a dotfile repository:
//!
//! ```yaml
//! name: YourName/dotfiles
//! license: GPLv3
//! URL: https://github.com/YourName/dotfiles
//! dotfiles:
//!   - name: bspwm
//!     description: Binary space partition window manager
//!   - name: keybinds
//!     description: Escape and capslock swap
//!     source: <root>/keybinds
//!     destination: "~"
//!     install_children: true
//! ```
//!
//! Unknown keys are ignored, and missing keys take their default value. A bare
//! YAML `~` is null, so a destination of the home directory must be quoted. See
//! [`crate::path`] for how `source` and `destination` get expanded.

use crate::{
    locate::{self, find_config},
    path::{expand_destination, expand_source, BaseDirs},
};

use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Full dots configuration.
///
/// Metadata about a collection of dotfiles, plus the ordered listing of the
/// dotfiles themselves.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DotsConfig {
    /// Name that identifies the collection, generally `YourName/dotfiles`.
    pub name: String,

    /// License the dotfiles are distributed under.
    pub license: String,

    /// URL to upstream.
    #[serde(rename = "URL")]
    pub url: String,

    /// Dotfiles in declaration order.
    #[serde(deserialize_with = "null_as_default")]
    pub dotfiles: Vec<Dotfile>,
}

impl DotsConfig {
    /// Parse configuration file at target path.
    ///
    /// Every dotfile has its source expanded relative to the directory that
    /// contains the configuration file, and its destination expanded relative
    /// to the user's platform directories.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is malformed.
    #[instrument(skip(path, dirs), level = "debug")]
    pub fn parse_file(path: impl AsRef<Path>, dirs: &BaseDirs) -> Result<Self> {
        let path = path.as_ref();
        debug!("parse dots config {:?}", path.display());
        let data = read_to_string(path).map_err(|err| ConfigError::Read {
            source: err,
            path: path.to_path_buf(),
        })?;

        let mut config = Self::decode(&data).map_err(|err| ConfigError::Deserialize {
            source: err,
            path: path.to_path_buf(),
        })?;

        let project_root = path.parent().unwrap_or_else(|| Path::new(""));
        config.expand(project_root, dirs);

        Ok(config)
    }

    /// Find and parse the nearest configuration file at or above `start`.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Absolute`] if `start` cannot be made absolute.
    /// - Return [`ConfigError::Locate`] if no configuration file can be found.
    /// - Return any error of [`DotsConfig::parse_file`].
    pub fn parse(start: impl AsRef<Path>, dirs: &BaseDirs) -> Result<Self> {
        let start = start.as_ref();
        let start = std::path::absolute(start).map_err(|err| ConfigError::Absolute {
            source: err,
            path: start.to_path_buf(),
        })?;

        Self::parse_file(find_config(&start)?, dirs)
    }

    /// Starter configuration written out by `dots init`.
    pub fn template() -> Self {
        Self {
            name: "YourName/dotfiles".into(),
            license: "<put license here>".into(),
            url: "<put url to upstream here>".into(),
            dotfiles: vec![Dotfile {
                name: "example".into(),
                description: "<put one sentence description here>".into(),
                ..Default::default()
            }],
        }
    }

    fn decode(data: &str) -> Result<Self, serde_yaml::Error> {
        // INVARIANT: An empty document is an empty configuration.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(data)
    }

    /// Expand source and destination of every dotfile in declaration order.
    pub fn expand(&mut self, project_root: &Path, dirs: &BaseDirs) {
        for dotfile in &mut self.dotfiles {
            dotfile.source = expand_source(&dotfile.name, &dotfile.source, project_root);
            dotfile.destination = expand_destination(&dotfile.name, &dotfile.destination, dirs);
        }
    }
}

impl FromStr for DotsConfig {
    type Err = ConfigError;

    /// Decode configuration without performing any path expansion.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::decode(data).map_err(ConfigError::Decode)
    }
}

impl Display for DotsConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            serde_yaml::to_string(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// A specific dotfile.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Dotfile {
    /// Name that identifies this dotfile.
    pub name: String,

    /// Brief description of this dotfile or collection of dotfiles.
    pub description: String,

    /// Path to this dotfile.
    #[serde(deserialize_with = "null_as_default")]
    pub source: PathBuf,

    /// Path to install to.
    #[serde(deserialize_with = "null_as_default")]
    pub destination: PathBuf,

    /// Treat source as a directory whose immediate entries are each a dotfile.
    pub install_children: bool,
}

// INVARIANT: YAML null (`~` or a key without value) means "not set".
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read file `{}`", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error("failed to parse `{}`", path.display())]
    Deserialize {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration from memory.
    #[error(transparent)]
    Decode(serde_yaml::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(serde_yaml::Error),

    /// Failed to make search start point absolute.
    #[error("failed to resolve absolute path of `{}`", path.display())]
    Absolute {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to locate configuration file.
    #[error(transparent)]
    Locate(#[from] locate::Error),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
