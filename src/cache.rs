// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local repository cache.
//!
//! Dots keeps every dotfile repository it downloads in one place called the
//! __cache__. The cache is a plain directory whose layout mirrors the fully
//! qualified identifier of each repository.
//!
//! # Cache Layout
//!
//! The default location of the cache is `$XDG_CACHE_HOME/dots`. A repository
//! identified by `github.com/YourName/dotfiles` lives at
//! `$XDG_CACHE_HOME/dots/github.com/YourName/dotfiles`, and must contain a
//! `.dots.yml` or `.dots.yaml` at its top-level. A repository that lacks a
//! configuration file is not considered to be cached at all.
//!
//! # Upgrading Everything
//!
//! [`Cache::upgrade_all`] walks the cache breadth first. By default every
//! visited node is handed to [`Vcs::upgrade`], be it the cache root, a
//! namespace directory like `github.com/YourName`, a repository, or a stray
//! file. Most of those nodes are not repositories, so the upgrade of the
//! cache root itself usually fails first. [`UpgradeScope::Repositories`]
//! restricts upgrades to directories that actually are repositories.
//!
//! # See Also
//!
//! 1. [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
//! 2. [`vcs`]

pub mod vcs;

use crate::{
    cache::vcs::{Git2Vcs, Vcs, VcsError},
    config::{ConfigError, DotsConfig},
    locate::find_config_in_dir,
    path::BaseDirs,
};

use std::{
    collections::VecDeque,
    fs::{metadata, read_dir, remove_dir_all},
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Which nodes [`Cache::upgrade_all`] hands to the version control backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeScope {
    /// Upgrade every visited file and directory.
    #[default]
    EveryNode,

    /// Upgrade only repositories, and do not descend into them.
    Repositories,
}

/// Local cache of dotfile repositories.
#[derive(Debug)]
pub struct Cache<V = Git2Vcs>
where
    V: Vcs,
{
    root: PathBuf,
    vcs: V,
    scope: UpgradeScope,
}

impl<V> Cache<V>
where
    V: Vcs,
{
    /// Open cache at default location `$XDG_CACHE_HOME/dots`.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::CreateRoot`] if cache root cannot be created.
    pub fn try_default(dirs: &BaseDirs, vcs: V) -> Result<Self> {
        Self::open(dirs.cache().join("dots"), vcs)
    }

    /// Construct cache over target root without touching the file system.
    pub fn new(root: impl Into<PathBuf>, vcs: V) -> Self {
        Self {
            root: root.into(),
            vcs,
            scope: UpgradeScope::default(),
        }
    }

    /// Open cache at target root, creating it if missing.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::CreateRoot`] if cache root cannot be created.
    pub fn open(root: impl Into<PathBuf>, vcs: V) -> Result<Self> {
        let root = root.into();
        mkdirp::mkdirp(&root).map_err(|err| CacheError::CreateRoot {
            source: err,
            path: root.clone(),
        })?;

        Ok(Self::new(root, vcs))
    }

    /// Set which nodes [`Cache::upgrade_all`] upgrades.
    pub fn with_scope(mut self, scope: UpgradeScope) -> Self {
        self.scope = scope;
        self
    }

    /// Root directory of cache.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Determine path of repository inside cache.
    ///
    /// Identifiers are expected to be of the form `$domain/$user/$repo`.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::InvalidIdentifier`] if identifier is empty, or
    ///   would escape the cache root.
    pub fn repo_path(&self, identifier: &str) -> Result<PathBuf> {
        let relative = Path::new(identifier);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if identifier.is_empty() || escapes {
            return Err(CacheError::InvalidIdentifier(identifier.to_string()));
        }

        Ok(self.root.join(relative))
    }

    /// Check if repository is already cached.
    ///
    /// A repository is cached if its directory exists, and a configuration
    /// file can be found directly inside it. Any file system error counts as
    /// a miss.
    pub fn is_hit(&self, identifier: &str) -> bool {
        let Ok(repo_path) = self.repo_path(identifier) else {
            return false;
        };

        match metadata(&repo_path) {
            Ok(info) if info.is_dir() => {}
            _ => return false,
        }

        match find_config_in_dir(&repo_path) {
            Ok(config_path) => metadata(config_path).is_ok(),
            Err(_) => false,
        }
    }

    /// Parse configuration of cached repository.
    ///
    /// Call [`Cache::is_hit`] first, the cache cannot tell on its own whether
    /// the repository is present.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::InvalidIdentifier`] if identifier is malformed.
    /// - Return [`CacheError::Config`] if configuration cannot be found or
    ///   parsed.
    pub fn config(&self, identifier: &str, dirs: &BaseDirs) -> Result<DotsConfig> {
        let repo_path = self.repo_path(identifier)?;
        let config_path = find_config_in_dir(&repo_path).map_err(ConfigError::from)?;

        Ok(DotsConfig::parse_file(config_path, dirs)?)
    }

    /// Make sure repository is cached, cloning it over HTTPS on a miss.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::InvalidIdentifier`] if identifier is malformed.
    /// - Return [`CacheError::CreateRoot`] if parent directories cannot be
    ///   created.
    /// - Return [`CacheError::Vcs`] if cloning fails.
    #[instrument(skip(self), level = "debug")]
    pub fn fetch(&self, identifier: &str) -> Result<PathBuf> {
        let repo_path = self.repo_path(identifier)?;
        if self.is_hit(identifier) {
            debug!("cache hit for {identifier}");
            return Ok(repo_path);
        }

        if let Some(parent) = repo_path.parent() {
            mkdirp::mkdirp(parent).map_err(|err| CacheError::CreateRoot {
                source: err,
                path: parent.to_path_buf(),
            })?;
        }

        info!("cache miss for {identifier}");
        self.vcs
            .clone_repo(&format!("https://{identifier}"), &repo_path)?;

        Ok(repo_path)
    }

    /// Remove entire cache.
    ///
    /// Removing a cache whose root does not exist is not an error.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::Clean`] if cache root cannot be removed.
    #[instrument(skip(self), level = "debug")]
    pub fn clean(&self) -> Result<()> {
        match remove_dir_all(&self.root) {
            Ok(()) => {
                info!("removed cache {:?}", self.root.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CacheError::Clean {
                source: err,
                path: self.root.clone(),
            }),
        }
    }

    /// Upgrade repository at target path.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::Vcs`] if upgrade fails.
    pub fn upgrade(&self, path: impl AsRef<Path>) -> Result<()> {
        Ok(self.vcs.upgrade(path.as_ref())?)
    }

    /// Upgrade cached repositories breadth first.
    ///
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// - Return [`CacheError::Stat`] if a visited node cannot be inspected.
    /// - Return [`CacheError::ReadDir`] if a visited directory cannot be
    ///   listed.
    /// - Return [`CacheError::Vcs`] if an upgrade fails.
    #[instrument(skip(self), level = "debug")]
    pub fn upgrade_all(&self) -> Result<()> {
        let mut queue = VecDeque::from([self.root.clone()]);

        while let Some(front) = queue.pop_front() {
            let info = metadata(&front).map_err(|err| CacheError::Stat {
                source: err,
                path: front.clone(),
            })?;

            match self.scope {
                UpgradeScope::EveryNode => {
                    if info.is_dir() {
                        queue.extend(list_dir(&front)?);
                    }
                    self.upgrade(&front)?;
                }
                UpgradeScope::Repositories => {
                    if !info.is_dir() {
                        warn!("skip stray file {:?}", front.display());
                        continue;
                    }

                    if self.vcs.is_repository(&front) {
                        self.upgrade(&front)?;
                    } else {
                        debug!("descend into {:?}", front.display());
                        queue.extend(list_dir(&front)?);
                    }
                }
            }
        }

        Ok(())
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let to_error = |err| CacheError::ReadDir {
        source: err,
        path: dir.to_path_buf(),
    };

    let mut entries = Vec::new();
    for entry in read_dir(dir).map_err(to_error)? {
        entries.push(entry.map_err(to_error)?.path());
    }
    entries.sort();

    Ok(entries)
}

/// All possible error types for cache interaction.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Repository identifier cannot be mapped into the cache.
    #[error("invalid repository identifier {0:?}")]
    InvalidIdentifier(String),

    /// Cache directory cannot be created.
    #[error("failed to create cache directory {:?}", path.display())]
    CreateRoot {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cache root cannot be removed.
    #[error("failed to remove cache {:?}", path.display())]
    Clean {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Node in cache cannot be inspected.
    #[error("failed to stat {:?}", path.display())]
    Stat {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory in cache cannot be listed.
    #[error("failed to read directory {:?}", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cached configuration cannot be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version control backend fails.
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

/// Friendly result alias :3
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
