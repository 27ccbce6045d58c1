// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control for cached repositories.
//!
//! The repository cache never talks to Git directly. Instead it goes through
//! the [`Vcs`] trait, which knows how to recognize a repository, clone one,
//! and bring one up to date. [`Git2Vcs`] is the libgit2 backed implementation
//! used outside of tests.
//!
//! # Upgrading
//!
//! An upgrade fetches the currently checked out branch from the `origin`
//! remote, and fast-forwards the local branch to it. Cached repositories are
//! never edited by hand, so anything other than a fast-forward means someone
//! tampered with the cache, and the upgrade is refused.

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Config, FetchOptions, RemoteCallbacks, Repository,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument};

/// Version control capability needed by the repository cache.
pub trait Vcs {
    /// Check if path is the top-level of a repository.
    fn is_repository(&self, path: &Path) -> bool;

    /// Clone remote repository at `url` into `path`.
    fn clone_repo(&self, url: &str, path: &Path) -> Result<()>;

    /// Update repository at `path` to the latest upstream revision.
    fn upgrade(&self, path: &Path) -> Result<()>;
}

/// Version control through libgit2.
///
/// Network progress is reported through a progress bar. If any credentials
/// are required, then the user will be prompted for them, and the progress
/// bar will be suspended for user input.
#[derive(Debug, Clone)]
pub struct Git2Vcs {
    bar: ProgressBar,
}

impl Git2Vcs {
    /// Construct new libgit2 backend reporting progress through `bar`.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    fn authenticator(&self) -> GitAuthenticator {
        GitAuthenticator::default().set_prompter(IndicatifPrompter::new(self.bar.clone()))
    }

    fn fetch_options<'cb>(
        &self,
        authenticator: &'cb GitAuthenticator,
        config: &'cb Config,
    ) -> FetchOptions<'cb> {
        let bar = self.bar.clone();
        let mut throttle = Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(config));
        rc.transfer_progress(move |progress| {
            if throttle.elapsed() > Duration::from_millis(10) {
                throttle = Instant::now();
                bar.set_length(progress.total_objects() as u64);
                bar.set_position(progress.received_objects() as u64);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        fo
    }

    fn start_bar(&self, message: String) -> Result<()> {
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        self.bar.set_style(style);
        self.bar.set_message(message);
        if !self.bar.is_hidden() {
            self.bar.enable_steady_tick(Duration::from_millis(100));
        }

        Ok(())
    }
}

impl Default for Git2Vcs {
    /// Construct libgit2 backend that reports no progress.
    fn default() -> Self {
        Self::new(ProgressBar::hidden())
    }
}

impl Vcs for Git2Vcs {
    fn is_repository(&self, path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    /// Clone remote repository.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Git2`] if libgit2 operations fail.
    /// - Return [`VcsError::IndicatifStyleTemplate`] if the progress bar
    ///   cannot be styled.
    #[instrument(skip(self), level = "debug")]
    fn clone_repo(&self, url: &str, path: &Path) -> Result<()> {
        info!("clone {url} into {:?}", path.display());
        self.start_bar(url.to_string())?;

        let authenticator = self.authenticator();
        let config = Config::open_default()?;
        let fo = self.fetch_options(&authenticator, &config);
        RepoBuilder::new().fetch_options(fo).clone(url, path)?;
        self.bar.finish_and_clear();

        Ok(())
    }

    /// Fetch and fast-forward current branch.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::Git2`] if libgit2 operations fail, e.g., `path` is
    ///   not a repository or has no `origin` remote.
    /// - Return [`VcsError::DetachedHead`] if no branch is checked out.
    /// - Return [`VcsError::NotFastForward`] if the local branch diverged.
    #[instrument(skip(self), level = "debug")]
    fn upgrade(&self, path: &Path) -> Result<()> {
        let repository = Repository::open(path)?;
        let branch = current_branch(&repository).ok_or_else(|| VcsError::DetachedHead {
            path: path.to_path_buf(),
        })?;
        self.start_bar(format!("{} ({branch})", path.display()))?;

        let authenticator = self.authenticator();
        let config = repository.config()?;
        let mut fo = self.fetch_options(&authenticator, &config);
        let mut remote = repository.find_remote("origin")?;
        debug!("fetch {branch} from origin of {:?}", path.display());
        remote.fetch(&[branch.as_str()], Some(&mut fo), None)?;
        self.bar.finish_and_clear();

        let fetch_head = repository.find_reference("FETCH_HEAD")?;
        let fetch_commit = repository.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repository.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            info!("{:?} already up to date", path.display());
            return Ok(());
        }

        if !analysis.is_fast_forward() {
            return Err(VcsError::NotFastForward {
                path: path.to_path_buf(),
                branch,
            });
        }

        // INVARIANT: Move branch first, then force the work tree to match it.
        let refname = format!("refs/heads/{branch}");
        let mut reference = repository.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "dots: fast-forward")?;
        repository.set_head(&refname)?;
        repository.checkout_head(Some(CheckoutBuilder::default().force()))?;
        info!("upgraded {:?} to {}", path.display(), fetch_commit.id());

        Ok(())
    }
}

fn current_branch(repository: &Repository) -> Option<String> {
    let head = repository.head().ok()?;
    if !head.is_branch() {
        return None;
    }

    head.shorthand().map(ToString::to_string)
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Version control error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Repository has no branch checked out.
    #[error("repository {:?} has a detached head", path.display())]
    DetachedHead { path: PathBuf },

    /// Local branch cannot be fast-forwarded to upstream.
    #[error("branch {branch} of {:?} cannot be fast-forwarded", path.display())]
    NotFastForward { path: PathBuf, branch: String },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
