// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dots::{
    cache::vcs::Git2Vcs, find_config, find_config_in_dir, validate_file, BaseDirs, Cache,
    DotsConfig, UpgradeScope,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::{
    env::current_dir,
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  dots [options] <dots-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let dirs = BaseDirs::try_new()?;
        match self.command {
            Command::Validate(opts) => run_validate(opts, &dirs),
            Command::Init(opts) => run_init(opts),
            Command::Cache(opts) => run_cache(opts, &dirs),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Validate nearest dots configuration file.
    #[command(override_usage = "dots validate [options]")]
    Validate(ValidateOptions),

    /// Write starter dots configuration file.
    #[command(override_usage = "dots init [options] [dir]")]
    Init(InitOptions),

    /// Manage local cache of dotfile repositories.
    #[command(override_usage = "dots cache [options] <cache-command>")]
    Cache(CacheOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ValidateOptions {
    /// Path to `.dots.yml` file, searched upward from current directory if omitted.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Directory to write `.dots.yml` into.
    #[arg(value_name = "dir")]
    pub dir: Option<PathBuf>,

    /// Name of dotfile collection.
    #[arg(short, long, value_name = "name")]
    pub name: Option<String>,

    /// License of dotfile collection.
    #[arg(short, long, value_name = "license")]
    pub license: Option<String>,

    /// URL to upstream.
    #[arg(short, long, value_name = "url")]
    pub url: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CacheOptions {
    /// Cache directory to use instead of `$XDG_CACHE_HOME/dots`.
    #[arg(long, value_name = "dir", env = "DOTS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum CacheCommand {
    /// Remove entire cache.
    Clean,

    /// Clone repository into cache unless already cached.
    Fetch {
        /// Repository identifier, e.g., `github.com/YourName/dotfiles`.
        #[arg(required = true, value_name = "identifier")]
        identifier: String,
    },

    /// Upgrade one repository, or everything in cache.
    Upgrade {
        /// Path to repository to upgrade.
        #[arg(value_name = "path")]
        path: Option<PathBuf>,

        /// Only upgrade directories that are repositories.
        #[arg(short, long)]
        repositories_only: bool,
    },
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_validate(opts: ValidateOptions, dirs: &BaseDirs) -> Result<()> {
    let path = match opts.config {
        Some(path) => path,
        None => find_config(current_dir()?)?,
    };

    let Some(result) = validate_file(&path, dirs) else {
        return Ok(());
    };

    for warning in &result.warnings {
        warn!("{}", warning.message);
        if let Some(recommendation) = &warning.recommendation {
            info!("{recommendation}");
        }
    }

    match result.error {
        Some(error) => Err(error.into()),
        None => bail!(
            "{:?} has {} warning(s)",
            path.display(),
            result.warnings.len()
        ),
    }
}

fn run_init(opts: InitOptions) -> Result<()> {
    let dir = match opts.dir {
        Some(dir) => dir,
        None => current_dir()?,
    };

    if let Ok(existing) = find_config_in_dir(&dir) {
        bail!("dots config already exists at {:?}", existing.display());
    }

    let mut config = DotsConfig::template();
    if let Some(name) = opts.name {
        config.name = name;
    }
    if let Some(license) = opts.license {
        config.license = license;
    }
    if let Some(url) = opts.url {
        config.url = url;
    }

    let path = dir.join(".dots.yml");
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;
    file.write_all(config.to_string().as_bytes())?;
    info!("wrote {:?}", path.display());

    Ok(())
}

fn run_cache(opts: CacheOptions, dirs: &BaseDirs) -> Result<()> {
    let vcs = Git2Vcs::new(ProgressBar::no_length());
    let cache = match opts.cache_dir {
        Some(dir) => Cache::open(dir, vcs)?,
        None => Cache::try_default(dirs, vcs)?,
    };

    match opts.command {
        CacheCommand::Clean => cache.clean()?,
        CacheCommand::Fetch { identifier } => {
            let path = cache.fetch(&identifier)?;
            info!("{identifier} cached at {:?}", path.display());
        }
        CacheCommand::Upgrade {
            path: Some(path), ..
        } => cache.upgrade(path)?,
        CacheCommand::Upgrade {
            path: None,
            repositories_only,
        } => {
            let scope = if repositories_only {
                UpgradeScope::Repositories
            } else {
                UpgradeScope::EveryNode
            };
            cache.with_scope(scope).upgrade_all()?;
        }
    }

    Ok(())
}
