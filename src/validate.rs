// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Check a resolved [`DotsConfig`] for problems that make it unsafe to use,
//! and for smaller issues that are merely worth pointing out.
//!
//! # Errors Versus Warnings
//!
//! A validation __error__ halts validation at once. It marks the configuration
//! as unusable, e.g., missing license, blank or duplicate dotfile names, or a
//! source path that does not exist. A __warning__ is advisory, e.g., blank
//! descriptions. Warnings accumulate until validation either finishes or hits
//! an error, so both can show up in one [`ValidationError`].
//!
//! # Check Order
//!
//! 1. Configuration name must not be blank (warning).
//! 2. License must not be blank (error).
//! 3. Each dotfile in declaration order: name, source, description, and
//!    `install_children` checks.
//! 4. Duplicate values across dotfiles, one [`DotfileField`] at a time.

use crate::{
    config::{ConfigError, DotsConfig, Dotfile},
    path::{clean, BaseDirs},
};

use std::{
    borrow::Cow,
    collections::{hash_map::Entry, HashMap},
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{metadata, read_dir},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Validate configuration file at target path.
///
/// A configuration that cannot be parsed is reported as a [`ValidationError`]
/// without any warnings.
pub fn validate_file(path: impl AsRef<Path>, dirs: &BaseDirs) -> Option<ValidationError> {
    match DotsConfig::parse_file(path, dirs) {
        Ok(config) => validate(&config),
        Err(error) => Some(ValidationError {
            warnings: Vec::new(),
            error: Some(error.into()),
        }),
    }
}

/// Validate resolved configuration.
///
/// Returns `None` if the configuration passed every check without a single
/// warning. Otherwise, the returned [`ValidationError`] holds all warnings
/// gathered, and the error that halted validation if any.
pub fn validate(config: &DotsConfig) -> Option<ValidationError> {
    Validator::new(config).run()
}

/// Validation state over one configuration.
#[derive(Debug)]
pub struct Validator<'cfg> {
    config: &'cfg DotsConfig,
    warnings: Vec<Warning>,
}

impl<'cfg> Validator<'cfg> {
    /// Construct new validator.
    pub fn new(config: &'cfg DotsConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    /// Run all checks.
    #[instrument(skip(self), level = "debug")]
    pub fn run(mut self) -> Option<ValidationError> {
        self.check_name();
        let error = self.check_all().err();
        if error.is_none() && self.warnings.is_empty() {
            return None;
        }

        Some(ValidationError {
            warnings: self.warnings,
            error,
        })
    }

    fn check_name(&mut self) {
        if !self.config.name.is_empty() {
            return;
        }

        self.warnings.push(Warning::with_recommendation(
            "dots config name shouldn't be left blank, isn't directly installable",
            "set name to default value `YourName/dotfiles`",
        ));
    }

    fn check_all(&mut self) -> Result<()> {
        self.check_license()?;
        self.check_dotfiles()?;
        self.check_duplicates()
    }

    fn check_license(&self) -> Result<()> {
        if self.config.license.is_empty() {
            return Err(ValidateError::LicenseRequired);
        }

        Ok(())
    }

    fn check_dotfiles(&mut self) -> Result<()> {
        let config = self.config;
        for (index, dotfile) in config.dotfiles.iter().enumerate() {
            debug!("check dotfile {index}: {:?}", dotfile.name);
            if dotfile.name.is_empty() {
                return Err(ValidateError::BlankName { index: index + 1 });
            }

            if let Err(err) = metadata(&dotfile.source) {
                if err.kind() == ErrorKind::NotFound {
                    return Err(ValidateError::MissingSource {
                        name: dotfile.name.clone(),
                        path: dotfile.source.clone(),
                    });
                }
            }

            if dotfile.description.is_empty() {
                self.warnings.push(Warning::new(format!(
                    "dotfile `{}` description shouldn't be left blank",
                    dotfile.name
                )));
            }

            if dotfile.install_children {
                check_children(dotfile)?;
            }
        }

        Ok(())
    }

    fn check_duplicates(&mut self) -> Result<()> {
        let config = self.config;
        let dotfiles = config.dotfiles.as_slice();
        for field in DotfileField::CHECKED {
            let mut seen: HashMap<Cow<'cfg, str>, usize> = HashMap::new();
            for (index, dotfile) in dotfiles.iter().enumerate() {
                let first = match seen.entry(field.value(dotfile)) {
                    Entry::Vacant(entry) => {
                        entry.insert(index);
                        continue;
                    }
                    Entry::Occupied(entry) => *entry.get(),
                };

                debug!("duplicate {field} between dotfiles {first} and {index}");
                match field.duplicate((first, &dotfiles[first]), (index, dotfile)) {
                    Duplicate::Fatal(error) => return Err(error),
                    Duplicate::Advisory(warning) => self.warnings.push(warning),
                }
            }
        }

        Ok(())
    }
}

fn check_children(dotfile: &Dotfile) -> Result<()> {
    let mut entries = read_dir(&dotfile.source).map_err(|err| ValidateError::ReadSource {
        source: err,
        name: dotfile.name.clone(),
        path: dotfile.source.clone(),
    })?;

    if entries.next().is_none() {
        return Err(ValidateError::NoChildren {
            name: dotfile.name.clone(),
            path: dotfile.source.clone(),
        });
    }

    Ok(())
}

/// Dotfile fields compared across all dotfiles of a configuration.
///
/// The `install_children` flag is never compared, because many dotfiles are
/// expected to share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotfileField {
    Name,
    Description,
    Source,
    Destination,
}

impl DotfileField {
    /// Fields to check for duplicates, in check order.
    pub const CHECKED: [Self; 4] = [
        Self::Name,
        Self::Description,
        Self::Source,
        Self::Destination,
    ];

    fn value<'a>(&self, dotfile: &'a Dotfile) -> Cow<'a, str> {
        match self {
            Self::Name => Cow::Borrowed(dotfile.name.as_str()),
            Self::Description => Cow::Borrowed(dotfile.description.as_str()),
            Self::Source => Cow::Owned(clean(&dotfile.source).to_string_lossy().into_owned()),
            Self::Destination => {
                Cow::Owned(clean(&dotfile.destination).to_string_lossy().into_owned())
            }
        }
    }

    /// Judge a repeated value between an earlier and a later dotfile.
    ///
    /// Name, source, and destination must be unique. A shared description only
    /// warrants a warning.
    pub fn duplicate(
        &self,
        (earlier_index, earlier): (usize, &Dotfile),
        (later_index, later): (usize, &Dotfile),
    ) -> Duplicate {
        match self {
            Self::Name => Duplicate::Fatal(ValidateError::DuplicateName {
                index: later_index + 1,
                first_index: earlier_index + 1,
                name: later.name.clone(),
            }),
            Self::Source => Duplicate::Fatal(ValidateError::DuplicateSource {
                first: earlier.name.clone(),
                second: later.name.clone(),
                path: later.source.clone(),
            }),
            Self::Destination => Duplicate::Fatal(ValidateError::DuplicateDestination {
                first: earlier.name.clone(),
                second: later.name.clone(),
                path: later.destination.clone(),
            }),
            Self::Description => Duplicate::Advisory(Warning::new(format!(
                "dotfiles {} and {} have the same description `{}`",
                earlier.name, later.name, later.description
            ))),
        }
    }
}

impl Display for DotfileField {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Name => fmt.write_str("name"),
            Self::Description => fmt.write_str("description"),
            Self::Source => fmt.write_str("source"),
            Self::Destination => fmt.write_str("destination"),
        }
    }
}

/// Outcome of finding the same value twice in one [`DotfileField`].
#[derive(Debug)]
pub enum Duplicate {
    /// Halt validation.
    Fatal(ValidateError),

    /// Keep going, but tell the user.
    Advisory(Warning),
}

/// Advisory message with an optional recommendation on how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub recommendation: Option<String>,
}

impl Warning {
    /// Construct new warning without a recommendation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recommendation: None,
        }
    }

    /// Construct new warning with a recommendation.
    pub fn with_recommendation(message: impl Into<String>, recommendation: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recommendation: Some(recommendation.into()),
        }
    }
}

impl Display for Warning {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.message)
    }
}

/// Result of a validation that did not pass cleanly.
///
/// Holds the warnings gathered, and the error that halted validation if any.
/// Displays as the error message, or as nothing if there only are warnings.
#[derive(Debug, Default)]
pub struct ValidationError {
    pub warnings: Vec<Warning>,
    pub error: Option<ValidateError>,
}

impl ValidationError {
    /// Check if validation failed rather than just warned.
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

impl Display for ValidationError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match &self.error {
            Some(error) => write!(fmt, "{error}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error
            .as_ref()
            .map(|error| error as &(dyn std::error::Error + 'static))
    }
}

/// Validation error types.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// Configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// License is blank.
    #[error("license is required, if you're not sure which license consult https://choosealicense.com/")]
    LicenseRequired,

    /// Dotfile name is blank.
    #[error("dotfile number `{index}` name is blank, but field is required")]
    BlankName { index: usize },

    /// Dotfile source does not exist.
    #[error("dotfile `{name}` source field `{}` does not exist", path.display())]
    MissingSource { name: String, path: PathBuf },

    /// Dotfile source with `install_children` cannot be listed.
    #[error("dotfile `{name}` failed to read directory `{}`", path.display())]
    ReadSource {
        #[source]
        source: std::io::Error,
        name: String,
        path: PathBuf,
    },

    /// Dotfile source with `install_children` is empty.
    #[error(
        "dotfile `{name}` has `install_children` set, but has 0 children in source `{}`",
        path.display()
    )]
    NoChildren { name: String, path: PathBuf },

    /// Two dotfiles share a name.
    #[error("dotfiles with index `{index}` and `{first_index}` both have the same name `{name}`")]
    DuplicateName {
        index: usize,
        first_index: usize,
        name: String,
    },

    /// Two dotfiles share a source.
    #[error("dotfiles `{first}` and `{second}` have the same source `{}`", path.display())]
    DuplicateSource {
        first: String,
        second: String,
        path: PathBuf,
    },

    /// Two dotfiles share a destination.
    #[error(
        "dotfiles `{first}` and `{second}` have the same destination `{}` and will overwrite one another",
        path.display()
    )]
    DuplicateDestination {
        first: String,
        second: String,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = ValidateError> = std::result::Result<T, E>;
