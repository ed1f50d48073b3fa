//! crates/logtree/src/config.rs
//! Level directives and the declarative logger configuration.
//!
//! Directives are comma-separated `selector=level` entries, for example
//! `info,app/net=debug,app/net/tcp.connect=error`. An entry without `=` (or
//! with an empty selector) sets the catch-all rule. Whitespace around entries
//! and around `=` is ignored; empty entries are skipped.

use std::env;

use thiserror::Error;

use crate::level::{DEFAULT_LEVEL, Level, LevelParseError};
use crate::selector::{Rule, Selector, upsert};

/// Error produced when parsing level directives.
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// The level part of an entry was not recognised.
    #[error("invalid level in directive {entry:?}")]
    InvalidLevel {
        /// The offending entry.
        entry: String,
        /// Why the level was rejected.
        #[source]
        source: LevelParseError,
    },
    /// An entry had a selector followed by `=` but no level.
    #[error("directive {entry:?} is missing a level")]
    MissingLevel {
        /// The offending entry.
        entry: String,
    },
    /// The environment variable was set but is not valid Unicode.
    #[error("environment variable {var} is not valid unicode")]
    NotUnicode {
        /// Name of the variable.
        var: String,
    },
}

/// Parses a directive string into rules, in order.
///
/// Later entries for the same selector replace earlier ones.
///
/// # Errors
///
/// Returns [`DirectiveError`] naming the first malformed entry.
pub fn parse_directives(input: &str) -> Result<Vec<Rule>, DirectiveError> {
    let mut rules = Vec::new();
    for entry in input.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        upsert(&mut rules, parse_entry(entry)?);
    }
    Ok(rules)
}

fn parse_entry(entry: &str) -> Result<Rule, DirectiveError> {
    let (selector, level) = match entry.rsplit_once('=') {
        Some((selector, level)) => (selector.trim(), level.trim()),
        None => ("", entry),
    };
    if level.is_empty() {
        return Err(DirectiveError::MissingLevel {
            entry: entry.to_owned(),
        });
    }
    let level = level
        .parse::<Level>()
        .map_err(|source| DirectiveError::InvalidLevel {
            entry: entry.to_owned(),
            source,
        })?;
    Ok(Rule::new(Selector::new(selector), level))
}

/// Declarative configuration applied to a root logger.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoggerConfig {
    /// Threshold for call sites no rule matches.
    pub default_level: Level,
    /// Selector rules, in application order.
    pub rules: Vec<Rule>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LEVEL,
            rules: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Builds a configuration from a directive string.
    ///
    /// # Errors
    ///
    /// Fails when [`parse_directives`] does.
    pub fn from_directives(input: &str) -> Result<Self, DirectiveError> {
        Ok(Self {
            default_level: DEFAULT_LEVEL,
            rules: parse_directives(input)?,
        })
    }

    /// Reads directives from the environment variable `var`.
    ///
    /// An unset variable yields the default configuration.
    ///
    /// # Errors
    ///
    /// Fails when the variable is not Unicode or its directives are malformed.
    pub fn from_env_var(var: &str) -> Result<Self, DirectiveError> {
        match env::var(var) {
            Ok(value) => Self::from_directives(&value),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(_)) => Err(DirectiveError::NotUnicode {
                var: var.to_owned(),
            }),
        }
    }

    /// Sets the default level.
    #[must_use]
    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Adds or replaces the rule for `selector`.
    #[must_use]
    pub fn with_rule(mut self, selector: impl Into<Selector>, level: Level) -> Self {
        upsert(&mut self.rules, Rule::new(selector, level));
        self
    }
}
