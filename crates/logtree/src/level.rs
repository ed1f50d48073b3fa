//! crates/logtree/src/level.rs
//! Severity levels and their textual forms.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Severity of a log record, also used as the threshold a selector assigns.
///
/// Levels are totally ordered: a lower value is more verbose. A record passes
/// a threshold when `threshold <= level`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Level(i32);

impl Level {
    /// Most verbose possible threshold; every record passes it.
    pub const MIN: Self = Self(i32::MIN);
    /// Debugging output.
    pub const DEBUG: Self = Self(10);
    /// Standard informational output.
    pub const INFO: Self = Self(20);
    /// Warnings.
    pub const WARN: Self = Self(30);
    /// Errors.
    pub const ERROR: Self = Self(40);

    /// Creates a level from its raw numeric value.
    #[must_use]
    pub const fn from_raw(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns the canonical upper-case name for the four named levels.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            10 => Some("DEBUG"),
            20 => Some("INFO"),
            30 => Some("WARN"),
            40 => Some("ERROR"),
            _ => None,
        }
    }

    /// Reports whether a record at `self` passes `threshold`.
    #[must_use]
    pub fn passes(self, threshold: Self) -> bool {
        threshold <= self
    }
}

/// Threshold applied when no selector matches a call site.
pub const DEFAULT_LEVEL: Level = Level::INFO;

impl Default for Level {
    fn default() -> Self {
        DEFAULT_LEVEL
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Level({})", self.0),
        }
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown log level: {input:?}")]
pub struct LevelParseError {
    input: String,
}

impl LevelParseError {
    /// Returns the rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for Level {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let level = match trimmed.to_ascii_lowercase().as_str() {
            "debug" => Self::DEBUG,
            "info" => Self::INFO,
            "warn" | "warning" => Self::WARN,
            "error" => Self::ERROR,
            other => other.parse::<i32>().map(Self).map_err(|_| LevelParseError {
                input: trimmed.to_owned(),
            })?,
        };
        Ok(level)
    }
}
