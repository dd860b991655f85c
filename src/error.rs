use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownVariant,
}

/// Produced by `parse` when YAML deserialization fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{}:{}: {}", line, col, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Error kind for rule-compilation failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigErrorKind {
    InvalidRegex,
    UnknownAction,
    BadActionParameter,
    MissingDefault,
    UnsupportedVersion,
}

/// Produced by `RuleSet::compile` when a parsed document cannot be turned
/// into a usable repository. Compilation stops at the first error so a failed
/// reload never publishes a half-built rule set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub path: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Combined error type for the `load` entry point.
#[derive(Clone, Debug)]
pub enum StingerError {
    Parse(ParseError),
    Config(ConfigError),
}

impl fmt::Display for StingerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StingerError::Parse(e) => write!(f, "parse error: {}", e),
            StingerError::Config(e) => write!(f, "config error: {}", e),
        }
    }
}

impl std::error::Error for StingerError {}

impl From<ParseError> for StingerError {
    fn from(e: ParseError) -> Self {
        StingerError::Parse(e)
    }
}

impl From<ConfigError> for StingerError {
    fn from(e: ConfigError) -> Self {
        StingerError::Config(e)
    }
}
