//! Closed enumerations used throughout the rule and violation model.
//!
//! These are "closed" enums — only the defined variants are valid in a rule
//! document. Everything else (URI patterns, parameter names, action names) is
//! an open string validated elsewhere.

use serde::{Deserialize, Serialize};

/// What happens when a violation of this severity is raised.
///
/// `Fatal` runs the violation's action chain immediately and aborts the whole
/// validation pass. `Continue` records the violation; its actions run after
/// all checks complete, provided no fatal violation fired first. `Ignore`
/// drops the violation without running anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
    Continue,
    Ignore,
}

/// The two outcome kinds a rule distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Missing,
    Malformed,
}

/// Terminal state of one validation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// All checks ran; any accumulated non-fatal action chains were executed.
    Passed,
    /// A fatal violation fired. The caller must not forward the request.
    Aborted,
}

/// Returned by [`crate::actions::Action::invoke`] to control the remainder of
/// one violation's action chain.
///
/// `Break` stops the chain for that violation only; it is unrelated to the
/// engine-level abort driven by [`Severity::Fatal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Continue,
    Break,
}

/// Level for the built-in `log` action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
