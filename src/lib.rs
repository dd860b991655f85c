//! Inline HTTP request validation engine.
//!
//! An operator-authored rule document declares, per URI pattern, which
//! parameters a request must carry and what they must look like, plus
//! process-wide cookie rules. The engine checks each inbound request against
//! the compiled rules and, on violation, drives a configurable action chain
//! (log, scrub, redirect, block) before the request reaches application
//! logic:
//!
//! ```text
//! parse(yaml) → RuleDocument → RuleSet::compile(doc, registry) → RuleSet
//!                              Stinger::validate(request, response) → Passed | Aborted
//! ```
//!
//! The network adapter is out of scope: wrap your transport's request into a
//! [`MutableRequest`], hand it to [`Stinger::validate`], and on
//! [`Outcome::Aborted`] stop normal processing (typically by realizing the
//! redirect recorded on the [`MutableResponse`]).
//!
//! # Quick Start
//!
//! ```rust
//! let yaml = r#"
//! stinger: "1.0"
//! rulesets:
//!   - uri: "^/login$"
//!     rules:
//!       - name: username
//!         regex: "[a-zA-Z0-9_]{1,32}"
//!         missing:
//!           severity: fatal
//!           actions:
//!             - name: redirect
//!               parameters:
//!                 location: /error
//!         malformed:
//!           severity: continue
//!           actions:
//!             - name: scrub
//!   - uri: STINGER_DEFAULT
//!     rules:
//!       - name: STINGER_ALL
//!         regex: "[^<>&]*"
//!         missing:
//!           severity: ignore
//!         malformed:
//!           severity: continue
//! "#;
//!
//! let registry = stinger::ActionRegistry::with_builtins();
//! let rules = stinger::load(yaml, &registry).expect("valid document");
//!
//! let engine = stinger::Stinger::new(rules);
//! let mut request = stinger::MutableRequest::new("GET", "/login");
//! request.add_parameter("username", "alice");
//! let mut response = stinger::MutableResponse::new();
//!
//! assert_eq!(
//!     engine.validate(&mut request, &mut response),
//!     stinger::Outcome::Passed,
//! );
//! ```
//!
//! For hot reload, keep the active repository in a
//! [`SharedRuleSet`] and take a [`SharedRuleSet::snapshot`] per request; a
//! failed [`SharedRuleSet::reload`] leaves the previous rules in effect.

pub mod actions;
pub mod engine;
pub mod enums;
pub mod error;
pub mod parse;
pub mod request;
pub mod response;
pub mod rules;
pub mod types;
pub mod violation;

pub use enums::*;
pub use error::*;
pub use types::*;

// Re-export the main entry points at the crate root for convenience.
pub use actions::{Action, ActionRegistry};
pub use engine::{SharedRuleSet, Stinger, URI_RULE};
pub use parse::parse;
pub use request::{Cookie, MutableRequest};
pub use response::MutableResponse;
pub use rules::{Category, CookieRule, Rule, RuleSet, STINGER_ALL, STINGER_DEFAULT};
pub use violation::{Violation, ViolationList};

use std::sync::Arc;

/// Convenience entry point composing parse → compile.
///
/// Returns a repository ready to hand to [`Stinger::new`] or
/// [`SharedRuleSet::new`].
///
/// # Errors
///
/// Returns [`StingerError::Parse`] if the document is not well-formed YAML of
/// the expected shape, and [`StingerError::Config`] if a pattern does not
/// compile, an action name is unknown or misconfigured, or no
/// `STINGER_DEFAULT`/`STINGER_ALL` fallback is declared.
pub fn load(input: &str, registry: &ActionRegistry) -> Result<Arc<RuleSet>, StingerError> {
    let doc = parse::parse(input)?;
    let rules = RuleSet::compile(&doc, registry)?;
    Ok(Arc::new(rules))
}
