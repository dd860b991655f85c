use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::enums::Severity;

// ─── Document ───────────────────────────────────────────────────────────────

/// The top-level container for a parsed rule document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Format version. Currently always "1.0".
    pub stinger: String,
    /// URI patterns exempt from all validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Named regex library referenced by rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexes: Option<Vec<RegexDef>>,
    /// Process-wide cookie rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<CookieRuleDef>>,
    /// Rule sets keyed by URI pattern, in declaration order.
    pub rulesets: Vec<RuleSetDef>,
}

// ─── Regex library ──────────────────────────────────────────────────────────

/// A named entry in the regex library.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegexDef {
    pub name: String,
    pub pattern: String,
}

// ─── Rule sets ──────────────────────────────────────────────────────────────

/// One rule set: parameter rules scoped to a URI pattern.
///
/// The distinguished name `STINGER_DEFAULT` in `uri` marks the fallback set
/// used when no other pattern matches a request's URI.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleSetDef {
    pub uri: String,
    pub rules: Vec<RuleDef>,
}

/// A named parameter rule with its two outcome categories.
///
/// `regex` is resolved against the regex library first; if no library entry
/// carries that name, the field is taken as a literal pattern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: String,
    pub regex: String,
    pub missing: OutcomeDef,
    pub malformed: OutcomeDef,
}

/// A cookie rule. Cookies are validated process-wide rather than per rule
/// set; `created` exempts the URI that legitimately issues the cookie, and
/// `enforced` limits where its absence is policed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CookieRuleDef {
    pub name: String,
    pub regex: String,
    pub created: String,
    pub enforced: String,
    pub missing: OutcomeDef,
    pub malformed: OutcomeDef,
}

// ─── Outcomes and actions ───────────────────────────────────────────────────

/// Severity plus the ordered action chain for one outcome kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutcomeDef {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionDef>>,
}

/// A reference to a registered action capability with its parameter bag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,
}

impl ActionDef {
    /// The parameter bag, empty if none was declared.
    pub fn parameters(&self) -> HashMap<String, String> {
        self.parameters.clone().unwrap_or_default()
    }
}
