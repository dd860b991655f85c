//! Compiled rule model and the rule repository.
//!
//! A [`RuleSet`] is built once from a parsed [`RuleDocument`] and is immutable
//! afterwards; reloads build a brand-new repository and publish it through
//! [`crate::engine::SharedRuleSet`]. All patterns compile with full-string
//! match semantics.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::actions::{Action, ActionRegistry};
use crate::enums::{CategoryKind, Severity};
use crate::error::{ConfigError, ConfigErrorKind};
use crate::types::{OutcomeDef, RuleDocument};

/// Name of the fallback rule set used when no URI pattern matches.
pub const STINGER_DEFAULT: &str = "STINGER_DEFAULT";

/// Name of the catch-all rule within a rule set, applied to parameters with
/// no explicit entry.
pub const STINGER_ALL: &str = "STINGER_ALL";

/// Compile a pattern with full-string match semantics. A bare `is_match`
/// would accept substring hits, which is never what a validation pattern
/// means here.
fn compile_anchored(pattern: &str, path: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| ConfigError {
        kind: ConfigErrorKind::InvalidRegex,
        path: path.to_string(),
        message: format!("invalid pattern '{}': {}", pattern, e),
    })
}

// ─── Category ───────────────────────────────────────────────────────────────

/// Severity plus the ordered action chain for one outcome kind.
#[derive(Clone)]
pub struct Category {
    pub kind: CategoryKind,
    pub severity: Severity,
    pub actions: Vec<Arc<dyn Action>>,
}

impl Category {
    pub fn new(kind: CategoryKind, severity: Severity, actions: Vec<Arc<dyn Action>>) -> Self {
        Category {
            kind,
            severity,
            actions,
        }
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Category")
            .field("kind", &self.kind)
            .field("severity", &self.severity)
            .field("actions", &self.actions.len())
            .finish()
    }
}

// ─── Rule ───────────────────────────────────────────────────────────────────

/// A named regular-expression contract with its two outcome categories.
#[derive(Clone, Debug)]
pub struct Rule {
    name: String,
    source: String,
    pattern: Regex,
    pub missing: Category,
    pub malformed: Category,
}

impl Rule {
    pub fn new(
        name: &str,
        pattern: &str,
        missing: Category,
        malformed: Category,
    ) -> Result<Self, ConfigError> {
        let compiled = compile_anchored(pattern, name)?;
        Ok(Rule {
            name: name.to_string(),
            source: pattern.to_string(),
            pattern: compiled,
            missing,
            malformed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern as written in configuration, without anchoring.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Whether a value satisfies this rule's pattern (full-string match).
    pub fn is_valid(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

// ─── CookieRule ─────────────────────────────────────────────────────────────

/// A [`Rule`] scoped by where the cookie is created and where its presence is
/// enforced. A cookie is reported missing only on URIs matched by `enforced`
/// and not matched by `created`.
#[derive(Clone, Debug)]
pub struct CookieRule {
    rule: Rule,
    created: Regex,
    enforced: Regex,
}

impl CookieRule {
    pub fn new(rule: Rule, created: &str, enforced: &str) -> Result<Self, ConfigError> {
        let created = compile_anchored(created, rule.name())?;
        let enforced = compile_anchored(enforced, rule.name())?;
        Ok(CookieRule {
            rule,
            created,
            enforced,
        })
    }

    pub fn name(&self) -> &str {
        self.rule.name()
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// True if this URI is the one that legitimately sets the cookie.
    pub fn is_created_uri(&self, uri: &str) -> bool {
        self.created.is_match(uri)
    }

    /// True if the cookie's presence is policed on this URI.
    pub fn is_enforced(&self, uri: &str) -> bool {
        self.enforced.is_match(uri)
    }
}

// ─── RuleSet ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct UriBucket {
    source: String,
    pattern: Regex,
    rules: BTreeMap<String, Rule>,
}

/// The rule repository: parameter rules grouped by URI pattern, cookie rules,
/// and the exclusion list.
///
/// Lookup precedence: URI buckets are tested in declaration order and the
/// *last* matching bucket wins, so overlapping rule sets should be declared
/// most-specific-last. Within a bucket the fallback chain is
/// named rule → [`STINGER_ALL`] → the [`STINGER_DEFAULT`] set's
/// [`STINGER_ALL`].
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    exclude: Vec<Regex>,
    buckets: Vec<UriBucket>,
    cookies: BTreeMap<String, CookieRule>,
}

impl RuleSet {
    /// Compile a parsed document into a repository, instantiating every
    /// configured action through `registry`.
    ///
    /// Fails closed: a document without a `STINGER_DEFAULT` rule set carrying
    /// a `STINGER_ALL` rule is rejected, so every compiled repository resolves
    /// a rule for any (URI, parameter) pair.
    pub fn compile(doc: &RuleDocument, registry: &ActionRegistry) -> Result<Self, ConfigError> {
        if doc.stinger != "1.0" {
            return Err(ConfigError {
                kind: ConfigErrorKind::UnsupportedVersion,
                path: "stinger".to_string(),
                message: format!("unsupported format version '{}', expected '1.0'", doc.stinger),
            });
        }

        let mut set = RuleSet::default();

        for (i, pattern) in doc.exclude.iter().flatten().enumerate() {
            set.exclude
                .push(compile_anchored(pattern, &format!("exclude[{}]", i))?);
        }

        let mut library: HashMap<&str, &str> = HashMap::new();
        for def in doc.regexes.iter().flatten() {
            library.insert(def.name.as_str(), def.pattern.as_str());
        }

        for (i, def) in doc.cookies.iter().flatten().enumerate() {
            let path = format!("cookies[{}]", i);
            let rule = compile_rule(
                &def.name,
                &def.regex,
                &def.missing,
                &def.malformed,
                &library,
                registry,
                &path,
            )?;
            let cookie = CookieRule::new(rule, &def.created, &def.enforced)
                .map_err(|e| reroot(e, &path))?;
            set.cookies.insert(cookie.name().to_string(), cookie);
        }

        for (i, rs) in doc.rulesets.iter().enumerate() {
            let path = format!("rulesets[{}]", i);
            let pattern = compile_anchored(&rs.uri, &format!("{}.uri", path))?;
            let mut rules = BTreeMap::new();

            for (j, def) in rs.rules.iter().enumerate() {
                let rule = compile_rule(
                    &def.name,
                    &def.regex,
                    &def.missing,
                    &def.malformed,
                    &library,
                    registry,
                    &format!("{}.rules[{}]", path, j),
                )?;
                rules.insert(rule.name().to_string(), rule);
            }

            set.buckets.push(UriBucket {
                source: rs.uri.clone(),
                pattern,
                rules,
            });
        }

        if set.default_rule().is_none() {
            return Err(ConfigError {
                kind: ConfigErrorKind::MissingDefault,
                path: "rulesets".to_string(),
                message: format!(
                    "no {} rule set with a {} rule is declared",
                    STINGER_DEFAULT, STINGER_ALL
                ),
            });
        }

        Ok(set)
    }

    /// Resolve the rule governing `name` on `uri`.
    ///
    /// `None` only happens on hand-assembled repositories without a default
    /// catch-all; [`RuleSet::compile`] guarantees a total fallback chain.
    pub fn parameter_rule(&self, uri: &str, name: &str) -> Option<&Rule> {
        let bucket = self.matching_bucket(uri).or_else(|| {
            debug!(uri, parameter = name, "no rule set matches, using default rule set");
            self.default_bucket()
        })?;

        bucket
            .rules
            .get(name)
            .or_else(|| bucket.rules.get(STINGER_ALL))
            .or_else(|| self.default_rule())
    }

    /// Every declared rule of the rule set matching `uri`, used to enumerate
    /// required parameters. Falls back to a single-element sequence holding
    /// the default catch-all when no pattern matches.
    pub fn parameter_rules(&self, uri: &str) -> Vec<&Rule> {
        match self.matching_bucket(uri) {
            Some(bucket) => bucket.rules.values().collect(),
            None => {
                debug!(uri, "no rule set matches, using default rules");
                self.default_rule().into_iter().collect()
            }
        }
    }

    /// Direct cookie-rule lookup; cookie rules have no URI-dependent fallback.
    pub fn cookie_rule(&self, name: &str) -> Option<&CookieRule> {
        self.cookies.get(name)
    }

    /// All declared cookie rules, in name order.
    pub fn cookie_rules(&self) -> impl Iterator<Item = &CookieRule> {
        self.cookies.values()
    }

    /// True if any exclusion pattern matches `uri`. Excluded URIs bypass
    /// validation entirely; enforcing that is the caller's job.
    pub fn is_excluded(&self, uri: &str) -> bool {
        self.exclude.iter().any(|p| p.is_match(uri))
    }

    /// Insert `rule` under the first URI bucket matching `uri`, or open a new
    /// bucket keyed by `uri` as a pattern. Construction-time only: never call
    /// this on a repository already published to the engine.
    pub fn add_parameter_rule(&mut self, uri: &str, rule: Rule) -> Result<(), ConfigError> {
        if let Some(bucket) = self.buckets.iter_mut().find(|b| b.pattern.is_match(uri)) {
            bucket.rules.insert(rule.name().to_string(), rule);
            return Ok(());
        }

        let pattern = compile_anchored(uri, uri)?;
        let mut rules = BTreeMap::new();
        rules.insert(rule.name().to_string(), rule);
        self.buckets.push(UriBucket {
            source: uri.to_string(),
            pattern,
            rules,
        });
        Ok(())
    }

    /// Register a cookie rule on a hand-assembled repository.
    pub fn add_cookie_rule(&mut self, rule: CookieRule) {
        self.cookies.insert(rule.name().to_string(), rule);
    }

    /// Add an exclusion pattern on a hand-assembled repository.
    pub fn add_exclude(&mut self, pattern: &str) -> Result<(), ConfigError> {
        self.exclude.push(compile_anchored(pattern, "exclude")?);
        Ok(())
    }

    fn matching_bucket(&self, uri: &str) -> Option<&UriBucket> {
        // Last match wins: later-declared rule sets override earlier ones for
        // overlapping URIs.
        self.buckets.iter().filter(|b| b.pattern.is_match(uri)).next_back()
    }

    fn default_bucket(&self) -> Option<&UriBucket> {
        self.buckets.iter().find(|b| b.source == STINGER_DEFAULT)
    }

    fn default_rule(&self) -> Option<&Rule> {
        self.default_bucket().and_then(|b| b.rules.get(STINGER_ALL))
    }
}

fn reroot(mut e: ConfigError, path: &str) -> ConfigError {
    e.path = format!("{}.{}", path, e.path);
    e
}

/// Build one compiled rule from its document parts, resolving the regex field
/// against the library first and taking it as a literal otherwise.
fn compile_rule(
    name: &str,
    regex: &str,
    missing: &OutcomeDef,
    malformed: &OutcomeDef,
    library: &HashMap<&str, &str>,
    registry: &ActionRegistry,
    path: &str,
) -> Result<Rule, ConfigError> {
    let pattern = library.get(regex).copied().unwrap_or(regex);

    let missing = compile_category(CategoryKind::Missing, missing, registry, path)?;
    let malformed = compile_category(CategoryKind::Malformed, malformed, registry, path)?;

    Rule::new(name, pattern, missing, malformed).map_err(|e| reroot(e, path))
}

fn compile_category(
    kind: CategoryKind,
    def: &OutcomeDef,
    registry: &ActionRegistry,
    path: &str,
) -> Result<Category, ConfigError> {
    let block = match kind {
        CategoryKind::Missing => "missing",
        CategoryKind::Malformed => "malformed",
    };

    let mut actions = Vec::new();
    for (i, adef) in def.actions.iter().flatten().enumerate() {
        let action = registry.instantiate(adef, &format!("{}.{}.actions[{}]", path, block, i))?;
        actions.push(action);
    }

    Ok(Category::new(kind, def.severity, actions))
}
