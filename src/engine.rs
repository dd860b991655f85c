//! The validation engine: five ordered checks over one request, severity-driven
//! short-circuiting, and action dispatch.
//!
//! Checks run URI → cookies → parameters so a malformed URI is reported before
//! cookie and parameter noise. A fatal violation runs its own action chain and
//! aborts the pass immediately; non-fatal violations accumulate and their
//! chains run at the end, in discovery order.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::actions::ActionRegistry;
use crate::enums::{ActionOutcome, Outcome, Severity};
use crate::error::StingerError;
use crate::request::{Cookie, MutableRequest};
use crate::response::MutableResponse;
use crate::rules::{RuleSet, STINGER_ALL};
use crate::violation::{Violation, ViolationList};

/// Pseudo-parameter name under which a rule set declares its URI
/// well-formedness pattern.
pub const URI_RULE: &str = "uri";

/// Whether the pass may proceed to the next check.
enum Control {
    Proceed,
    Abort,
}

/// One engine bound to one repository snapshot.
///
/// The engine never consults anything but its snapshot, so construction per
/// request from [`SharedRuleSet::snapshot`] gives reload atomicity for free:
/// an in-flight pass keeps the rules it started with.
///
/// Callers are expected to skip validation entirely for URIs where
/// [`RuleSet::is_excluded`] holds.
pub struct Stinger {
    rules: Arc<RuleSet>,
}

impl Stinger {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Stinger { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run the full validation pass for one request.
    ///
    /// Returns [`Outcome::Aborted`] when a fatal violation fired; the caller
    /// must not forward the request downstream in that case.
    pub fn validate(
        &self,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
    ) -> Outcome {
        let mut violations = ViolationList::new();

        if let Control::Abort = self.check_malformed_uri(request, response, &mut violations) {
            return Outcome::Aborted;
        }
        if let Control::Abort = self.check_missing_cookies(request, response, &mut violations) {
            return Outcome::Aborted;
        }
        if let Control::Abort = self.check_malformed_cookies(request, response, &mut violations) {
            return Outcome::Aborted;
        }
        if let Control::Abort = self.check_missing_parameters(request, response, &mut violations) {
            return Outcome::Aborted;
        }
        if let Control::Abort = self.check_malformed_parameters(request, response, &mut violations) {
            return Outcome::Aborted;
        }

        // No fatal violation: run the accumulated chains in discovery order.
        for violation in &violations {
            self.run_actions(violation, request, response);
        }

        Outcome::Passed
    }

    /// Classify a freshly raised violation by its severity.
    fn raise(
        &self,
        violation: Violation,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
        violations: &mut ViolationList,
    ) -> Control {
        match violation.severity() {
            Severity::Fatal => {
                self.run_actions(&violation, request, response);
                Control::Abort
            }
            Severity::Continue => {
                violations.push(violation);
                Control::Proceed
            }
            Severity::Ignore => {
                debug!(%violation, "ignoring violation");
                Control::Proceed
            }
        }
    }

    /// Invoke the violation's chain in declaration order, stopping early when
    /// an action breaks its own chain.
    fn run_actions(
        &self,
        violation: &Violation,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
    ) {
        for action in violation.actions() {
            if let ActionOutcome::Break = action.invoke(violation, request, response) {
                break;
            }
        }
    }

    /// Check 1: the full request URL against the pseudo-parameter rule named
    /// [`URI_RULE`]. The violation carries no field name.
    fn check_malformed_uri(
        &self,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
        violations: &mut ViolationList,
    ) -> Control {
        let uri = request.uri().to_string();
        let url = request.url().to_string();

        if let Some(rule) = self.rules.parameter_rule(&uri, URI_RULE)
            && !rule.is_valid(&url)
        {
            warn!(%uri, "malformed request URL");
            let violation = Violation::new(&rule.malformed, None, Some(url), rule.pattern(), &uri);
            return self.raise(violation, request, response, violations);
        }

        Control::Proceed
    }

    /// Check 2: every declared cookie rule enforced on this URI, where the
    /// URI is not the cookie's creation point, must have a matching cookie on
    /// the request.
    fn check_missing_cookies(
        &self,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
        violations: &mut ViolationList,
    ) -> Control {
        let uri = request.uri().to_string();

        for cookie_rule in self.rules.cookie_rules() {
            if !cookie_rule.is_enforced(&uri) || cookie_rule.is_created_uri(&uri) {
                continue;
            }
            if request.cookie(cookie_rule.name()).is_some() {
                continue;
            }

            warn!(cookie = cookie_rule.name(), %uri, "missing cookie");
            let rule = cookie_rule.rule();
            let violation = Violation::new(
                &rule.missing,
                Some(cookie_rule.name().to_string()),
                None,
                rule.pattern(),
                &uri,
            );
            if let Control::Abort = self.raise(violation, request, response, violations) {
                return Control::Abort;
            }
        }

        Control::Proceed
    }

    /// Check 3: every cookie present on the request with a rule enforced on
    /// this URI must satisfy its pattern.
    fn check_malformed_cookies(
        &self,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
        violations: &mut ViolationList,
    ) -> Control {
        let uri = request.uri().to_string();
        let cookies: Vec<Cookie> = request.cookies().cloned().collect();

        for cookie in cookies {
            let Some(cookie_rule) = self.rules.cookie_rule(cookie.name()) else {
                continue;
            };
            if !cookie_rule.is_enforced(&uri) || cookie_rule.rule().is_valid(cookie.value()) {
                continue;
            }

            warn!(cookie = cookie.name(), %uri, "malformed cookie value");
            let rule = cookie_rule.rule();
            let violation = Violation::new(
                &rule.malformed,
                Some(cookie.name().to_string()),
                Some(cookie.value().to_string()),
                rule.pattern(),
                &uri,
            );
            if let Control::Abort = self.raise(violation, request, response, violations) {
                return Control::Abort;
            }
        }

        Control::Proceed
    }

    /// Check 4: every explicitly declared rule of the matching rule set names
    /// a required parameter; absent or empty is a missing violation. The
    /// [`STINGER_ALL`] marker is not a requirement.
    fn check_missing_parameters(
        &self,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
        violations: &mut ViolationList,
    ) -> Control {
        let uri = request.uri().to_string();

        for rule in self.rules.parameter_rules(&uri) {
            if rule.name() == STINGER_ALL {
                continue;
            }
            let present = match request.parameter(rule.name()) {
                Some(value) => !value.is_empty(),
                None => false,
            };
            if present {
                continue;
            }

            warn!(parameter = rule.name(), %uri, "missing parameter");
            let violation = Violation::new(
                &rule.missing,
                Some(rule.name().to_string()),
                None,
                rule.pattern(),
                &uri,
            );
            if let Control::Abort = self.raise(violation, request, response, violations) {
                return Control::Abort;
            }
        }

        Control::Proceed
    }

    /// Check 5: every value of every parameter present on the request must
    /// satisfy the rule resolved for (URI, name).
    fn check_malformed_parameters(
        &self,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
        violations: &mut ViolationList,
    ) -> Control {
        let uri = request.uri().to_string();
        let names: Vec<String> = request.parameter_names().map(str::to_string).collect();

        for name in names {
            let Some(rule) = self.rules.parameter_rule(&uri, &name) else {
                continue;
            };
            let values: Vec<String> = request.parameter_values(&name).to_vec();

            for value in values {
                if rule.is_valid(&value) {
                    continue;
                }

                warn!(parameter = %name, %uri, "malformed parameter value");
                let violation = Violation::new(
                    &rule.malformed,
                    Some(name.clone()),
                    Some(value),
                    rule.pattern(),
                    &uri,
                );
                if let Control::Abort = self.raise(violation, request, response, violations) {
                    return Control::Abort;
                }
            }
        }

        Control::Proceed
    }
}

// ─── SharedRuleSet ──────────────────────────────────────────────────────────

/// Atomically swappable handle to the active rule repository.
///
/// Reload builds a brand-new repository and publishes it with a single
/// pointer swap; passes that already took a snapshot keep it until they
/// finish, and no pass ever observes a partially built repository.
pub struct SharedRuleSet {
    inner: RwLock<Arc<RuleSet>>,
}

impl SharedRuleSet {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        SharedRuleSet {
            inner: RwLock::new(rules),
        }
    }

    /// The currently published repository. Validate against this snapshot.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.inner.read().clone()
    }

    /// Publish a replacement repository.
    pub fn swap(&self, rules: Arc<RuleSet>) {
        *self.inner.write() = rules;
    }

    /// Parse and compile `input`, then publish the result. On any error the
    /// previously published repository stays in effect untouched.
    pub fn reload(&self, input: &str, registry: &ActionRegistry) -> Result<(), StingerError> {
        let next = crate::load(input, registry)?;
        self.swap(next);
        Ok(())
    }
}
