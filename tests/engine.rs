use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stinger::{
    Action, ActionOutcome, ActionRegistry, ConfigError, MutableRequest, MutableResponse, Outcome,
    Stinger, Violation,
};

/// Shared journal of action invocations, in the order they happened.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Test action that journals `tag:name=value` for every invocation.
struct Record {
    tag: String,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Action for Record {
    fn configure(&mut self, parameters: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(tag) = parameters.get("tag") {
            self.tag = tag.clone();
        }
        Ok(())
    }

    fn invoke(
        &self,
        violation: &Violation,
        _request: &mut MutableRequest,
        _response: &mut MutableResponse,
    ) -> ActionOutcome {
        self.journal.lock().unwrap().push(format!(
            "{}:{}={}",
            self.tag,
            violation.name().unwrap_or("-"),
            violation.value().unwrap_or("-"),
        ));
        ActionOutcome::Continue
    }
}

fn registry(recorder: &Recorder) -> ActionRegistry {
    let mut registry = ActionRegistry::with_builtins();
    let journal = recorder.0.clone();
    registry.register("record", move || {
        Box::new(Record {
            tag: "record".to_string(),
            journal: journal.clone(),
        })
    });
    registry
}

const CONFIG: &str = r#"
stinger: "1.0"
cookies:
  - name: SESSION
    regex: "[A-F0-9]{8}"
    created: "^/login$"
    enforced: ".*"
    missing:
      severity: continue
      actions:
        - name: record
          parameters:
            tag: cookie-missing
    malformed:
      severity: continue
      actions:
        - name: record
          parameters:
            tag: cookie-malformed
rulesets:
  - uri: "^/login$"
    rules:
      - name: username
        regex: "[a-zA-Z0-9_]{1,32}"
        missing:
          severity: fatal
          actions:
            - name: record
              parameters:
                tag: missing-username
            - name: redirect
              parameters:
                location: /error
        malformed:
          severity: continue
          actions:
            - name: scrub
            - name: record
              parameters:
                tag: malformed-username
  - uri: STINGER_DEFAULT
    rules:
      - name: STINGER_ALL
        regex: "[^<>]*"
        missing:
          severity: ignore
        malformed:
          severity: continue
          actions:
            - name: record
              parameters:
                tag: malformed-any
"#;

fn engine(recorder: &Recorder) -> Stinger {
    let rules = stinger::load(CONFIG, &registry(recorder)).expect("config should compile");
    Stinger::new(rules)
}

// ─── Missing parameters ─────────────────────────────────────────────────────

#[test]
fn missing_fatal_parameter_aborts() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/login");
    // Would raise a continue-severity violation in the malformed-parameter
    // check, but the fatal missing parameter must abort before that check runs.
    request.add_parameter("junk", "bad<chars>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Aborted);
    assert_eq!(recorder.entries(), vec!["missing-username:username=-"]);
    assert_eq!(response.redirect(), Some("/error"));
    assert_eq!(response.status(), 302);
}

#[test]
fn empty_parameter_value_counts_as_missing() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/login");
    request.add_parameter("username", "");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Aborted);
    assert_eq!(recorder.entries(), vec!["missing-username:username=-"]);
}

#[test]
fn catch_all_rule_is_not_a_required_parameter() {
    // The default rule set's catch-all is not a required parameter, and no
    // declared rule exists for /home; a bare request passes clean.
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/home");
    request.set_cookie(stinger::Cookie::new("SESSION", "0A1B2C3D"));
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert!(recorder.entries().is_empty());
}

// ─── Malformed parameters ───────────────────────────────────────────────────

#[test]
fn malformed_parameter_is_scrubbed_and_passes() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/login");
    request.add_parameter("username", "ab<script>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert_eq!(request.parameter("username"), Some("abscript"));
    assert_eq!(
        recorder.entries(),
        vec!["malformed-username:username=ab<script>"]
    );
}

#[test]
fn every_value_of_a_multi_valued_parameter_is_checked() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/home");
    request.set_cookie(stinger::Cookie::new("SESSION", "0A1B2C3D"));
    request.add_parameter("q", "fine");
    request.add_parameter("q", "<bad>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert_eq!(recorder.entries(), vec!["malformed-any:q=<bad>"]);
}

// ─── Cookies ────────────────────────────────────────────────────────────────

#[test]
fn missing_cookie_on_enforced_uri_is_reported() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/home");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert_eq!(recorder.entries(), vec!["cookie-missing:SESSION=-"]);
}

#[test]
fn no_missing_cookie_violation_on_creation_uri() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/login");
    request.add_parameter("username", "alice");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert!(recorder.entries().is_empty());
}

#[test]
fn malformed_cookie_value_is_reported_with_value() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/home");
    request.set_cookie(stinger::Cookie::new("SESSION", "zzz"));
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert_eq!(recorder.entries(), vec!["cookie-malformed:SESSION=zzz"]);
}

#[test]
fn undeclared_cookies_are_not_validated() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let mut request = MutableRequest::new("GET", "/home");
    request.set_cookie(stinger::Cookie::new("SESSION", "0A1B2C3D"));
    request.set_cookie(stinger::Cookie::new("theme", "dark<>"));
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert!(recorder.entries().is_empty());
}

// ─── URI check ──────────────────────────────────────────────────────────────

#[test]
fn malformed_url_aborts_with_anonymous_violation() {
    let recorder = Recorder::default();
    let mut registry = registry(&recorder);
    // Also verify custom registrations coexist with built-ins.
    assert!(registry.contains("scrub"));
    registry.register("noop", || {
        Box::new(Record {
            tag: "noop".to_string(),
            journal: Arc::new(Mutex::new(Vec::new())),
        })
    });

    let config = r#"
stinger: "1.0"
rulesets:
  - uri: "^/admin/.*"
    rules:
      - name: uri
        regex: "https://example[.]com/admin/[a-z/]*"
        missing:
          severity: ignore
        malformed:
          severity: fatal
          actions:
            - name: record
              parameters:
                tag: uri-bad
  - uri: STINGER_DEFAULT
    rules:
      - name: STINGER_ALL
        regex: "[^<>]*"
        missing:
          severity: ignore
        malformed:
          severity: continue
"#;

    let rules = stinger::load(config, &registry).expect("config should compile");
    let engine = Stinger::new(rules);

    let mut request = MutableRequest::new("GET", "/admin/panel");
    request.set_url("https://evil.example.net/admin/panel");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Aborted);
    // The URI check has no field; it reports the full URL as the value.
    assert_eq!(
        recorder.entries(),
        vec!["uri-bad:-=https://evil.example.net/admin/panel"]
    );
}

// ─── Ordering and short-circuiting ──────────────────────────────────────────

#[test]
fn accumulated_actions_run_in_discovery_order() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    // Missing cookie (check 2) plus two malformed parameters (check 5):
    // chains must run cookie first, then parameters in name order.
    let mut request = MutableRequest::new("GET", "/home");
    request.add_parameter("bb", "<y>");
    request.add_parameter("aa", "<x>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert_eq!(
        recorder.entries(),
        vec![
            "cookie-missing:SESSION=-",
            "malformed-any:aa=<x>",
            "malformed-any:bb=<y>",
        ]
    );
}

#[test]
fn fatal_violation_suppresses_accumulated_chains() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    // The malformed cookie accumulates in check 3, then the fatal missing
    // username fires in check 4: the cookie's chain must never run, and
    // check 5 must never raise the malformed junk parameter.
    let mut request = MutableRequest::new("GET", "/login");
    request.set_cookie(stinger::Cookie::new("SESSION", "zzz"));
    request.add_parameter("junk", "<zap>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Aborted);
    assert_eq!(recorder.entries(), vec!["missing-username:username=-"]);
    assert_eq!(response.redirect(), Some("/error"));
}

#[test]
fn validation_is_idempotent() {
    let recorder = Recorder::default();
    let engine = engine(&recorder);

    let make_request = || {
        let mut request = MutableRequest::new("GET", "/home");
        request.add_parameter("bb", "<y>");
        request.add_parameter("aa", "<x>");
        request.set_cookie(stinger::Cookie::new("SESSION", "nope"));
        request
    };

    let mut response = MutableResponse::new();
    assert_eq!(
        engine.validate(&mut make_request(), &mut response),
        Outcome::Passed
    );
    let first = recorder.entries();

    recorder.clear();
    let mut response = MutableResponse::new();
    assert_eq!(
        engine.validate(&mut make_request(), &mut response),
        Outcome::Passed
    );

    assert_eq!(first, recorder.entries());
}

// ─── Action chains ──────────────────────────────────────────────────────────

#[test]
fn action_break_stops_only_its_own_chain() {
    let recorder = Recorder::default();

    let config = r#"
stinger: "1.0"
rulesets:
  - uri: STINGER_DEFAULT
    rules:
      - name: STINGER_ALL
        regex: "[^<>]*"
        missing:
          severity: ignore
        malformed:
          severity: continue
          actions:
            - name: record
              parameters:
                tag: first
            - name: redirect
              parameters:
                location: /blocked
            - name: record
              parameters:
                tag: second
"#;

    let rules = stinger::load(config, &registry(&recorder)).expect("config should compile");
    let engine = Stinger::new(rules);

    let mut request = MutableRequest::new("GET", "/form");
    request.add_parameter("aa", "<x>");
    request.add_parameter("bb", "<y>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    // The redirect breaks each violation's chain after `first`, but the next
    // violation's chain still starts from the top.
    assert_eq!(recorder.entries(), vec!["first:aa=<x>", "first:bb=<y>"]);
    assert_eq!(response.redirect(), Some("/blocked"));
}

#[test]
fn display_message_writes_to_response_body() {
    let recorder = Recorder::default();

    let config = r#"
stinger: "1.0"
rulesets:
  - uri: STINGER_DEFAULT
    rules:
      - name: STINGER_ALL
        regex: "[^<>]*"
        missing:
          severity: ignore
        malformed:
          severity: continue
          actions:
            - name: display-message
              parameters:
                message: invalid input
"#;

    let rules = stinger::load(config, &registry(&recorder)).expect("config should compile");
    let engine = Stinger::new(rules);

    let mut request = MutableRequest::new("GET", "/form");
    request.add_parameter("q", "<x>");
    let mut response = MutableResponse::new();

    assert_eq!(engine.validate(&mut request, &mut response), Outcome::Passed);
    assert!(response.body().contains("invalid input"));
}
