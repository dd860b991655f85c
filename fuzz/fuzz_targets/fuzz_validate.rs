#![no_main]

use std::sync::{Arc, OnceLock};

use libfuzzer_sys::fuzz_target;
use stinger::{MutableRequest, MutableResponse, RuleSet, Stinger};

const CONFIG: &str = r#"
stinger: "1.0"
cookies:
  - name: SESSION
    regex: "[A-F0-9]{8}"
    created: "^/login$"
    enforced: ".*"
    missing:
      severity: continue
    malformed:
      severity: continue
rulesets:
  - uri: "^/login$"
    rules:
      - name: username
        regex: "[a-zA-Z0-9_]{1,32}"
        missing:
          severity: fatal
        malformed:
          severity: continue
          actions:
            - name: scrub
  - uri: STINGER_DEFAULT
    rules:
      - name: STINGER_ALL
        regex: "[^<>]*"
        missing:
          severity: ignore
        malformed:
          severity: continue
          actions:
            - name: scrub
"#;

fn rules() -> Arc<RuleSet> {
    static RULES: OnceLock<Arc<RuleSet>> = OnceLock::new();
    RULES
        .get_or_init(|| {
            let registry = stinger::ActionRegistry::with_builtins();
            stinger::load(CONFIG, &registry).expect("fuzz config should compile")
        })
        .clone()
}

// A validation pass over arbitrary request data must never panic, whatever
// the URI, parameter, or cookie bytes look like.
fuzz_target!(|data: (&str, &str, &str, &str)| {
    let (uri, name, value, cookie) = data;

    let engine = Stinger::new(rules());
    let mut request = MutableRequest::new("GET", uri);
    request.add_parameter(name, value);
    request.set_cookie(stinger::Cookie::new("SESSION", cookie));
    let mut response = MutableResponse::new();

    let _ = engine.validate(&mut request, &mut response);
});
