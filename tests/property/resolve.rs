use proptest::prelude::*;
use stinger::{ActionRegistry, RuleSet, STINGER_ALL};

const CONFIG: &str = r#"
stinger: "1.0"
rulesets:
  - uri: "^/login$"
    rules:
      - name: username
        regex: "[a-zA-Z0-9_]{1,32}"
        missing:
          severity: fatal
        malformed:
          severity: continue
  - uri: STINGER_DEFAULT
    rules:
      - name: STINGER_ALL
        regex: "[a-zA-Z0-9 ]*"
        missing:
          severity: ignore
        malformed:
          severity: continue
"#;

fn compiled() -> RuleSet {
    let doc = stinger::parse(CONFIG).expect("parse should succeed");
    RuleSet::compile(&doc, &ActionRegistry::with_builtins()).expect("compile should succeed")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Resolution is total on a compiled repository: any (uri, name) pair
    // resolves to some rule.
    #[test]
    fn resolution_is_total(
        uri in "[a-zA-Z0-9/._-]{0,24}",
        name in "[a-zA-Z0-9_-]{0,12}",
    ) {
        let rules = compiled();
        prop_assert!(rules.parameter_rule(&uri, &name).is_some());
    }

    // Any URI outside the declared rule sets resolves to the default
    // catch-all, whatever the parameter name.
    #[test]
    fn unmatched_uri_resolves_to_default(
        suffix in "[a-zA-Z0-9._-]{1,16}",
        name in "[a-zA-Z0-9_-]{0,12}",
    ) {
        let uri = format!("/other/{}", suffix);
        let rules = compiled();
        let rule = rules.parameter_rule(&uri, &name).unwrap();
        prop_assert_eq!(rule.name(), STINGER_ALL);
        prop_assert_eq!(rule.pattern(), "[a-zA-Z0-9 ]*");
    }

    // The enumeration used by the missing-parameter check never returns an
    // empty sequence on a compiled repository.
    #[test]
    fn rule_enumeration_is_total(uri in "[a-zA-Z0-9/._-]{0,24}") {
        let rules = compiled();
        prop_assert!(!rules.parameter_rules(&uri).is_empty());
    }

    // Full-match semantics: a rule's pattern never accepts a value with a
    // trailing character outside its class.
    #[test]
    fn validation_is_a_full_match(value in "[a-zA-Z0-9 ]{0,16}") {
        let rules = compiled();
        let rule = rules.parameter_rule("/anywhere", "x").unwrap();
        prop_assert!(rule.is_valid(&value));
        let with_trailing = format!("{}<", value);
        prop_assert!(!rule.is_valid(&with_trailing));
    }
}
