use proptest::prelude::*;
use stinger::actions::Scrub;
use stinger::{
    Action, Category, CategoryKind, MutableRequest, MutableResponse, Rule, Severity, Violation,
};

const PATTERN: &str = "[a-zA-Z0-9_]{1,32}";

fn rule() -> Rule {
    let missing = Category::new(CategoryKind::Missing, Severity::Continue, Vec::new());
    let malformed = Category::new(CategoryKind::Malformed, Severity::Continue, Vec::new());
    Rule::new("field", PATTERN, missing, malformed).expect("pattern should compile")
}

/// Run the scrub action against a single-parameter request and return the
/// rewritten value.
fn scrub(value: &str) -> String {
    let rule = rule();
    let mut request = MutableRequest::new("GET", "/form");
    request.add_parameter("field", value);
    let mut response = MutableResponse::new();

    let violation = Violation::new(
        &rule.malformed,
        Some("field".to_string()),
        Some(value.to_string()),
        rule.pattern(),
        "/form",
    );
    Scrub.invoke(&violation, &mut request, &mut response);

    request.parameter("field").unwrap_or("").to_string()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    // Every character surviving a scrub individually satisfies the pattern.
    #[test]
    fn scrubbed_output_only_contains_allowed_characters(value in "\\PC{0,32}") {
        let scrubbed = scrub(&value);
        prop_assert!(
            scrubbed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "scrubbed value still dirty: {:?}",
            scrubbed
        );
    }

    // Scrubbing is idempotent: a clean value survives unchanged.
    #[test]
    fn scrub_is_idempotent(value in "\\PC{1,32}") {
        let once = scrub(&value);
        let twice = scrub(&once);
        prop_assert_eq!(once, twice);
    }

    // Values already satisfying the pattern are left alone.
    #[test]
    fn valid_values_are_untouched(value in "[a-zA-Z0-9_]{1,32}") {
        prop_assert_eq!(scrub(&value), value);
    }

    // Only the offending value of a multi-valued parameter is rewritten.
    #[test]
    fn other_values_of_the_parameter_survive(
        clean in "[a-z]{1,8}",
        dirty in "[a-z]{1,8}<",
    ) {
        let rule = rule();
        let mut request = MutableRequest::new("GET", "/form");
        request.add_parameter("field", &clean);
        request.add_parameter("field", &dirty);
        let mut response = MutableResponse::new();

        let violation = Violation::new(
            &rule.malformed,
            Some("field".to_string()),
            Some(dirty.clone()),
            rule.pattern(),
            "/form",
        );
        Scrub.invoke(&violation, &mut request, &mut response);

        let values = request.parameter_values("field");
        prop_assert_eq!(values[0].as_str(), clean.as_str());
        prop_assert!(!values[1].contains('<'));
    }
}
