use crate::error::{ParseError, ParseErrorKind};
use crate::types::RuleDocument;

/// Parse a YAML string into an unvalidated RuleDocument.
///
/// Performs YAML deserialization and type mapping only. Does NOT compile
/// regexes or resolve action names — that is `RuleSet::compile`'s job.
pub fn parse(input: &str) -> Result<RuleDocument, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: "empty input".to_string(),
            path: None,
            line: None,
            column: None,
        });
    }

    // Deserialize using serde-saphyr via serde_json::Value as intermediate.
    let value: serde_json::Value = serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_saphyr_error(&msg),
            message: msg,
            path: None,
            line: None,
            column: None,
        }
    })?;

    // Ensure root is a mapping/object
    if !value.is_object() {
        return Err(ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: "document root must be a YAML mapping".to_string(),
            path: None,
            line: None,
            column: None,
        });
    }

    // Reject unknown top-level keys so a typo'd section fails loudly instead
    // of silently disabling a whole class of rules.
    if let Some(obj) = value.as_object() {
        for key in obj.keys() {
            match key.as_str() {
                "stinger" | "exclude" | "regexes" | "cookies" | "rulesets" => {}
                other => {
                    return Err(ParseError {
                        kind: ParseErrorKind::TypeMismatch,
                        message: format!("unknown top-level field: {}", other),
                        path: Some(other.to_string()),
                        line: None,
                        column: None,
                    });
                }
            }
        }
    }

    let doc: RuleDocument = serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_json_error(&msg),
            message: msg,
            path: None,
            line: None,
            column: None,
        }
    })?;

    Ok(doc)
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown") || lower.contains("variant") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("type") || lower.contains("invalid") || lower.contains("expected") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}

fn classify_json_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown variant") || lower.contains("unknown field") {
        ParseErrorKind::UnknownVariant
    } else if lower.contains("missing field") || lower.contains("invalid type") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
