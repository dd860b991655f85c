use std::fmt;
use std::sync::Arc;

use crate::actions::Action;
use crate::enums::{CategoryKind, Severity};
use crate::rules::Category;

/// One failed check: what rule fired, for which field, on which URI.
///
/// Immutable once constructed; created during a check and consumed during
/// action dispatch. The action chain is cloned out of the owning category so
/// the violation stays self-contained.
#[derive(Clone)]
pub struct Violation {
    category: CategoryKind,
    severity: Severity,
    name: Option<String>,
    value: Option<String>,
    pattern: String,
    uri: String,
    actions: Vec<Arc<dyn Action>>,
}

impl Violation {
    pub fn new(
        category: &Category,
        name: Option<String>,
        value: Option<String>,
        pattern: &str,
        uri: &str,
    ) -> Self {
        Violation {
            category: category.kind,
            severity: category.severity,
            name,
            value,
            pattern: pattern.to_string(),
            uri: uri.to_string(),
            actions: category.actions.clone(),
        }
    }

    pub fn category(&self) -> CategoryKind {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The offending field name. `None` for the URI well-formedness check,
    /// which has no field.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The offending value. `None` for missing fields.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The violated pattern as written in configuration.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }
}

impl fmt::Debug for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Violation")
            .field("category", &self.category)
            .field("severity", &self.severity)
            .field("name", &self.name)
            .field("value", &self.value)
            .field("pattern", &self.pattern)
            .field("uri", &self.uri)
            .field("actions", &self.actions.len())
            .finish()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.category {
            CategoryKind::Missing => "missing",
            CategoryKind::Malformed => "malformed",
        };
        match &self.name {
            Some(name) => write!(f, "{} `{}` on `{}`", kind, name, self.uri),
            None => write!(f, "{} request URL on `{}`", kind, self.uri),
        }
    }
}

/// Ordered, append-only sequence of violations gathered during one validation
/// pass. Discarded when the pass completes.
#[derive(Clone, Debug, Default)]
pub struct ViolationList {
    items: Vec<Violation>,
}

impl ViolationList {
    pub fn new() -> Self {
        ViolationList::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.items.push(violation);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a ViolationList {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ViolationList {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
