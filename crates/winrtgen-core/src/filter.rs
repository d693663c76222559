//! Include/exclude prefix filter over fully-qualified type names

use std::collections::BTreeSet;

use crate::metadata::NamespaceMembers;

/// Prefix filter deciding which types are projected.
///
/// The longest matching prefix wins; on a tie the exclude takes precedence.
/// An empty filter admits everything.
#[derive(Debug, Clone, Default)]
pub struct ProjectionFilter {
    include: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

fn longest_match(prefixes: &BTreeSet<String>, full_name: &str) -> Option<usize> {
    prefixes
        .iter()
        .filter(|p| full_name.starts_with(p.as_str()))
        .map(|p| p.len())
        .max()
}

impl ProjectionFilter {
    pub fn new(include: BTreeSet<String>, exclude: BTreeSet<String>) -> Self {
        Self { include, exclude }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether a fully-qualified type name survives the filter.
    pub fn includes(&self, full_name: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        // An empty include set means "everything", which behaves like a
        // zero-length include prefix competing against the excludes.
        let included = if self.include.is_empty() {
            Some(0)
        } else {
            longest_match(&self.include, full_name)
        };

        match (included, longest_match(&self.exclude, full_name)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(inc), Some(exc)) => inc > exc,
        }
    }

    /// Whether any member of the namespace survives the filter.
    pub fn includes_namespace(&self, namespace: &str, members: &NamespaceMembers) -> bool {
        members
            .all_types()
            .any(|t| self.includes(&format!("{}.{}", namespace, t.name)))
    }
}
