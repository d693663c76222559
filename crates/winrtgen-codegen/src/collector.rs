//! Dependency collection
//!
//! Extracts the module-level dependency set from a writer after a phase has
//! emitted its body. This is the only place dependency-graph nodes are
//! defined: a namespace that projects no types under the current filter is
//! dropped here and never reaches the planner.

use winrtgen_core::{MetadataCache, ProjectionFilter};

use crate::writer::Writer;

/// Sorted, deduplicated list of projected namespaces the writer referenced,
/// excluding the namespace being emitted.
pub fn namespace_module_imports(
    cache: &MetadataCache,
    filter: &ProjectionFilter,
    namespace: &str,
    w: &Writer,
) -> Vec<String> {
    w.depends
        .keys()
        .filter(|depends| depends.as_str() != namespace)
        .filter(|depends| cache.is_projected(depends, filter))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use winrtgen_core::{Database, DatabaseType, TypeKind, TypeName};

    fn cache_with(namespaces: &[&str]) -> MetadataCache {
        let types = namespaces
            .iter()
            .map(|ns| DatabaseType {
                namespace: ns.to_string(),
                name: "Marker".to_string(),
                kind: TypeKind::Contract { version: 1 },
            })
            .collect();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, serde_json::to_string(&Database { types }).unwrap()).unwrap();
        MetadataCache::from_files([&path], []).unwrap()
    }

    #[test]
    fn test_drops_self_and_non_projected() {
        let cache = cache_with(&["Test.A", "Test.B"]);
        let filter = ProjectionFilter::default();

        let mut w = Writer::with_namespace("Test.A");
        w.add_depends(&TypeName::new("Test.B", "Marker"));
        w.add_depends(&TypeName::new("Test.Missing", "Ghost"));

        let imports = namespace_module_imports(&cache, &filter, "Test.A", &w);
        assert_eq!(imports, vec!["Test.B".to_string()]);
    }

    #[test]
    fn test_filter_excludes_namespace_from_graph() {
        let cache = cache_with(&["Test.A", "Test.B"]);
        let filter = ProjectionFilter::new(
            Default::default(),
            ["Test.B".to_string()].into_iter().collect(),
        );

        let mut w = Writer::with_namespace("Test.A");
        w.add_depends(&TypeName::new("Test.B", "Marker"));

        let imports = namespace_module_imports(&cache, &filter, "Test.A", &w);
        assert!(imports.is_empty());
    }

    #[test]
    fn test_output_sorted() {
        let cache = cache_with(&["Test.A", "Test.B", "Test.C", "Test.D"]);
        let filter = ProjectionFilter::default();

        let mut w = Writer::with_namespace("Test.A");
        w.add_depends(&TypeName::new("Test.D", "Marker"));
        w.add_depends(&TypeName::new("Test.B", "Marker"));
        w.add_depends(&TypeName::new("Test.C", "Marker"));

        let imports = namespace_module_imports(&cache, &filter, "Test.A", &w);
        assert_eq!(imports, vec!["Test.B", "Test.C", "Test.D"]);
    }
}
