//! Module planner
//!
//! Runs after every namespace emission has completed and the dependency map
//! is final. Partitions the namespace graph into strongly-connected
//! components so cyclic namespaces can be consolidated into a single module
//! interface unit, and computes each component's imports of other components.

use std::collections::BTreeMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::CodegenError;

/// One strongly-connected component of the namespace graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Canonical namespace: the lexicographically smallest member. Its module
    /// interface unit carries the whole component.
    pub owner: String,
    /// All member namespaces, sorted.
    pub members: Vec<String>,
    /// Imports of namespaces outside this component, sorted and deduplicated.
    pub external_imports: Vec<String>,
}

impl Component {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// The planner's output: components sorted by owner, plus the member-to-owner
/// mapping.
#[derive(Debug, Default)]
pub struct ModulePlan {
    pub components: Vec<Component>,
}

impl ModulePlan {
    pub fn owner_of(&self, namespace: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|c| c.members.iter().any(|m| m == namespace))
            .map(|c| c.owner.as_str())
    }
}

/// Partition the dependency map into strongly-connected components.
///
/// Nodes are the map's keys; an edge exists for each recorded dependency
/// whose target is itself a key (references into namespaces that were never
/// emitted do not influence the partitioning). Nodes are added in sorted key
/// order so the result is reproducible for identical inputs.
pub fn plan(dependencies: &BTreeMap<String, Vec<String>>) -> Result<ModulePlan, CodegenError> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut index: BTreeMap<&str, NodeIndex> = BTreeMap::new();

    for namespace in dependencies.keys() {
        index.insert(namespace.as_str(), graph.add_node(namespace.as_str()));
    }

    for (namespace, deps) in dependencies {
        let from = index[namespace.as_str()];
        for dep in deps {
            if let Some(&to) = index.get(dep.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let mut owner_of: BTreeMap<String, String> = BTreeMap::new();
    let mut members_by_owner: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for scc in tarjan_scc(&graph) {
        let mut members: Vec<String> = scc.iter().map(|&idx| graph[idx].to_string()).collect();
        members.sort();

        let owner = members[0].clone();
        for member in &members {
            owner_of.insert(member.clone(), owner.clone());
        }
        members_by_owner.insert(owner, members);
    }

    let mut components = Vec::with_capacity(members_by_owner.len());
    for (owner, members) in members_by_owner {
        let mut external_imports: Vec<String> = Vec::new();

        for member in &members {
            let deps = dependencies.get(member).ok_or_else(|| {
                CodegenError::Internal(format!(
                    "namespace '{}' missing from the dependency map",
                    member
                ))
            })?;

            for dep in deps {
                match owner_of.get(dep) {
                    Some(dep_owner) if *dep_owner == owner => {}
                    Some(_) => external_imports.push(dep.clone()),
                    None => {}
                }
            }
        }

        external_imports.sort();
        external_imports.dedup();

        components.push(Component {
            owner,
            members,
            external_imports,
        });
    }

    Ok(ModulePlan { components })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(ns, deps)| {
                (
                    ns.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_acyclic_graph_is_all_singletons() {
        let plan = plan(&map(&[("A", &["B"]), ("B", &["C"]), ("C", &[])])).unwrap();

        assert_eq!(plan.components.len(), 3);
        assert!(plan.components.iter().all(Component::is_singleton));
        assert_eq!(plan.components[0].owner, "A");
        assert_eq!(plan.components[0].external_imports, vec!["B"]);
        assert_eq!(plan.owner_of("B"), Some("B"));
    }

    #[test]
    fn test_two_node_cycle() {
        let plan = plan(&map(&[("X", &["Y"]), ("Y", &["X"])])).unwrap();

        assert_eq!(plan.components.len(), 1);
        let component = &plan.components[0];
        assert_eq!(component.owner, "X");
        assert_eq!(component.members, vec!["X", "Y"]);
        assert!(component.external_imports.is_empty());
        assert_eq!(plan.owner_of("Y"), Some("X"));
    }

    #[test]
    fn test_three_node_ring() {
        let plan = plan(&map(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])])).unwrap();

        assert_eq!(plan.components.len(), 1);
        let component = &plan.components[0];
        assert_eq!(component.owner, "A");
        assert_eq!(component.members, vec!["A", "B", "C"]);
        assert!(component.external_imports.is_empty());
    }

    #[test]
    fn test_cycle_with_external_dependency() {
        let plan = plan(&map(&[
            ("A", &["B", "Z"]),
            ("B", &["A"]),
            ("Z", &[]),
        ]))
        .unwrap();

        assert_eq!(plan.components.len(), 2);
        let cycle = &plan.components[0];
        assert_eq!(cycle.owner, "A");
        assert_eq!(cycle.external_imports, vec!["Z"]);

        let z = &plan.components[1];
        assert_eq!(z.owner, "Z");
        assert!(z.external_imports.is_empty());
    }

    #[test]
    fn test_edges_to_absent_nodes_dropped() {
        let plan = plan(&map(&[("A", &["Ghost", "B"]), ("B", &[])])).unwrap();

        assert_eq!(plan.components.len(), 2);
        assert_eq!(plan.components[0].external_imports, vec!["B"]);
    }

    #[test]
    fn test_external_imports_deduplicated_across_members() {
        let plan = plan(&map(&[
            ("A", &["B", "Z"]),
            ("B", &["A", "Z"]),
            ("Z", &[]),
        ]))
        .unwrap();

        assert_eq!(plan.components[0].external_imports, vec!["Z"]);
    }

    #[test]
    fn test_components_sorted_by_owner_and_deterministic() {
        let input = map(&[
            ("M", &["N"]),
            ("N", &["M"]),
            ("A", &[]),
            ("Z", &["A"]),
        ]);

        let first = plan(&input).unwrap();
        let second = plan(&input).unwrap();

        let owners: Vec<_> = first.components.iter().map(|c| c.owner.clone()).collect();
        assert_eq!(owners, vec!["A", "M", "Z"]);
        assert_eq!(first.components, second.components);
    }

    #[test]
    fn test_component_external_imports_form_dag() {
        // Two cycles chained: (A B) -> (C D). The component graph must be
        // acyclic even though the namespace graph is not.
        let plan = plan(&map(&[
            ("A", &["B", "C"]),
            ("B", &["A"]),
            ("C", &["D"]),
            ("D", &["C"]),
        ]))
        .unwrap();

        assert_eq!(plan.components.len(), 2);
        let ab = &plan.components[0];
        let cd = &plan.components[1];
        assert_eq!(ab.external_imports, vec!["C"]);
        assert!(cd.external_imports.is_empty());
    }
}
