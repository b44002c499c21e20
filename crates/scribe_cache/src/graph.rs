//! Reverse reference graph used for transitive invalidation.
//!
//! Stored entries record which documents they link to. Inverting those sets
//! answers the question invalidation needs: which documents link to *this*
//! one, directly or through a chain of links.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use scribe_common::DocumentId;

/// Inverts a forward reference map into a reverse (dependents) map.
///
/// Only documents referenced by at least one other document appear as
/// keys; a document without dependents is absent rather than mapped to an
/// empty set. Self-references are dropped. Targets need not be part of the
/// forward map themselves.
pub fn build_dependency_graph<'a, I>(forward: I) -> HashMap<DocumentId, BTreeSet<DocumentId>>
where
    I: IntoIterator<Item = (&'a DocumentId, &'a BTreeSet<DocumentId>)>,
{
    let mut reverse: HashMap<DocumentId, BTreeSet<DocumentId>> = HashMap::new();
    for (source, targets) in forward {
        for target in targets {
            if target == source {
                continue;
            }
            reverse
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
        }
    }
    reverse
}

/// Reverse dependency graph: document → documents that reference it.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    reverse: HashMap<DocumentId, BTreeSet<DocumentId>>,
}

impl DependencyGraph {
    /// Builds the graph from forward reference sets.
    pub fn from_forward<'a, I>(forward: I) -> Self
    where
        I: IntoIterator<Item = (&'a DocumentId, &'a BTreeSet<DocumentId>)>,
    {
        Self {
            reverse: build_dependency_graph(forward),
        }
    }

    /// Documents that directly reference `id`, in identifier order.
    pub fn dependents<'g>(&'g self, id: &DocumentId) -> impl Iterator<Item = &'g DocumentId> + 'g {
        self.reverse.get(id).into_iter().flatten()
    }

    /// Every document that reaches `id` through one or more references.
    ///
    /// Breadth-first over an explicit work-list, so depth is bounded by heap
    /// rather than stack. Each document is reported at most once, cycles
    /// terminate, and `id` itself is never part of the result.
    pub fn transitive_dependents(&self, id: &DocumentId) -> Vec<DocumentId> {
        let mut visited: HashSet<&DocumentId> = HashSet::new();
        visited.insert(id);
        let mut queue: VecDeque<&DocumentId> = VecDeque::new();
        queue.push_back(id);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents(current) {
                if visited.insert(dependent) {
                    found.push(dependent.clone());
                    queue.push_back(dependent);
                }
            }
        }
        found
    }

    /// Number of documents with at least one dependent.
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Returns `true` if no document references any other.
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// The underlying reverse map.
    pub fn as_map(&self) -> &HashMap<DocumentId, BTreeSet<DocumentId>> {
        &self.reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DocumentId {
        DocumentId::new(s).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<DocumentId> {
        items.iter().map(|s| id(s)).collect()
    }

    fn forward(edges: &[(&str, &[&str])]) -> HashMap<DocumentId, BTreeSet<DocumentId>> {
        edges
            .iter()
            .map(|(from, tos)| (id(from), set(tos)))
            .collect()
    }

    #[test]
    fn inverts_forward_map() {
        let fwd = forward(&[("a.md", &["b.md", "c.md"]), ("b.md", &["c.md"]), ("c.md", &[])]);
        let rev = build_dependency_graph(&fwd);

        assert_eq!(rev.len(), 2);
        assert_eq!(rev[&id("b.md")], set(&["a.md"]));
        assert_eq!(rev[&id("c.md")], set(&["a.md", "b.md"]));
        assert!(!rev.contains_key(&id("a.md")));
    }

    #[test]
    fn self_references_dropped() {
        let fwd = forward(&[("a.md", &["a.md"]), ("b.md", &["b.md", "a.md"])]);
        let rev = build_dependency_graph(&fwd);
        assert_eq!(rev.len(), 1);
        assert_eq!(rev[&id("a.md")], set(&["b.md"]));
    }

    #[test]
    fn target_outside_forward_map_still_present() {
        let fwd = forward(&[("a.md", &["unknown.md"])]);
        let rev = build_dependency_graph(&fwd);
        assert_eq!(rev[&id("unknown.md")], set(&["a.md"]));
    }

    #[test]
    fn empty_forward_map() {
        let empty: HashMap<DocumentId, BTreeSet<DocumentId>> = HashMap::new();
        let graph = DependencyGraph::from_forward(&empty);
        assert!(graph.is_empty());
        assert_eq!(graph.dependents(&id("a.md")).count(), 0);
        assert!(graph.transitive_dependents(&id("a.md")).is_empty());
    }

    #[test]
    fn transitive_chain() {
        let fwd = forward(&[("a.md", &["b.md"]), ("b.md", &["c.md"]), ("c.md", &[])]);
        let graph = DependencyGraph::from_forward(&fwd);
        assert_eq!(graph.transitive_dependents(&id("c.md")), vec![id("b.md"), id("a.md")]);
        assert_eq!(graph.transitive_dependents(&id("b.md")), vec![id("a.md")]);
        assert!(graph.transitive_dependents(&id("a.md")).is_empty());
    }

    #[test]
    fn two_node_cycle_terminates() {
        let fwd = forward(&[("a.md", &["b.md"]), ("b.md", &["a.md"])]);
        let graph = DependencyGraph::from_forward(&fwd);
        assert_eq!(graph.transitive_dependents(&id("a.md")), vec![id("b.md")]);
    }

    #[test]
    fn diamond_reported_once() {
        // d is reachable from a via both b and c.
        let fwd = forward(&[
            ("d.md", &["b.md", "c.md"]),
            ("b.md", &["a.md"]),
            ("c.md", &["a.md"]),
        ]);
        let graph = DependencyGraph::from_forward(&fwd);
        let deps = graph.transitive_dependents(&id("a.md"));
        assert_eq!(deps, vec![id("b.md"), id("c.md"), id("d.md")]);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let n = 50_000;
        let ids: Vec<DocumentId> = (0..n).map(|i| id(&format!("doc{i}.md"))).collect();
        let mut fwd = HashMap::new();
        for i in 1..n {
            fwd.insert(ids[i].clone(), BTreeSet::from([ids[i - 1].clone()]));
        }
        // Close the loop so the traversal must also handle a long cycle.
        fwd.insert(ids[0].clone(), BTreeSet::from([ids[n - 1].clone()]));

        let graph = DependencyGraph::from_forward(&fwd);
        let deps = graph.transitive_dependents(&ids[0]);
        assert_eq!(deps.len(), n - 1);
        assert!(!deps.contains(&ids[0]));
    }
}
