//! Redirect resolution
//!
//! Reconciles every requested identity that is not present on disk with the
//! module that actually is, matching by module name.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::module::identity::{base_name, ModuleIdentity};
use crate::module::registry::graph::{DependencyGraph, NodeId};

/// A redirect to write into config files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRedirect {
    /// Module name
    pub name: String,
    /// Public key token of the module on disk
    pub public_key_token: String,
    /// Culture of the module on disk
    pub culture: String,
    /// Highest version redirected (range is `0.0.0.0-old_version_max`)
    pub old_version_max: String,
    /// Version present on disk
    pub new_version: String,
}

impl BindingRedirect {
    /// Value of the `oldVersion` attribute
    pub fn old_version_range(&self) -> String {
        format!("0.0.0.0-{}", self.old_version_max)
    }
}

/// Resolution of one requested module name
#[derive(Debug, Clone)]
pub struct ResolutionRecord {
    /// Highest requested identity of this module
    pub requested: ModuleIdentity,
    /// Every distinct requested identity, highest last
    pub requested_versions: Vec<ModuleIdentity>,
    /// The module found on disk, if any
    pub matched: Option<ModuleIdentity>,
    /// Requesting nodes in first-seen order
    pub parents: Vec<NodeId>,
    /// Requested nodes merged into this record
    pub nodes: Vec<NodeId>,
}

impl ResolutionRecord {
    /// Redirect for this record, or `None` when nothing matched on disk
    pub fn redirect(&self) -> Option<BindingRedirect> {
        let target = self.matched.as_ref()?;
        Some(BindingRedirect {
            name: target.name.clone(),
            public_key_token: target.public_key_token.clone(),
            culture: target.culture.clone(),
            old_version_max: self.requested.version.clone(),
            new_version: target.version.clone(),
        })
    }
}

/// Redirect resolver
pub struct RedirectResolver;

impl RedirectResolver {
    /// Produce resolution records sorted by requested module name
    ///
    /// Nodes without parents and nodes whose identity is on disk are skipped.
    /// Nodes sharing a module name are merged into one record.
    pub fn resolve(graph: &DependencyGraph) -> Vec<ResolutionRecord> {
        let mut by_name: BTreeMap<String, ResolutionRecord> = BTreeMap::new();

        for (id, node) in graph.nodes() {
            if node.parents.is_empty() || graph.is_on_disk(&node.key) {
                continue;
            }

            let record = by_name
                .entry(node.identity.name.clone())
                .or_insert_with(|| ResolutionRecord {
                    requested: node.identity.clone(),
                    requested_versions: Vec::new(),
                    matched: Self::closest_match(graph, &node.key),
                    parents: Vec::new(),
                    nodes: Vec::new(),
                });

            record.nodes.push(id);
            record.requested_versions.push(node.identity.clone());
            for parent in &node.parents {
                if !record.parents.contains(parent) {
                    record.parents.push(*parent);
                }
            }
        }

        let records: Vec<ResolutionRecord> = by_name
            .into_values()
            .map(|mut record| {
                record
                    .requested_versions
                    .sort_by(|a, b| a.cmp_version(b));
                if let Some(highest) = record.requested_versions.last() {
                    record.requested = highest.clone();
                }
                if record.matched.is_none() {
                    warn!(
                        "No module on disk matches {}",
                        record.requested.short_name()
                    );
                }
                record
            })
            .collect();

        debug!("Resolved {} redirect records", records.len());
        records
    }

    /// First on-disk identity (in sorted order) with the same base name
    pub fn closest_match(graph: &DependencyGraph, requested: &str) -> Option<ModuleIdentity> {
        let name = base_name(requested);
        graph
            .on_disk()
            .filter(|candidate| base_name(candidate) == name)
            .find_map(|candidate| match ModuleIdentity::parse(candidate) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!("Skipping unparsable on-disk identity {}: {}", candidate, e);
                    None
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str, version: &str) -> ModuleIdentity {
        ModuleIdentity::new(name, version, "neutral", "abc")
    }

    #[test]
    fn test_roots_and_on_disk_nodes_are_skipped() {
        let mut graph = DependencyGraph::new();
        let root = graph.get_or_insert(&id("App", "1.0.0.0"));
        let lib = graph.get_or_insert(&id("Lib", "2.0.0.0"));
        graph.link(root, lib);
        graph.mark_on_disk(&id("App", "1.0.0.0"));
        graph.mark_on_disk(&id("Lib", "2.0.0.0"));

        assert!(RedirectResolver::resolve(&graph).is_empty());
    }

    #[test]
    fn test_mismatch_produces_redirect() {
        let mut graph = DependencyGraph::new();
        let root = graph.get_or_insert(&id("App", "1.0.0.0"));
        let foo = graph.get_or_insert(&id("Foo", "1.0.0.0"));
        graph.link(root, foo);
        graph.mark_on_disk(&id("Foo", "2.0.0.0"));

        let records = RedirectResolver::resolve(&graph);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parents, vec![root]);

        let redirect = records[0].redirect().unwrap();
        assert_eq!(redirect.name, "Foo");
        assert_eq!(redirect.old_version_range(), "0.0.0.0-1.0.0.0");
        assert_eq!(redirect.new_version, "2.0.0.0");
        assert_eq!(redirect.public_key_token, "abc");
    }

    #[test]
    fn test_versions_of_one_name_are_merged() {
        let mut graph = DependencyGraph::new();
        let a = graph.get_or_insert(&id("A", "1.0.0.0"));
        let b = graph.get_or_insert(&id("B", "1.0.0.0"));
        let bar_old = graph.get_or_insert(&id("Bar", "1.0.0.0"));
        let bar_mid = graph.get_or_insert(&id("Bar", "1.10.0.0"));
        graph.link(b, bar_mid);
        graph.link(a, bar_old);
        graph.mark_on_disk(&id("Bar", "3.0.0.0"));

        let records = RedirectResolver::resolve(&graph);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].requested.version, "1.10.0.0");
        assert_eq!(records[0].parents, vec![a, b]);
        assert_eq!(records[0].requested_versions.len(), 2);
    }

    #[test]
    fn test_records_sorted_by_name() {
        let mut graph = DependencyGraph::new();
        let root = graph.get_or_insert(&id("App", "1.0.0.0"));
        for name in ["Zeta", "Alpha", "Mid"] {
            let n = graph.get_or_insert(&id(name, "1.0.0.0"));
            graph.link(root, n);
            graph.mark_on_disk(&id(name, "2.0.0.0"));
        }

        let names: Vec<String> = RedirectResolver::resolve(&graph)
            .into_iter()
            .map(|r| r.requested.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_missing_match_has_no_redirect() {
        let mut graph = DependencyGraph::new();
        let root = graph.get_or_insert(&id("App", "1.0.0.0"));
        let ghost = graph.get_or_insert(&id("Ghost", "1.0.0.0"));
        graph.link(root, ghost);

        let records = RedirectResolver::resolve(&graph);
        assert_eq!(records.len(), 1);
        assert!(records[0].matched.is_none());
        assert!(records[0].redirect().is_none());
    }

    #[test]
    fn test_closest_match_uses_base_name_only() {
        let mut graph = DependencyGraph::new();
        graph.mark_on_disk(&id("Foo.Extensions", "1.0.0.0"));
        graph.mark_on_disk(&id("Foo", "4.0.0.0"));

        let found = RedirectResolver::closest_match(
            &graph,
            "Foo, Version=1.0.0.0, Culture=neutral, PublicKeyToken=abc",
        )
        .unwrap();
        assert_eq!(found.version, "4.0.0.0");
        assert_eq!(found.name, "Foo");
    }
}
