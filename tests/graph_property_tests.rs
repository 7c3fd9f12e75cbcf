//! Property-based tests for graph building and resolution
//!
//! Uses proptest over random, possibly cyclic, reference sets.

use proptest::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dependency_fixup::module::registry::{DependencyGraphBuilder, RedirectResolver, VisitState};
use dependency_fixup::module::ModuleIdentity;

mod common;
use common::*;

const MODULES: usize = 6;

fn module_path(index: usize) -> PathBuf {
    Path::new("/bin").join(format!("m{index}.dll"))
}

/// Module `i` is `M{i}` version 2.0.0.0 on disk; reference `(j, v)` asks
/// for `M{j}` version `v.0.0.0`. Modules with `present[i] == false` have no file.
fn provider(references: &[Vec<(usize, u32)>], present: &[bool]) -> MemoryProvider {
    let mut provider = MemoryProvider::default();
    for (i, refs) in references.iter().enumerate() {
        if i != 0 && !present[i] {
            continue;
        }
        let refs: Vec<String> = refs
            .iter()
            .map(|(j, v)| ident(&format!("M{j}"), &format!("{v}.0.0.0")))
            .collect();
        provider.add(&module_path(i), &ident(&format!("M{i}"), "2.0.0.0"), &refs);
    }
    provider
}

fn references_strategy() -> impl Strategy<Value = Vec<Vec<(usize, u32)>>> {
    prop::collection::vec(
        prop::collection::vec((0..MODULES, 1u32..=3), 0..4),
        MODULES,
    )
}

proptest! {
    /// Property: every distinct identity gets exactly one node and every
    /// module found on disk is fully scanned
    #[test]
    fn prop_build_terminates_with_unique_nodes(
        references in references_strategy(),
        present in prop::collection::vec(any::<bool>(), MODULES),
    ) {
        let provider = provider(&references, &present);
        let mut builder = DependencyGraphBuilder::new(&provider, "/bin");
        builder.build(&module_path(0)).unwrap();
        let graph = builder.into_graph();

        let keys: HashSet<&str> = graph.nodes().map(|(_, n)| n.key.as_str()).collect();
        prop_assert_eq!(keys.len(), graph.len());

        for key in graph.on_disk() {
            let id = graph.find(key);
            prop_assert!(id.is_some());
            let node = graph.node(id.unwrap());
            prop_assert_eq!(node.state, VisitState::Done);
        }

        // Each file is loaded at most once per incoming edge, plus the root load
        let edges: usize = graph.nodes().map(|(_, n)| n.children.len()).sum();
        let loads: usize = provider.loads.borrow().values().sum();
        prop_assert!(loads <= edges + 1);
    }
}

proptest! {
    /// Property: no record is emitted for a root or for an on-disk identity,
    /// and records come out sorted and unique by name
    #[test]
    fn prop_resolver_skips_roots_and_on_disk_nodes(
        references in references_strategy(),
        present in prop::collection::vec(any::<bool>(), MODULES),
    ) {
        let provider = provider(&references, &present);
        let mut builder = DependencyGraphBuilder::new(&provider, "/bin");
        builder.build(&module_path(0)).unwrap();
        let graph = builder.into_graph();

        let records = RedirectResolver::resolve(&graph);
        for record in &records {
            prop_assert!(!record.parents.is_empty());
            for node in &record.nodes {
                prop_assert!(!graph.is_on_disk(&graph.node(*node).key));
                prop_assert!(!graph.node(*node).parents.is_empty());
            }
            // every requested version differs from the 2.0.0.0 on disk
            prop_assert!(record.requested.version != "2.0.0.0");
            if let Some(redirect) = record.redirect() {
                prop_assert_eq!(redirect.new_version, "2.0.0.0");
            }
        }

        let names: Vec<&str> = records.iter().map(|r| r.requested.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(names, sorted);
    }
}

proptest! {
    /// Property: parsing a formatted identity gives back name and version exactly
    #[test]
    fn prop_identity_parse_round_trip(
        name in "[A-Za-z][A-Za-z0-9_.]{0,20}",
        version in prop::collection::vec(0u32..70000, 1..=4),
        culture in "(neutral|en-US|)",
        token in "([0-9a-f]{16}|null)",
    ) {
        let version = version.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
        let identity = ModuleIdentity::new(name.clone(), version.clone(), culture, token);

        let parsed = ModuleIdentity::parse(&identity.full_name()).unwrap();
        prop_assert_eq!(&parsed.name, &name);
        prop_assert_eq!(&parsed.version, &version);
        prop_assert_eq!(parsed, identity);
    }
}
