//! Dependency graph storage
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A lookup map keyed
//! by full identity string guarantees one node per identity, so cycles and
//! diamonds never create duplicate nodes or owning loops.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::module::identity::ModuleIdentity;

/// Index of a node in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Traversal marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
    /// Never scanned
    #[default]
    Unvisited,
    /// References are being scanned
    InProgress,
    /// All references scanned
    Done,
}

/// One module identity in the graph
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// Parsed identity
    pub identity: ModuleIdentity,
    /// Full identity string (registry key)
    pub key: String,
    /// Nodes this module declared a dependency on
    pub children: Vec<NodeId>,
    /// Nodes that declared a dependency on this module
    pub parents: Vec<NodeId>,
    /// Traversal state
    pub state: VisitState,
}

/// Deduplicated dependency graph plus the set of identities found on disk
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    index: HashMap<String, NodeId>,
    on_disk: BTreeSet<String>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the node for `identity`, creating it if needed
    pub fn get_or_insert(&mut self, identity: &ModuleIdentity) -> NodeId {
        let key = identity.full_name();
        if let Some(&id) = self.index.get(&key) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(DependencyNode {
            identity: identity.clone(),
            key: key.clone(),
            children: Vec::new(),
            parents: Vec::new(),
            state: VisitState::Unvisited,
        });
        self.index.insert(key, id);
        id
    }

    /// Record a "uses" edge from `parent` to `child`
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
    }

    /// Find a node by full identity string
    pub fn find(&self, full_identity: &str) -> Option<NodeId> {
        self.index.get(full_identity).copied()
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub(crate) fn set_state(&mut self, id: NodeId, state: VisitState) {
        self.nodes[id.0].state = state;
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DependencyNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add an identity found on disk; returns false if it was already present
    pub fn mark_on_disk(&mut self, identity: &ModuleIdentity) -> bool {
        self.on_disk.insert(identity.full_name())
    }

    /// Whether a full identity string was found on disk
    pub fn is_on_disk(&self, full_identity: &str) -> bool {
        self.on_disk.contains(full_identity)
    }

    /// On-disk identities in sorted order
    pub fn on_disk(&self) -> impl Iterator<Item = &str> {
        self.on_disk.iter().map(String::as_str)
    }

    /// Every parent chain from `id` up to a node without parents
    ///
    /// Each path starts at `id`. A parent already on the current path ends
    /// that path, so cycles terminate.
    pub fn paths_to_roots(&self, id: NodeId) -> Vec<Vec<NodeId>> {
        let mut paths = Vec::new();
        let mut stack = vec![vec![id]];

        while let Some(path) = stack.pop() {
            let Some(&last) = path.last() else {
                continue;
            };
            let on_path: HashSet<NodeId> = path.iter().copied().collect();
            let parents: Vec<NodeId> = self.nodes[last.0]
                .parents
                .iter()
                .copied()
                .filter(|p| !on_path.contains(p))
                .collect();

            if parents.is_empty() {
                paths.push(path);
                continue;
            }

            // Reverse so the first parent is explored first
            for parent in parents.into_iter().rev() {
                let mut next = path.clone();
                next.push(parent);
                stack.push(next);
            }
        }

        paths
    }
}
