//! Dependency graph construction
//!
//! Walks declared references depth-first, starting from the primary module,
//! and records which referenced identities were requested versus which were
//! actually found on disk.

use std::path::{Path, PathBuf};
use std::vec::IntoIter;
use tracing::{debug, info, warn};

use crate::module::identity::ModuleIdentity;
use crate::module::registry::graph::{DependencyGraph, NodeId, VisitState};
use crate::module::traits::{MetadataProvider, ModuleError, ModuleMetadata};

/// Default extension of module files
pub const DEFAULT_BINARY_EXTENSION: &str = "dll";

/// A module whose references are being walked
struct Frame {
    node: NodeId,
    references: IntoIter<ModuleIdentity>,
}

/// Builds a [`DependencyGraph`] from a primary module
pub struct DependencyGraphBuilder<P> {
    provider: P,
    base_dir: PathBuf,
    binary_extension: String,
    strict_identities: bool,
    graph: DependencyGraph,
}

impl<P: MetadataProvider> DependencyGraphBuilder<P> {
    /// Create a builder resolving references against `base_dir`
    pub fn new<D: AsRef<Path>>(provider: P, base_dir: D) -> Self {
        Self {
            provider,
            base_dir: base_dir.as_ref().to_path_buf(),
            binary_extension: DEFAULT_BINARY_EXTENSION.to_string(),
            strict_identities: false,
            graph: DependencyGraph::new(),
        }
    }

    /// Use a different module file extension (without the dot)
    pub fn with_binary_extension(mut self, extension: impl Into<String>) -> Self {
        self.binary_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Abort on a referenced module whose own identity is malformed
    ///
    /// Off by default: such a reference is dropped with a warning.
    pub fn with_strict_identities(mut self, strict: bool) -> Self {
        self.strict_identities = strict;
        self
    }

    /// Where a reference is expected to live on disk
    pub fn expected_path(&self, reference: &ModuleIdentity) -> PathBuf {
        self.base_dir.join(format!(
            "{}.{}",
            reference.name.to_lowercase(),
            self.binary_extension
        ))
    }

    /// Load the primary module at `path` and scan everything it reaches
    pub fn build(&mut self, path: &Path) -> Result<NodeId, ModuleError> {
        if !self.provider.exists(path) {
            return Err(ModuleError::ModuleNotFound(path.display().to_string()));
        }

        let module = self.provider.load(path)?;
        info!("Scanning dependencies of {}", module.identity.short_name());
        self.graph.mark_on_disk(&module.identity);
        let root = self.scan(module)?;
        info!(
            "Dependency graph has {} nodes, {} modules on disk",
            self.graph.len(),
            self.graph.on_disk().count()
        );
        Ok(root)
    }

    /// Scan a loaded module
    ///
    /// Only nodes still [`VisitState::Unvisited`] are walked, so re-scanning a
    /// module (including one with no references) leaves the graph unchanged.
    pub fn scan(&mut self, module: ModuleMetadata) -> Result<NodeId, ModuleError> {
        let root = self.graph.get_or_insert(&module.identity);
        if !self.begin(root) {
            debug!("Already scanned: {}", module.identity.short_name());
            return Ok(root);
        }

        let mut stack = vec![Frame {
            node: root,
            references: module.references.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let parent = frame.node;
            let Some(reference) = frame.references.next() else {
                stack.pop();
                self.graph.set_state(parent, VisitState::Done);
                continue;
            };

            let path = self.expected_path(&reference);
            if !self.provider.exists(&path) {
                debug!(
                    "Dropping unresolved reference {} (no {})",
                    reference.short_name(),
                    path.display()
                );
                continue;
            }

            let actual = match self.provider.load(&path) {
                Ok(actual) => actual,
                Err(ModuleError::InvalidIdentity(e)) if !self.strict_identities => {
                    warn!(
                        "Dropping reference {}: {} has a malformed identity: {}",
                        reference.short_name(),
                        path.display(),
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            let requested = self.graph.get_or_insert(&reference);
            self.graph.link(parent, requested);
            if actual.identity != reference {
                debug!(
                    "{} requested, {} on disk",
                    reference.short_name(),
                    actual.identity.short_name()
                );
            }

            if self.graph.mark_on_disk(&actual.identity) {
                let node = self.graph.get_or_insert(&actual.identity);
                if self.begin(node) {
                    stack.push(Frame {
                        node,
                        references: actual.references.into_iter(),
                    });
                }
            }
        }

        Ok(root)
    }

    /// Borrow the graph built so far
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Finish building
    pub fn into_graph(self) -> DependencyGraph {
        self.graph
    }

    fn begin(&mut self, node: NodeId) -> bool {
        if self.graph.node(node).state != VisitState::Unvisited {
            return false;
        }
        self.graph.set_state(node, VisitState::InProgress);
        true
    }
}
