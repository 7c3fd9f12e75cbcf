//! Module registry
//!
//! Handles manifest parsing, dependency graph construction, and redirect
//! resolution.

pub mod builder;
pub mod graph;
pub mod manifest;
pub mod resolver;

pub use builder::{DependencyGraphBuilder, DEFAULT_BINARY_EXTENSION};
pub use graph::{DependencyGraph, DependencyNode, NodeId, VisitState};
pub use manifest::{ManifestMetadataProvider, ModuleManifest};
pub use resolver::{BindingRedirect, RedirectResolver, ResolutionRecord};
