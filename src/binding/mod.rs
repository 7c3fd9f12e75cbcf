//! Deployment config files
//!
//! Finds the config files to update and writes binding redirects into them.

pub mod discovery;
pub mod document;
pub mod patcher;

pub use discovery::{ConfigPattern, UsageError, DEFAULT_CONFIG_SUFFIX};
pub use document::{Document, DocumentError, Element, Node};
pub use patcher::{
    ConfigPatcher, PatchError, PatchOutcome, PatchSummary, ASSEMBLY_BINDING_NAMESPACE,
};
