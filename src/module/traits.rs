//! Module metadata interfaces
//!
//! Defines the seam between the graph builder and whatever reads module
//! metadata off disk.

use std::path::Path;
use thiserror::Error;

use crate::module::identity::{IdentityError, ModuleIdentity};

/// Metadata of one loaded module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// Actual identity of the loaded module
    pub identity: ModuleIdentity,
    /// Declared references, not yet resolved to files
    pub references: Vec<ModuleIdentity>,
}

impl ModuleMetadata {
    /// Create metadata for a module
    pub fn new(identity: ModuleIdentity, references: Vec<ModuleIdentity>) -> Self {
        Self {
            identity,
            references,
        }
    }
}

/// Reads module metadata for the graph builder
///
/// Both calls are blocking; the builder is single-threaded.
pub trait MetadataProvider {
    /// Whether a module file exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Load metadata of the module stored at `path`
    fn load(&self, path: &Path) -> Result<ModuleMetadata, ModuleError>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for &P {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn load(&self, path: &Path) -> Result<ModuleMetadata, ModuleError> {
        (**self).load(path)
    }
}

/// Module errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid module identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    #[error("Module operation failed: {0}")]
    OperationError(String),
}
