//! Module model
//!
//! Module identities, the metadata provider seam, and the registry that
//! turns a primary module into a dependency graph and redirect records.

pub mod identity;
pub mod registry;
pub mod traits;

pub use identity::{IdentityError, ModuleIdentity};
pub use traits::{MetadataProvider, ModuleError, ModuleMetadata};
