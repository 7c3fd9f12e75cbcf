//! Module manifest parsing
//!
//! Module metadata is read from a TOML sidecar stored next to the module
//! file: `foo.dll` is described by `foo.dll.toml`.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::module::identity::ModuleIdentity;
use crate::module::traits::{MetadataProvider, ModuleError, ModuleMetadata};

/// Sidecar manifest extension appended to the module file name
pub const MANIFEST_EXTENSION: &str = "toml";

/// Module manifest (sidecar TOML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Full identity of the module
    pub identity: String,
    /// Full identities of declared references
    #[serde(default)]
    pub references: Vec<String>,
}

impl ModuleManifest {
    /// Path of the manifest describing `module_path`
    pub fn path_for(module_path: &Path) -> PathBuf {
        let mut name: OsString = module_path.as_os_str().to_os_string();
        name.push(".");
        name.push(MANIFEST_EXTENSION);
        PathBuf::from(name)
    }

    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ModuleError::InvalidManifest(format!(
                "Failed to read manifest file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let manifest: ModuleManifest = toml::from_str(&contents).map_err(|e| {
            ModuleError::InvalidManifest(format!(
                "Failed to parse manifest TOML {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        if manifest.identity.trim().is_empty() {
            return Err(ModuleError::InvalidManifest(
                "Module identity cannot be empty".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Write manifest to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModuleError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ModuleError::InvalidManifest(format!("Failed to encode manifest: {}", e)))?;
        std::fs::write(path.as_ref(), contents).map_err(|e| {
            ModuleError::OperationError(format!(
                "Failed to write manifest {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Convert to ModuleMetadata
    ///
    /// A malformed module identity is always an error. A malformed reference
    /// is skipped with a warning unless `strict` is set.
    pub fn to_metadata(&self, strict: bool) -> Result<ModuleMetadata, ModuleError> {
        let identity = ModuleIdentity::parse(&self.identity)?;

        let mut references = Vec::with_capacity(self.references.len());
        for reference in &self.references {
            match ModuleIdentity::parse(reference) {
                Ok(parsed) => references.push(parsed),
                Err(e) if strict => return Err(e.into()),
                Err(e) => {
                    warn!(
                        "Skipping malformed reference in {}: {}",
                        identity.short_name(),
                        e
                    );
                }
            }
        }

        Ok(ModuleMetadata::new(identity, references))
    }
}

/// Metadata provider reading sidecar manifests from the filesystem
#[derive(Debug, Clone, Default)]
pub struct ManifestMetadataProvider {
    strict_identities: bool,
}

impl ManifestMetadataProvider {
    /// Create a provider
    pub fn new(strict_identities: bool) -> Self {
        Self { strict_identities }
    }
}

impl MetadataProvider for ManifestMetadataProvider {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path) -> Result<ModuleMetadata, ModuleError> {
        let manifest_path = ModuleManifest::path_for(path);
        if !manifest_path.is_file() {
            return Err(ModuleError::InvalidManifest(format!(
                "No manifest for module {} (expected {})",
                path.display(),
                manifest_path.display()
            )));
        }

        debug!("Loading module metadata from {:?}", manifest_path);
        ModuleManifest::from_file(&manifest_path)?.to_metadata(self.strict_identities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_appends_extension() {
        assert_eq!(
            ModuleManifest::path_for(Path::new("/app/foo.dll")),
            PathBuf::from("/app/foo.dll.toml")
        );
    }

    #[test]
    fn test_provider_loads_sidecar() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("foo.dll");
        std::fs::write(&module, b"MZ").unwrap();
        ModuleManifest {
            identity: "Foo, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null".to_string(),
            references: vec![
                "Bar, Version=2.0.0.0, Culture=neutral, PublicKeyToken=abc".to_string(),
            ],
        }
        .to_file(ModuleManifest::path_for(&module))
        .unwrap();

        let provider = ManifestMetadataProvider::default();
        assert!(provider.exists(&module));
        assert!(!provider.exists(&temp.path().join("bar.dll")));

        let metadata = provider.load(&module).unwrap();
        assert_eq!(metadata.identity.name, "Foo");
        assert_eq!(metadata.references.len(), 1);
        assert_eq!(metadata.references[0].version, "2.0.0.0");
    }

    #[test]
    fn test_malformed_reference_skip_or_abort() {
        let manifest = ModuleManifest {
            identity: "Foo, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null".to_string(),
            references: vec![
                "garbage".to_string(),
                "Bar, Version=2.0.0.0, Culture=neutral, PublicKeyToken=abc".to_string(),
            ],
        };

        let lenient = manifest.to_metadata(false).unwrap();
        assert_eq!(lenient.references.len(), 1);
        assert_eq!(lenient.references[0].name, "Bar");

        assert!(matches!(
            manifest.to_metadata(true),
            Err(ModuleError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_malformed_module_identity_is_error() {
        let manifest = ModuleManifest {
            identity: "Foo, Version=abc, Culture=neutral, PublicKeyToken=null".to_string(),
            references: Vec::new(),
        };
        assert!(manifest.to_metadata(false).is_err());
    }

    #[test]
    fn test_missing_manifest_is_error() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("foo.dll");
        std::fs::write(&module, b"MZ").unwrap();

        let provider = ManifestMetadataProvider::new(true);
        assert!(matches!(
            provider.load(&module),
            Err(ModuleError::InvalidManifest(_))
        ));
    }
}
