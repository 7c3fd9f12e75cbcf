//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use dependency_fixup::binding::{ConfigPattern, DEFAULT_CONFIG_SUFFIX};
use dependency_fixup::module::registry::ModuleManifest;
use dependency_fixup::module::{MetadataProvider, ModuleError, ModuleIdentity, ModuleMetadata};

pub const TOKEN: &str = "30ad4fe6b2a6aeed";

/// Canonical identity string with a fixed culture and token
pub fn ident(name: &str, version: &str) -> String {
    format!("{name}, Version={version}, Culture=neutral, PublicKeyToken={TOKEN}")
}

/// A deployment directory with modules described by sidecar manifests
pub struct FixupFixture {
    /// Temporary directory for test data
    pub temp_dir: TempDir,
    /// Directory holding modules and config files
    pub bin_dir: PathBuf,
}

impl FixupFixture {
    /// Create a fixture with an empty bin directory
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let bin_dir = temp_dir.path().join("bin");
        std::fs::create_dir_all(&bin_dir)?;
        Ok(Self { temp_dir, bin_dir })
    }

    /// Write `file` and its manifest
    pub fn add_module(&self, file: &str, identity: &str, references: &[&str]) -> PathBuf {
        let path = self.bin_dir.join(file);
        std::fs::write(&path, b"MZ").unwrap();
        ModuleManifest {
            identity: identity.to_string(),
            references: references.iter().map(|r| r.to_string()).collect(),
        }
        .to_file(ModuleManifest::path_for(&path))
        .unwrap();
        path
    }

    /// Write a config file into the bin directory
    pub fn write_config(&self, file: &str, contents: &str) -> PathBuf {
        let path = self.bin_dir.join(file);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// `<bin>/*.config`
    pub fn pattern(&self) -> ConfigPattern {
        let pattern = format!("{}/*.config", self.bin_dir.display());
        ConfigPattern::new(&pattern, DEFAULT_CONFIG_SUFFIX).unwrap()
    }
}

/// In-memory metadata provider that counts loads per path
#[derive(Default)]
pub struct MemoryProvider {
    pub modules: HashMap<PathBuf, ModuleMetadata>,
    pub loads: RefCell<HashMap<PathBuf, usize>>,
}

impl MemoryProvider {
    pub fn add(&mut self, path: &Path, identity: &str, references: &[String]) {
        let metadata = ModuleMetadata::new(
            ModuleIdentity::parse(identity).unwrap(),
            references
                .iter()
                .map(|r| ModuleIdentity::parse(r).unwrap())
                .collect(),
        );
        self.modules.insert(path.to_path_buf(), metadata);
    }
}

impl MetadataProvider for MemoryProvider {
    fn exists(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    fn load(&self, path: &Path) -> Result<ModuleMetadata, ModuleError> {
        *self
            .loads
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default() += 1;
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| ModuleError::ModuleNotFound(path.display().to_string()))
    }
}
