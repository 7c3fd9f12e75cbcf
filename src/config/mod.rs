//! Configuration management
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below.
//!
//! ```toml
//! [resolution]
//! binary_extension = "dll"
//! strict_identities = false
//!
//! [binding]
//! namespace = "urn:schemas-microsoft-com:asm.v1"
//! config_suffix = ".config"
//!
//! [logging]
//! filter = "info"
//! json_format = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::binding::discovery::DEFAULT_CONFIG_SUFFIX;
use crate::binding::patcher::ASSEMBLY_BINDING_NAMESPACE;
use crate::module::registry::DEFAULT_BINARY_EXTENSION;

/// Graph building and resolution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Extension of module files, without the dot
    #[serde(default = "default_binary_extension")]
    pub binary_extension: String,

    /// Abort on malformed identities (of references or of referenced modules)
    /// instead of skipping them
    #[serde(default)]
    pub strict_identities: bool,
}

fn default_binary_extension() -> String {
    DEFAULT_BINARY_EXTENSION.to_string()
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            binary_extension: default_binary_extension(),
            strict_identities: false,
        }
    }
}

/// Config file patching settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Namespace URI of the assembly binding elements
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Required suffix of the config file pattern
    #[serde(default = "default_config_suffix")]
    pub config_suffix: String,
}

fn default_namespace() -> String {
    ASSEMBLY_BINDING_NAMESPACE.to_string()
}

fn default_config_suffix() -> String {
    DEFAULT_CONFIG_SUFFIX.to_string()
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            config_suffix: default_config_suffix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "dependency_fixup::module=debug").
    /// RUST_LOG takes precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Emit JSON logs (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Tool configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixupConfig {
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub binding: BindingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FixupConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FixupConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self
            .resolution
            .binary_extension
            .trim_start_matches('.')
            .is_empty()
        {
            anyhow::bail!("resolution.binary_extension cannot be empty");
        }
        if self.binding.namespace.is_empty() {
            anyhow::bail!("binding.namespace cannot be empty");
        }
        if self.binding.config_suffix.is_empty() {
            anyhow::bail!("binding.config_suffix cannot be empty");
        }
        Ok(())
    }
}
