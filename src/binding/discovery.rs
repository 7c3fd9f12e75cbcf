//! Config file discovery
//!
//! Validates the config file pattern given on the command line and expands it
//! to the matching files.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Default suffix of deployment config files
pub const DEFAULT_CONFIG_SUFFIX: &str = ".config";

/// Command line usage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Config file pattern: {pattern} doesn't end with {suffix}.")]
    BadSuffix { pattern: String, suffix: String },

    #[error("Invalid config file pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A validated config file pattern (wildcards allowed)
#[derive(Debug, Clone)]
pub struct ConfigPattern {
    pattern: String,
}

impl ConfigPattern {
    /// Validate `pattern`; its file name must end with `suffix` (any case)
    pub fn new(pattern: &str, suffix: &str) -> Result<Self, UsageError> {
        let file_name = Path::new(pattern)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !file_name.to_lowercase().ends_with(&suffix.to_lowercase()) {
            return Err(UsageError::BadSuffix {
                pattern: file_name,
                suffix: suffix.to_string(),
            });
        }

        glob::Pattern::new(pattern).map_err(|e| UsageError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    /// The pattern as given
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Matching files in sorted order
    pub fn matching_files(&self) -> Vec<PathBuf> {
        let entries = match glob::glob(&self.pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Invalid config file pattern {}: {}", self.pattern, e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Unreadable path while expanding {}: {}", self.pattern, e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        debug!("{} matched {} config files", self.pattern, files.len());
        files
    }
}
