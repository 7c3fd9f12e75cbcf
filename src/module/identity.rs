//! Module identity parsing
//!
//! A module is identified by a canonical string of the form
//! `Name, Version=1.2.3.4, Culture=neutral, PublicKeyToken=0123456789abcdef`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Empty module identity")]
    Empty,

    #[error("Module identity has no name: {0}")]
    MissingName(String),

    #[error("Module identity is missing the {field} field: {identity}")]
    MissingField {
        field: &'static str,
        identity: String,
    },

    #[error("Unexpected field {field:?} in module identity: {identity}")]
    UnexpectedField { field: String, identity: String },

    #[error("Invalid version {version:?} in module identity: {identity}")]
    InvalidVersion { version: String, identity: String },
}

/// Parsed module identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
    /// Short module name (no extension)
    pub name: String,
    /// Dotted numeric version, kept exactly as written
    pub version: String,
    /// Culture, may be empty or `neutral`
    pub culture: String,
    /// Public key token, may be empty or `null`
    pub public_key_token: String,
}

const VERSION_KEY: &str = "Version";
const CULTURE_KEY: &str = "Culture";
const TOKEN_KEY: &str = "PublicKeyToken";

impl ModuleIdentity {
    /// Create an identity from its parts
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        culture: impl Into<String>,
        public_key_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            culture: culture.into(),
            public_key_token: public_key_token.into(),
        }
    }

    /// Parse a canonical identity string
    pub fn parse(identity: &str) -> Result<Self, IdentityError> {
        let trimmed = identity.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }

        let mut parts = trimmed.split(',');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() || name.contains('=') {
            return Err(IdentityError::MissingName(identity.to_string()));
        }

        let mut version = None;
        let mut culture = None;
        let mut token = None;

        for part in parts {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                IdentityError::UnexpectedField {
                    field: part.trim().to_string(),
                    identity: identity.to_string(),
                }
            })?;

            let slot = match key.trim() {
                VERSION_KEY => &mut version,
                CULTURE_KEY => &mut culture,
                TOKEN_KEY => &mut token,
                other => {
                    return Err(IdentityError::UnexpectedField {
                        field: other.to_string(),
                        identity: identity.to_string(),
                    })
                }
            };

            if slot.is_some() {
                return Err(IdentityError::UnexpectedField {
                    field: key.trim().to_string(),
                    identity: identity.to_string(),
                });
            }
            *slot = Some(value.trim().to_string());
        }

        let missing = |field: &'static str| IdentityError::MissingField {
            field,
            identity: identity.to_string(),
        };
        let version = version.ok_or_else(|| missing(VERSION_KEY))?;
        let culture = culture.ok_or_else(|| missing(CULTURE_KEY))?;
        let public_key_token = token.ok_or_else(|| missing(TOKEN_KEY))?;

        if parse_version(&version).is_none() {
            return Err(IdentityError::InvalidVersion {
                version,
                identity: identity.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            version,
            culture,
            public_key_token,
        })
    }

    /// Canonical full identity string (the graph key)
    pub fn full_name(&self) -> String {
        self.to_string()
    }

    /// `name@version`, used in console output
    pub fn short_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Numeric version components
    pub fn version_components(&self) -> Vec<u32> {
        parse_version(&self.version).unwrap_or_default()
    }

    /// Compare two identities by version only
    pub fn cmp_version(&self, other: &Self) -> Ordering {
        self.version_components().cmp(&other.version_components())
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}={}, {}={}, {}={}",
            self.name,
            VERSION_KEY,
            self.version,
            CULTURE_KEY,
            self.culture,
            TOKEN_KEY,
            self.public_key_token
        )
    }
}

impl FromStr for ModuleIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Base name of a full identity string: everything before the first comma
pub fn base_name(full_identity: &str) -> &str {
    full_identity
        .split(',')
        .next()
        .unwrap_or(full_identity)
        .trim()
}

fn parse_version(version: &str) -> Option<Vec<u32>> {
    let components = version
        .split('.')
        .map(|c| {
            if c.is_empty() || !c.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                c.parse::<u32>().ok()
            }
        })
        .collect::<Option<Vec<u32>>>()?;

    if components.is_empty() || components.len() > 4 {
        return None;
    }
    Some(components)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_identity() {
        let id = ModuleIdentity::parse(
            "Newtonsoft.Json, Version=12.0.0.0, Culture=neutral, PublicKeyToken=30ad4fe6b2a6aeed",
        )
        .unwrap();

        assert_eq!(id.name, "Newtonsoft.Json");
        assert_eq!(id.version, "12.0.0.0");
        assert_eq!(id.culture, "neutral");
        assert_eq!(id.public_key_token, "30ad4fe6b2a6aeed");
        assert_eq!(id.short_name(), "Newtonsoft.Json@12.0.0.0");
    }

    #[test]
    fn test_display_matches_canonical_form() {
        let text = "Foo, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null";
        let id: ModuleIdentity = text.parse().unwrap();
        assert_eq!(id.full_name(), text);
    }

    #[test]
    fn test_empty_culture_is_allowed() {
        let id = ModuleIdentity::parse("Foo, Version=1.0, Culture=, PublicKeyToken=").unwrap();
        assert_eq!(id.culture, "");
        assert_eq!(id.public_key_token, "");
    }

    #[test]
    fn test_malformed_identities_fail() {
        assert_eq!(ModuleIdentity::parse("  "), Err(IdentityError::Empty));
        assert!(matches!(
            ModuleIdentity::parse("Foo"),
            Err(IdentityError::MissingField { field: "Version", .. })
        ));
        assert!(matches!(
            ModuleIdentity::parse(", Version=1.0, Culture=neutral, PublicKeyToken=null"),
            Err(IdentityError::MissingName(_))
        ));
        assert!(matches!(
            ModuleIdentity::parse("Foo, Version=1.x, Culture=neutral, PublicKeyToken=null"),
            Err(IdentityError::InvalidVersion { .. })
        ));
        assert!(matches!(
            ModuleIdentity::parse("Foo, Version=1.0, Colour=red, PublicKeyToken=null"),
            Err(IdentityError::UnexpectedField { .. })
        ));
        assert!(matches!(
            ModuleIdentity::parse(
                "Foo, Version=1.0, Version=2.0, Culture=neutral, PublicKeyToken=null"
            ),
            Err(IdentityError::UnexpectedField { .. })
        ));
    }

    #[test]
    fn test_version_ordering_is_numeric() {
        let a = ModuleIdentity::new("Foo", "1.10.0.0", "neutral", "null");
        let b = ModuleIdentity::new("Foo", "1.9.0.0", "neutral", "null");
        assert_eq!(a.cmp_version(&b), Ordering::Greater);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(
            base_name("Foo.Bar, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"),
            "Foo.Bar"
        );
        assert_eq!(base_name("Plain"), "Plain");
    }
}
