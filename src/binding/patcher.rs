//! Binding redirect patching
//!
//! Inserts or replaces one `dependentAssembly` entry per redirect under
//! `configuration/runtime/assemblyBinding`:
//!
//! ```xml
//! <configuration>
//!   <runtime>
//!     <assemblyBinding xmlns="urn:schemas-microsoft-com:asm.v1">
//!       <dependentAssembly>
//!         <assemblyIdentity name="Foo" publicKeyToken="abc" culture="neutral" />
//!         <bindingRedirect oldVersion="0.0.0.0-1.0.0.0" newVersion="2.0.0.0" />
//!       </dependentAssembly>
//!     </assemblyBinding>
//!   </runtime>
//! </configuration>
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::binding::discovery::ConfigPattern;
use crate::binding::document::{Document, Element, Node};
use crate::module::registry::BindingRedirect;
use crate::utils::result_to_option;

/// Namespace of the assembly binding elements
pub const ASSEMBLY_BINDING_NAMESPACE: &str = "urn:schemas-microsoft-com:asm.v1";

const CONFIGURATION: &str = "configuration";
const RUNTIME: &str = "runtime";
const ASSEMBLY_BINDING: &str = "assemblyBinding";
const DEPENDENT_ASSEMBLY: &str = "dependentAssembly";
const ASSEMBLY_IDENTITY: &str = "assemblyIdentity";
const BINDING_REDIRECT: &str = "bindingRedirect";

/// Patch errors
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid config file: root element is <{found}>, expected <configuration>")]
    NotAConfiguration { found: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Config document has no <{element}> element after insertion")]
    MissingElement { element: String },
}

/// What happened to the redirect entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// A new entry was appended
    Inserted,
    /// An existing entry for the same module was rebuilt
    Replaced,
}

/// Files touched by one [`ConfigPatcher::patch`] call
#[derive(Debug, Clone, Default)]
pub struct PatchSummary {
    /// Files patched successfully
    pub patched: Vec<PathBuf>,
    /// Files reported and skipped
    pub skipped: Vec<PathBuf>,
}

/// Writes binding redirects into config documents
#[derive(Debug, Clone)]
pub struct ConfigPatcher {
    namespace: String,
    dry_run: bool,
}

impl Default for ConfigPatcher {
    fn default() -> Self {
        Self::new(ASSEMBLY_BINDING_NAMESPACE)
    }
}

impl ConfigPatcher {
    /// Create a patcher using `namespace` for the binding elements
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            dry_run: false,
        }
    }

    /// Compute patches without writing files
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply `redirect` to every file matching `pattern`
    ///
    /// Files that cannot be patched are reported and skipped; the rest are
    /// still processed.
    pub fn patch(&self, redirect: &BindingRedirect, pattern: &ConfigPattern) -> PatchSummary {
        let mut summary = PatchSummary::default();

        for file in pattern.matching_files() {
            let outcome = result_to_option(
                self.patch_file(&file, redirect),
                &format!("Skipping {}", file.display()),
            );
            match outcome {
                Some(outcome) => {
                    info!("{:?} redirect for {} in {:?}", outcome, redirect.name, file);
                    summary.patched.push(file);
                }
                None => summary.skipped.push(file),
            }
        }

        summary
    }

    /// Apply `redirect` to one config file and save it in place
    pub fn patch_file(
        &self,
        path: &Path,
        redirect: &BindingRedirect,
    ) -> Result<PatchOutcome, PatchError> {
        let contents = std::fs::read(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document =
            Document::parse(contents.as_slice()).map_err(|e| PatchError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let outcome = self.patch_document(&mut document.root, redirect)?;

        if self.dry_run {
            debug!("Dry run, not writing {:?}", path);
            return Ok(outcome);
        }

        let mut buffer = Vec::new();
        document.write(&mut buffer).map_err(|e| PatchError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, buffer).map_err(|e| PatchError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(outcome)
    }

    /// Apply `redirect` to the root element of a parsed document
    pub fn patch_document(
        &self,
        root: &mut Element,
        redirect: &BindingRedirect,
    ) -> Result<PatchOutcome, PatchError> {
        if root.local_name() != CONFIGURATION {
            return Err(PatchError::NotAConfiguration {
                found: root.name.borrow().to_repr(),
            });
        }

        let ns = self.namespace.as_str();
        let runtime = child_or_insert(root, RUNTIME, None)?;
        let binding = child_or_insert(runtime, ASSEMBLY_BINDING, Some(ns))?;

        let mut identity = Element::new_in(binding, ASSEMBLY_IDENTITY, Some(ns));
        identity.set_attribute("name", redirect.name.as_str());
        identity.set_attribute("publicKeyToken", redirect.public_key_token.as_str());
        identity.set_attribute("culture", redirect.culture.as_str());

        let mut binding_redirect = Element::new_in(binding, BINDING_REDIRECT, Some(ns));
        binding_redirect.set_attribute("oldVersion", redirect.old_version_range());
        binding_redirect.set_attribute("newVersion", redirect.new_version.as_str());

        let mut entry = Element::new_in(binding, DEPENDENT_ASSEMBLY, Some(ns));
        entry.children.push(Node::Element(identity));
        entry.children.push(Node::Element(binding_redirect));

        let existing = binding.children.iter_mut().find_map(|node| {
            node.as_element_mut()
                .filter(|e| is_named(e, DEPENDENT_ASSEMBLY, Some(ns)))
                .filter(|e| identifies(e, &redirect.name, ns))
        });

        match existing {
            Some(current) => {
                *current = entry;
                Ok(PatchOutcome::Replaced)
            }
            None => {
                binding.children.push(Node::Element(entry));
                Ok(PatchOutcome::Inserted)
            }
        }
    }
}

fn is_named(element: &Element, name: &str, namespace: Option<&str>) -> bool {
    element.local_name() == name
        && match namespace {
            Some(ns) => element.namespace_uri() == Some(ns),
            None => true,
        }
}

/// Whether a `dependentAssembly` entry names module `name`
fn identifies(entry: &Element, name: &str, ns: &str) -> bool {
    entry
        .child_elements()
        .filter(|e| is_named(e, ASSEMBLY_IDENTITY, Some(ns)))
        .any(|e| e.attribute("name") == Some(name))
}

/// Matching child of `parent`, appended first when missing
fn child_or_insert<'a>(
    parent: &'a mut Element,
    name: &str,
    namespace: Option<&str>,
) -> Result<&'a mut Element, PatchError> {
    if !parent
        .child_elements()
        .any(|e| is_named(e, name, namespace))
    {
        let child = Element::new_in(parent, name, namespace);
        parent.children.push(Node::Element(child));
    }

    parent
        .children
        .iter_mut()
        .filter_map(Node::as_element_mut)
        .find(|e| is_named(e, name, namespace))
        .ok_or_else(|| PatchError::MissingElement {
            element: name.to_string(),
        })
}
