//! Dependency Fixup - binding redirects for transitively referenced modules
//!
//! A primary module references other modules, which reference others in
//! turn. When two modules ask for different versions of the same module, only
//! one version can be on disk. This crate finds those conflicts and writes
//! binding redirects into deployment config files so that every request for
//! an older version is satisfied by the version actually deployed.
//!
//! ## Pipeline
//!
//! 1. [`module::registry::DependencyGraphBuilder`] walks declared references
//!    from the primary module and records requested vs. on-disk identities.
//! 2. [`module::registry::RedirectResolver`] matches each requested identity
//!    missing from disk to the on-disk module with the same name.
//! 3. [`binding::ConfigPatcher`] inserts or replaces one redirect per module
//!    in every matching config file.

pub mod app;
pub mod binding;
pub mod config;
pub mod module;
pub mod report;
pub mod utils;

pub use config::*;
