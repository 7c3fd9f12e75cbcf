//! End-to-end run: scan the primary module, resolve redirects, report, patch.

use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::binding::{ConfigPatcher, ConfigPattern};
use crate::config::FixupConfig;
use crate::module::registry::{
    DependencyGraphBuilder, ManifestMetadataProvider, RedirectResolver, ResolutionRecord,
};
use crate::module::traits::MetadataProvider;
use crate::report;

/// Per-run switches from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Also print every chain that requested each redirected module
    pub show_hierarchy: bool,
    /// Report only, leave config files untouched
    pub dry_run: bool,
}

/// What a run did
#[derive(Debug, Default)]
pub struct RunReport {
    /// Resolution records in report order
    pub records: Vec<ResolutionRecord>,
    /// Config files written (one entry per record and file)
    pub patched: Vec<PathBuf>,
    /// Config files reported and skipped
    pub skipped_files: Vec<PathBuf>,
    /// Records skipped because nothing matched on disk
    pub unmatched: usize,
}

/// Run with the filesystem manifest provider
pub fn run<W: Write>(
    primary_module: &Path,
    pattern: &ConfigPattern,
    options: &RunOptions,
    config: &FixupConfig,
    out: &mut W,
) -> anyhow::Result<RunReport> {
    let provider = ManifestMetadataProvider::new(config.resolution.strict_identities);
    run_with_provider(provider, primary_module, pattern, options, config, out)
}

/// Run with any metadata provider
pub fn run_with_provider<P: MetadataProvider, W: Write>(
    provider: P,
    primary_module: &Path,
    pattern: &ConfigPattern,
    options: &RunOptions,
    config: &FixupConfig,
    out: &mut W,
) -> anyhow::Result<RunReport> {
    let base_dir = primary_module
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut builder = DependencyGraphBuilder::new(provider, base_dir)
        .with_binary_extension(config.resolution.binary_extension.clone())
        .with_strict_identities(config.resolution.strict_identities);
    builder
        .build(primary_module)
        .with_context(|| format!("Failed to scan {}", primary_module.display()))?;
    let graph = builder.into_graph();

    let records = RedirectResolver::resolve(&graph);
    let patcher = ConfigPatcher::new(config.binding.namespace.clone()).dry_run(options.dry_run);
    let mut run_report = RunReport::default();

    report::write_header(out)?;
    for record in &records {
        report::write_record(out, &graph, record)?;
        if options.show_hierarchy {
            report::write_hierarchy(out, &graph, record)?;
        }

        let Some(redirect) = record.redirect() else {
            warn!(
                "Skipping {}: no module with that name was found on disk",
                record.requested.short_name()
            );
            run_report.unmatched += 1;
            continue;
        };

        let summary = patcher.patch(&redirect, pattern);
        run_report.patched.extend(summary.patched);
        run_report.skipped_files.extend(summary.skipped);
    }
    out.flush()?;

    info!(
        "{} redirects, {} file updates, {} skipped files, {} unmatched",
        records.len(),
        run_report.patched.len(),
        run_report.skipped_files.len(),
        run_report.unmatched
    );
    run_report.records = records;
    Ok(run_report)
}
