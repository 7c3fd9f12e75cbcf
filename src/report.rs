//! Console report of resolved redirects

use std::io::{self, Write};

use crate::module::registry::{DependencyGraph, ResolutionRecord};

/// Shown instead of a target when nothing matched on disk
pub const NOT_FOUND: &str = "<not found>";

/// Report header
pub fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "References")
}

/// One record: what was requested, where it is redirected, who asked
pub fn write_record<W: Write>(
    out: &mut W,
    graph: &DependencyGraph,
    record: &ResolutionRecord,
) -> io::Result<()> {
    let requested: Vec<String> = record
        .requested_versions
        .iter()
        .map(|identity| identity.short_name())
        .collect();
    let target = record
        .matched
        .as_ref()
        .map(|identity| identity.short_name())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    writeln!(
        out,
        "Transitive Dependency Requested:\t{}",
        requested.join(", ")
    )?;
    writeln!(out, "Redirecting to:\t\t\t{}", target)?;
    writeln!(out, "Used By:")?;
    for parent in &record.parents {
        writeln!(out, "   {}", graph.node(*parent).identity.short_name())?;
    }
    writeln!(out)?;
    writeln!(out)
}

/// Every chain from the primary module down to each requested node
///
/// Chains are printed root first, one extra space of indent per level.
pub fn write_hierarchy<W: Write>(
    out: &mut W,
    graph: &DependencyGraph,
    record: &ResolutionRecord,
) -> io::Result<()> {
    writeln!(out, "Requested Through:")?;
    for node in &record.nodes {
        for path in graph.paths_to_roots(*node) {
            for (depth, id) in path.iter().rev().enumerate() {
                writeln!(
                    out,
                    "{:indent$}{}",
                    "",
                    graph.node(*id).identity.short_name(),
                    indent = depth + 1
                )?;
            }
        }
    }
    writeln!(out)
}
