//! The `helmdeps` command-line tool.
//!
//! Resolves a Helm chart's dependency tree with [`helmdeps_chart`] and writes it
//! as a clustered graph, a flat graph or JSON.

pub mod cli;
pub mod output;
pub mod tracing;

use crate::cli::{Cli, CliError};
use crate::output::{OutputWriter, validate_output_dir};
use helmdeps_chart::ChartResolver;
use helmdeps_graph::Renderer;
use std::path::PathBuf;

/// Resolve the chart named on the command line and write the requested output.
///
/// Returns the path of the written file. Recoverable resolution problems are
/// reported as warnings through `tracing` and do not fail the run.
///
/// # Errors
///
/// [`CliError::Config`] for a bad output directory, [`CliError::Resolve`] when
/// the chart tree cannot be resolved, [`CliError::Render`] when the output
/// cannot be produced.
pub fn run(cli: &Cli) -> Result<PathBuf, CliError> {
    validate_output_dir(&cli.output_dir)?;

    let resolution = ChartResolver::new().resolve(&cli.chart_dir)?;
    ::tracing::debug!(
        chart = %resolution.tree.label(),
        nodes = resolution.tree.node_count(),
        warnings = resolution.warnings.len(),
        "Resolved dependency tree"
    );

    OutputWriter::new(
        &cli.output_dir,
        cli.output_type,
        cli.format.into(),
        Renderer::new(&cli.dot_binary),
    )
    .write(&resolution.tree)
}
