//! Command-line arguments, error types and exit codes.

use crate::tracing::TracingFormat;
use clap::{Parser, ValueEnum};
use helmdeps_graph::ImageFormat;
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Resolution or rendering error exit code
pub const EXIT_RESOLVE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(helmdeps::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The chart tree could not be resolved (exit code 3)
    #[error("Resolution error: {message}")]
    #[diagnostic(code(helmdeps::cli::resolve))]
    Resolve {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The output could not be produced (exit code 3)
    #[error("Render error: {message}")]
    #[diagnostic(code(helmdeps::cli::render))]
    Render {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new render error
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            help: None,
        }
    }
}

fn help_of(err: &dyn Diagnostic) -> Option<String> {
    err.help().map(|h| h.to_string())
}

impl From<helmdeps_chart::Error> for CliError {
    fn from(err: helmdeps_chart::Error) -> Self {
        Self::Resolve {
            help: help_of(&err),
            message: err.to_string(),
        }
    }
}

impl From<helmdeps_graph::Error> for CliError {
    fn from(err: helmdeps_graph::Error) -> Self {
        Self::Render {
            help: help_of(&err),
            message: err.to_string(),
        }
    }
}

/// Map an error to the process exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Resolve { .. } | CliError::Render { .. } => EXIT_RESOLVE,
    }
}

/// Render an error to stderr as a miette report.
#[allow(clippy::print_stderr)]
pub fn render_error(err: &CliError) {
    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// What to write.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, ValueEnum)]
pub enum OutputType {
    /// Nested clusters mirroring the dependency tree
    #[default]
    Graph,
    /// One node per distinct chart version
    CombinedGraph,
    /// The dependency tree as JSON
    Json,
}

/// Image format for graph outputs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, ValueEnum)]
pub enum Format {
    /// PNG image (requires Graphviz)
    #[default]
    Png,
    /// SVG image (requires Graphviz)
    Svg,
    /// Graphviz DOT source
    Dot,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Png => Self::Png,
            Format::Svg => Self::Svg,
            Format::Dot => Self::Dot,
        }
    }
}

/// Build a graph or JSON output of all dependencies for a given Helm chart.
#[derive(Parser, Debug)]
#[command(name = "helmdeps", version, about)]
pub struct Cli {
    /// Directory containing the chart's Chart.yaml
    pub chart_dir: PathBuf,

    /// Directory the output file is written to
    #[arg(long, env = "HELMDEPS_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Type of output
    #[arg(long, value_enum, default_value_t = OutputType::Graph)]
    pub output_type: OutputType,

    /// Image format for graph outputs
    #[arg(long, value_enum, default_value_t = Format::Png)]
    pub format: Format,

    /// Graphviz `dot` executable
    #[arg(long, env = "HELMDEPS_DOT", default_value = helmdeps_graph::DEFAULT_DOT_BINARY)]
    pub dot_binary: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,
}

/// Parse command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
