//! Error types for graph rendering.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for graph rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a graph.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The Graphviz binary could not be started.
    #[error("Failed to run Graphviz binary '{}': {source}", binary.display())]
    #[diagnostic(
        code(helmdeps::graph::graphviz_not_found),
        help("Install Graphviz (https://graphviz.org/download/) or point --dot-binary at the 'dot' executable; '--format dot' writes the graph source without Graphviz")
    )]
    GraphvizNotFound {
        /// The binary that was invoked.
        binary: PathBuf,
        /// The spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Graphviz ran but did not produce an image.
    #[error("Graphviz exited with {status}: {stderr}")]
    #[diagnostic(
        code(helmdeps::graph::render_failed),
        help("Re-run with '--format dot' and inspect the generated graph source")
    )]
    RenderFailed {
        /// Exit status reported by the process.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(helmdeps::graph::io_error),
        help("Check that the output directory exists and is writable")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },
}

impl Error {
    /// Create an I/O error annotated with the path and operation.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }
}
