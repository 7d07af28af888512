//! Error types for chart resolution.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for chart resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a dependency-tree resolution.
///
/// Recoverable conditions (a missing `charts/` folder, a dependency that
/// could not be located) are not errors; they are reported as
/// [`ResolveWarning`](crate::ResolveWarning)s alongside the tree.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No manifest file exists in the chart directory.
    #[error("Chart.yaml could not be found at {}", path.display())]
    #[diagnostic(
        code(helmdeps::chart::missing_manifest),
        help("Ensure the path points to a chart directory containing a Chart.yaml file")
    )]
    MissingManifest {
        /// Path where the manifest was expected.
        path: PathBuf,
    },

    /// The manifest exists but is not a valid chart declaration.
    #[error("Failed to parse chart manifest at {}: {message}", path.display())]
    #[diagnostic(
        code(helmdeps::chart::malformed_manifest),
        help(
            "Chart.yaml must be valid YAML with string 'name' and 'version' fields; each dependency needs 'name', 'version' and 'repository'"
        )
    )]
    MalformedManifest {
        /// Path to the manifest.
        path: PathBuf,
        /// Parser or validation message.
        message: String,
    },

    /// An archive entry would be written outside the extraction directory.
    #[error("Attempted path traversal in archive {}: entry '{entry}' escapes the extraction directory", archive.display())]
    #[diagnostic(
        code(helmdeps::chart::path_traversal),
        help("The archive may have been crafted maliciously; inspect it before trusting its contents")
    )]
    PathTraversalDetected {
        /// The archive being extracted.
        archive: PathBuf,
        /// The offending entry path (or link target).
        entry: String,
    },

    /// The extracted archive does not hold exactly one top-level chart directory.
    #[error("Unexpected layout in chart archive {}: {message}", archive.display())]
    #[diagnostic(
        code(helmdeps::chart::malformed_archive_layout),
        help("Packaged charts must contain a single top-level directory holding Chart.yaml (as produced by 'helm package')")
    )]
    MalformedArchiveLayout {
        /// The archive that was extracted.
        archive: PathBuf,
        /// What was found instead.
        message: String,
    },

    /// A chart directory was reached again while it was still being resolved.
    #[error("Dependency cycle detected: chart '{name}' at {} is its own ancestor", path.display())]
    #[diagnostic(
        code(helmdeps::chart::cyclic_dependency),
        help("Check the charts/ folders for symbolic links pointing back at an enclosing chart")
    )]
    CyclicDependency {
        /// Name of the chart that was revisited.
        name: String,
        /// Canonical path of the revisited chart directory.
        path: PathBuf,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(helmdeps::chart::io_error),
        help("Check that the referenced paths exist and that you have permission to read them")
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
    /// Create a malformed manifest error.
    #[must_use]
    pub fn malformed_manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedManifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a path traversal error.
    #[must_use]
    pub fn path_traversal(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self::PathTraversalDetected {
            archive: archive.into(),
            entry: entry.into(),
        }
    }

    /// Create a malformed archive layout error.
    #[must_use]
    pub fn malformed_archive_layout(archive: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedArchiveLayout {
            archive: archive.into(),
            message: message.into(),
        }
    }

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

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}
