//! Recoverable conditions found while resolving a tree.

use std::fmt;
use std::path::PathBuf;

/// A recoverable problem encountered during resolution.
///
/// Warnings never abort resolution; the affected dependency is left in the
/// tree as an unresolved leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// A chart declares dependencies but has no subchart folder.
    MissingSubchartFolder {
        /// The chart declaring the dependencies.
        chart: String,
        /// Where the subchart folder was expected.
        path: PathBuf,
    },

    /// No directory or archive was found for a declared dependency.
    UnresolvedDependency {
        /// The chart declaring the dependency.
        chart: String,
        /// The dependency that could not be located.
        dependency: String,
    },

    /// A subchart was found whose name no dependency declares.
    UndeclaredSubchart {
        /// The chart whose subchart folder holds the entry.
        chart: String,
        /// The name found in the subchart's manifest.
        subchart: String,
        /// The directory or archive it was read from.
        path: PathBuf,
    },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSubchartFolder { chart, path } => write!(
                f,
                "Missing subchart folder at {} for the {chart} chart",
                path.display()
            ),
            Self::UnresolvedDependency { chart, dependency } => write!(
                f,
                "Unable to locate Chart.yaml for dependency {dependency} of the {chart} chart"
            ),
            Self::UndeclaredSubchart {
                chart,
                subchart,
                path,
            } => write!(
                f,
                "Subchart {subchart} at {} is not declared as a dependency of the {chart} chart",
                path.display()
            ),
        }
    }
}
