//! Recursive dependency-tree resolution.
//!
//! Starting from a chart directory, the resolver reads `Chart.yaml`, then
//! looks in the chart's `charts/` folder for each declared dependency, either
//! as an unpacked subchart directory or as a packaged `.tgz` archive, and
//! recurses into whatever it finds.
//!
//! Fatal problems (unreadable or malformed manifests, hostile or malformed
//! archives, cycles) abort the whole resolution. Missing subchart folders and
//! dependencies that cannot be located are reported as [`ResolveWarning`]s and
//! leave the affected dependency unresolved.

use crate::archive::ArchiveUnpacker;
use crate::diagnostics::ResolveWarning;
use crate::error::{Error, Result};
use crate::manifest::{MANIFEST_FILE, ManifestReader};
use crate::tree::DependencyNode;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Conventional name of the folder holding a chart's dependencies.
pub const SUBCHART_DIR: &str = "charts";

/// Extension of packaged subcharts.
pub const ARCHIVE_EXTENSION: &str = "tgz";

/// Layout conventions used while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Manifest file name inside each chart directory.
    pub manifest_file: String,
    /// Folder, relative to a chart directory, holding its dependencies.
    pub subchart_dir: String,
    /// Extension (without the dot) identifying packaged subcharts.
    pub archive_extension: String,
    /// Where to create scratch directories for archive extraction.
    /// `None` uses the system temporary directory.
    pub scratch_root: Option<PathBuf>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            manifest_file: MANIFEST_FILE.to_string(),
            subchart_dir: SUBCHART_DIR.to_string(),
            archive_extension: ARCHIVE_EXTENSION.to_string(),
            scratch_root: None,
        }
    }
}

/// A resolved tree together with the recoverable problems met on the way.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved tree, rooted at the requested chart.
    pub tree: DependencyNode,
    /// Recoverable problems, in the order they were found.
    pub warnings: Vec<ResolveWarning>,
}

/// Charts currently being resolved, innermost first.
struct Ancestry<'a> {
    name: &'a str,
    path: &'a Path,
    parent: Option<&'a Ancestry<'a>>,
}

impl Ancestry<'_> {
    fn contains(&self, name: &str, path: &Path) -> bool {
        let mut current = Some(self);
        while let Some(ancestor) = current {
            if ancestor.name == name && ancestor.path == path {
                return true;
            }
            current = ancestor.parent;
        }
        false
    }
}

/// Resolves chart dependency trees.
#[derive(Debug, Clone, Default)]
pub struct ChartResolver {
    options: ResolverOptions,
    reader: ManifestReader,
    unpacker: ArchiveUnpacker,
}

impl ChartResolver {
    /// Create a resolver using the standard Helm layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with custom layout options.
    #[must_use]
    pub fn with_options(options: ResolverOptions) -> Self {
        let reader = ManifestReader::new(options.manifest_file.clone());
        let unpacker = match &options.scratch_root {
            Some(root) => ArchiveUnpacker::with_scratch_root(root),
            None => ArchiveUnpacker::new(),
        };
        Self {
            options,
            reader,
            unpacker,
        }
    }

    /// Resolve the full dependency tree of the chart at `chart_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if any manifest in the tree is missing or malformed,
    /// if an archive is hostile or does not hold a single chart directory, if
    /// a chart is reached again through its own subchart folder, or on I/O
    /// failure. No partial tree is returned.
    pub fn resolve(&self, chart_dir: &Path) -> Result<Resolution> {
        self.resolve_chart(chart_dir, None)
    }

    fn resolve_chart(&self, chart_dir: &Path, parent: Option<&Ancestry<'_>>) -> Result<Resolution> {
        let manifest = self.reader.read(chart_dir)?;
        let mut node = DependencyNode::root(&manifest);
        let mut warnings = Vec::new();

        if manifest.dependencies.is_empty() {
            return Ok(Resolution { tree: node, warnings });
        }

        let subchart_dir = chart_dir.join(&self.options.subchart_dir);
        if !subchart_dir.is_dir() {
            report(
                &mut warnings,
                ResolveWarning::MissingSubchartFolder {
                    chart: manifest.name.clone(),
                    path: subchart_dir,
                },
            );
            return Ok(Resolution { tree: node, warnings });
        }

        let canonical = chart_dir
            .canonicalize()
            .map_err(|e| Error::io(e, chart_dir, "resolving chart directory"))?;
        if parent.is_some_and(|p| p.contains(&manifest.name, &canonical)) {
            return Err(Error::CyclicDependency {
                name: manifest.name,
                path: canonical,
            });
        }
        let here = Ancestry {
            name: &manifest.name,
            path: &canonical,
            parent,
        };

        for entry in list_entries(&subchart_dir)? {
            let Some(sub) = self.resolve_entry(&entry, &node, &here)? else {
                continue;
            };
            warnings.extend(sub.warnings);

            let discovered = sub.tree;
            match node.children.get_mut(&discovered.name) {
                Some(slot) => {
                    if slot.resolved {
                        debug!(
                            chart = %manifest.name,
                            dependency = %discovered.name,
                            path = %entry.display(),
                            "Dependency found more than once; keeping the last one"
                        );
                    }
                    slot.children = discovered.children;
                    slot.resolved = true;
                }
                None => report(
                    &mut warnings,
                    ResolveWarning::UndeclaredSubchart {
                        chart: manifest.name.clone(),
                        subchart: discovered.name,
                        path: entry,
                    },
                ),
            }
        }

        for dependency in node.children.values().filter(|child| !child.resolved) {
            report(
                &mut warnings,
                ResolveWarning::UnresolvedDependency {
                    chart: manifest.name.clone(),
                    dependency: dependency.name.clone(),
                },
            );
        }

        Ok(Resolution { tree: node, warnings })
    }

    /// Resolve one entry of a subchart folder, or `None` if it is not a subchart.
    fn resolve_entry(
        &self,
        entry: &Path,
        node: &DependencyNode,
        here: &Ancestry<'_>,
    ) -> Result<Option<Resolution>> {
        let file_name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if entry.is_dir() {
            if !node.children.contains_key(&file_name) {
                trace!(path = %entry.display(), "Skipping undeclared subchart directory");
                return Ok(None);
            }
            return self.resolve_chart(entry, Some(here)).map(Some);
        }

        if entry.is_file() && self.is_archive(entry) {
            let extracted = self.unpacker.extract(entry)?;
            let chart_root = extracted.chart_root()?;
            let sub = self.resolve_chart(&chart_root, Some(here));
            // Release the scratch directory before moving on to the next entry.
            drop(extracted);
            return sub.map(Some);
        }

        trace!(path = %entry.display(), "Skipping non-chart entry");
        Ok(None)
    }

    fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.options.archive_extension)
    }
}

/// Resolve the chart at `chart_dir` with the standard Helm layout.
///
/// # Errors
///
/// See [`ChartResolver::resolve`].
pub fn resolve(chart_dir: &Path) -> Result<Resolution> {
    ChartResolver::new().resolve(chart_dir)
}

fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::io(e, dir, "listing subcharts"))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(e, dir, "listing subcharts"))?;
    entries.sort();
    Ok(entries)
}

fn report(warnings: &mut Vec<ResolveWarning>, warning: ResolveWarning) {
    warn!("{warning}");
    warnings.push(warning);
}
