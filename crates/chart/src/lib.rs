//! Helm chart dependency-tree resolution.
//!
//! This crate answers "what does this chart depend on, transitively, and
//! under what condition?" by walking a chart directory:
//!
//! - [`ManifestReader`] reads a chart's `Chart.yaml`.
//! - [`ArchiveUnpacker`] unpacks vendored `.tgz` subcharts into scratch
//!   directories that are removed as soon as they are no longer needed.
//! - [`ChartResolver`] recurses through `charts/` folders and assembles a
//!   [`DependencyNode`] tree.
//! - [`to_document`] / [`to_json_string`] render the tree as JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use helmdeps_chart::ChartResolver;
//! use std::path::Path;
//!
//! let resolution = ChartResolver::new().resolve(Path::new("./my-chart"))?;
//! for warning in &resolution.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! println!("{}", helmdeps_chart::to_json_string(&resolution.tree)?);
//! ```
//!
//! # Conditions
//!
//! A dependency's `condition` (e.g. `redis.enabled`) is carried through as
//! opaque text for display. It is never evaluated against values files.

pub mod archive;
pub mod diagnostics;
pub mod error;
pub mod manifest;
pub mod resolver;
pub mod serialize;
pub mod tree;

pub use archive::{ArchiveUnpacker, ExtractedArchive};
pub use diagnostics::ResolveWarning;
pub use error::{Error, Result};
pub use manifest::{ChartManifest, DependencyRef, MANIFEST_FILE, ManifestReader};
pub use resolver::{
    ARCHIVE_EXTENSION, ChartResolver, Resolution, ResolverOptions, SUBCHART_DIR, resolve,
};
pub use serialize::{to_document, to_json_string};
pub use tree::DependencyNode;
