//! Extraction of packaged (`.tgz`) subcharts.
//!
//! A packaged chart is a gzip-compressed tarball whose single top-level
//! directory holds the chart:
//!
//! ```text
//! redis-17.3.7.tgz
//! └── redis/
//!     ├── Chart.yaml
//!     ├── values.yaml
//!     └── charts/
//!         └── common-2.1.2.tgz
//! ```
//!
//! Every archive is unpacked into its own scratch directory, which is removed
//! when the returned [`ExtractedArchive`] is dropped.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;
use tracing::{debug, trace};

/// Unpacks chart archives into scoped scratch directories.
#[derive(Debug, Clone, Default)]
pub struct ArchiveUnpacker {
    scratch_root: Option<PathBuf>,
}

/// A chart archive unpacked into a scratch directory.
///
/// The directory and everything in it are deleted when this value is dropped.
#[derive(Debug)]
pub struct ExtractedArchive {
    archive: PathBuf,
    dir: TempDir,
}

impl ArchiveUnpacker {
    /// Create an unpacker that places scratch directories under the system
    /// temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unpacker that places scratch directories under `root`.
    #[must_use]
    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: Some(root.into()),
        }
    }

    /// Extract `archive_path` into a fresh scratch directory.
    ///
    /// All entries are validated before anything is written: an entry (or a
    /// link target) that would land outside the scratch directory fails the
    /// whole extraction. Once unpacked, every symlink is resolved against the
    /// real filesystem, since links through other links can escape where the
    /// entry names alone do not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathTraversalDetected`] for escaping entries and
    /// [`Error::Io`] if the archive cannot be read or unpacked.
    pub fn extract(&self, archive_path: &Path) -> Result<ExtractedArchive> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("helmdeps-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::io(e, archive_path, "creating scratch directory"))?;

        // Canonical form so the containment check compares like with like
        // (e.g. /var vs /private/var on macOS).
        let dest = dir
            .path()
            .canonicalize()
            .map_err(|e| Error::io(e, dir.path(), "resolving scratch directory"))?;

        debug!(archive = %archive_path.display(), dest = %dest.display(), "Extracting chart archive");

        validate_entries(archive_path, &dest)?;

        let mut archive = open_archive(archive_path)?;
        archive
            .unpack(&dest)
            .map_err(|e| Error::io(e, archive_path, "unpacking chart archive"))?;
        verify_links(archive_path, &dest)?;

        Ok(ExtractedArchive {
            archive: archive_path.to_path_buf(),
            dir,
        })
    }
}

impl ExtractedArchive {
    /// The scratch directory holding the extracted contents.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The single top-level directory of the archive, which holds the chart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedArchiveLayout`] if the archive root holds no
    /// entries, several entries, or a single entry that is not a directory.
    pub fn chart_root(&self) -> Result<PathBuf> {
        let entries = fs::read_dir(self.path())
            .map_err(|e| Error::io(e, self.path(), "listing extracted archive"))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| Error::io(e, self.path(), "listing extracted archive"))?;

        match entries.as_slice() {
            [] => Err(Error::malformed_archive_layout(
                &self.archive,
                "archive is empty",
            )),
            [single] if single.is_dir() => Ok(single.clone()),
            [single] => Err(Error::malformed_archive_layout(
                &self.archive,
                format!(
                    "top-level entry '{}' is not a directory",
                    display_name(single)
                ),
            )),
            several => {
                let mut names: Vec<String> = several.iter().map(|p| display_name(p)).collect();
                names.sort();
                Err(Error::malformed_archive_layout(
                    &self.archive,
                    format!(
                        "expected a single top-level directory, found {} entries: {}",
                        names.len(),
                        names.join(", ")
                    ),
                ))
            }
        }
    }
}

fn open_archive(archive_path: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file =
        File::open(archive_path).map_err(|e| Error::io(e, archive_path, "opening chart archive"))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

/// Check every entry (and link target) of the archive against `dest`.
fn validate_entries(archive_path: &Path, dest: &Path) -> Result<()> {
    let mut archive = open_archive(archive_path)?;
    let entries = archive
        .entries()
        .map_err(|e| Error::io(e, archive_path, "reading chart archive"))?;

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(e, archive_path, "reading chart archive"))?;
        let entry_path = entry
            .path()
            .map_err(|e| Error::io(e, archive_path, "reading archive entry path"))?
            .into_owned();
        trace!(entry = %entry_path.display(), "Validating archive entry");

        let target = dest.join(&entry_path);
        if !is_within_directory(dest, &target) {
            return Err(Error::path_traversal(
                archive_path,
                entry_path.display().to_string(),
            ));
        }

        let entry_type = entry.header().entry_type();
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            let Some(link) = entry
                .link_name()
                .map_err(|e| Error::io(e, archive_path, "reading archive link target"))?
            else {
                continue;
            };
            // Symlinks resolve against the entry's parent, hard links against the archive root.
            let link_target = if entry_type.is_symlink() {
                target.parent().unwrap_or(dest).join(&link)
            } else {
                dest.join(&link)
            };
            if !is_within_directory(dest, &link_target) {
                return Err(Error::path_traversal(
                    archive_path,
                    format!("{} -> {}", entry_path.display(), link.display()),
                ));
            }
        }
    }

    Ok(())
}

/// Resolve every symlink under `dest` and fail if one points outside it.
fn verify_links(archive_path: &Path, dest: &Path) -> Result<()> {
    let mut pending = vec![dest.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).map_err(|e| Error::io(e, &dir, "listing extracted archive"))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(e, &dir, "listing extracted archive"))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| Error::io(e, &path, "inspecting extracted entry"))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_symlink() {
                let resolved = resolve_link(&path)
                    .map_err(|e| Error::io(e, &path, "resolving extracted symlink"))?;
                if !is_within_directory(dest, &resolved) {
                    let relative = path.strip_prefix(dest).unwrap_or(&path);
                    return Err(Error::path_traversal(
                        archive_path,
                        format!("{} -> {}", relative.display(), resolved.display()),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Where the symlink at `link` points, following every link on the way.
///
/// For a dangling link, the longest existing prefix of the target is resolved
/// and the missing remainder is appended as written.
fn resolve_link(link: &Path) -> std::io::Result<PathBuf> {
    let target = link
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf)
        .join(fs::read_link(link)?);
    let components: Vec<Component<'_>> = target.components().collect();

    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if let Ok(base) = prefix.canonicalize() {
            return Ok(components[split..].iter().fold(base, |acc, c| acc.join(c)));
        }
    }
    Ok(target)
}

/// Whether `target`, once `.` and `..` are resolved lexically, lies under `directory`.
///
/// Nothing is read from disk: the target usually does not exist yet.
#[must_use]
pub fn is_within_directory(directory: &Path, target: &Path) -> bool {
    normalize(target).starts_with(normalize(directory))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
