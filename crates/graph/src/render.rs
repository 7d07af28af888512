//! Rendering graph documents to files through Graphviz.

use crate::GraphDocument;
use crate::error::{Error, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Default Graphviz layout binary.
pub const DEFAULT_DOT_BINARY: &str = "dot";

/// Output format of a rendered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG image via `dot -Tpng`.
    #[default]
    Png,
    /// SVG image via `dot -Tsvg`.
    Svg,
    /// The DOT source itself; Graphviz is not invoked.
    Dot,
}

impl ImageFormat {
    /// File extension, also used as the Graphviz `-T` argument.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Dot => "dot",
        }
    }
}

/// Writes graph documents to disk, shelling out to Graphviz for images.
#[derive(Debug, Clone)]
pub struct Renderer {
    binary: PathBuf,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_DOT_BINARY)
    }
}

impl Renderer {
    /// Use `binary` as the Graphviz `dot` executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Render `document` in `format` to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphvizNotFound`] if the binary cannot be started,
    /// [`Error::RenderFailed`] if it exits unsuccessfully, and [`Error::Io`]
    /// if the output cannot be written.
    pub fn render(
        &self,
        document: &impl GraphDocument,
        format: ImageFormat,
        output: &Path,
    ) -> Result<()> {
        let source = document.to_dot();
        if format == ImageFormat::Dot {
            debug!(path = %output.display(), "Writing DOT source");
            return std::fs::write(output, source)
                .map_err(|e| Error::io(e, output, "write graph source"));
        }

        debug!(
            binary = %self.binary.display(),
            format = format.extension(),
            path = %output.display(),
            "Invoking Graphviz"
        );
        let mut child = Command::new(&self.binary)
            .arg(format!("-T{}", format.extension()))
            .arg("-o")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::GraphvizNotFound {
                binary: self.binary.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A process that exits early closes the pipe; its exit status tells the story.
            match stdin.write_all(source.as_bytes()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(Error::io(e, &self.binary, "write graph to Graphviz")),
            }
        }

        let result = child
            .wait_with_output()
            .map_err(|e| Error::io(e, &self.binary, "wait for Graphviz"))?;
        if !result.status.success() {
            return Err(Error::RenderFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
