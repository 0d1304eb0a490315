//! Path conversion and comparison.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Availability of the path-conversion helper (cygpath), decided once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathConverter {
    Available { tool: String },
    Unavailable,
}

impl PathConverter {
    /// Probe for the helper by running `<tool> --help`.
    ///
    /// Failure to execute or a non-zero exit means the run proceeds without
    /// conversion. This is never an error.
    pub fn probe(tool: &str) -> Self {
        match Command::new(tool).arg("--help").output() {
            Ok(output) if output.status.success() => {
                tracing::debug!("Using {} for path conversion", tool);
                PathConverter::Available {
                    tool: tool.to_string(),
                }
            }
            Ok(output) => {
                tracing::info!(
                    "Couldn't execute {} (Reason: '{}'). Continuing without.",
                    tool,
                    output.status
                );
                PathConverter::Unavailable
            }
            Err(e) => {
                tracing::info!(
                    "Couldn't execute {} (Reason: '{}'). Continuing without.",
                    tool,
                    e
                );
                PathConverter::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PathConverter::Available { .. })
    }

    /// Convert a path reported by ldd into the native convention.
    ///
    /// Returns the path unmodified when the helper is unavailable, or when a
    /// single conversion fails.
    pub fn convert(&self, path: &str) -> String {
        let PathConverter::Available { tool } = self else {
            return path.to_string();
        };

        match Command::new(tool).args(["-w", path]).output() {
            Ok(output) if output.status.success() => {
                let converted = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if converted.is_empty() {
                    tracing::warn!("{} returned nothing for {}, using it as-is", tool, path);
                    path.to_string()
                } else {
                    converted
                }
            }
            Ok(output) => {
                tracing::warn!(
                    "{} failed to convert {} ({}), using it as-is",
                    tool,
                    path,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                path.to_string()
            }
            Err(e) => {
                tracing::warn!("{} failed to convert {} ({}), using it as-is", tool, path, e);
                path.to_string()
            }
        }
    }
}

/// Whether `path` lies under one of the system prefixes, ignoring case.
#[must_use]
pub fn is_system_path(path: &str, prefixes: &[String]) -> bool {
    let path = path.to_lowercase();
    prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .any(|prefix| path.starts_with(&prefix.to_lowercase()))
}

/// Canonicalize a path that may not exist yet.
///
/// Symlinks are resolved through the deepest existing ancestor; the remaining
/// components are appended unchanged.
pub fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(e);
            };
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok(canonicalize_lenient(parent)?.join(name))
        }
        Err(e) => Err(e),
    }
}

/// Case normalization matching the host filesystem.
fn normcase(path: PathBuf) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(path.to_string_lossy().to_lowercase())
    } else {
        path
    }
}

/// Whether `source` and `dest` name the same file once symlinks and case are
/// normalized. Paths that cannot be resolved compare unequal.
#[must_use]
pub fn same_file_target(source: &Path, dest: &Path) -> bool {
    match (canonicalize_lenient(source), canonicalize_lenient(dest)) {
        (Ok(a), Ok(b)) => normcase(a) == normcase(b),
        _ => false,
    }
}
