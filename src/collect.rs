//! The dependency collector: enumerate, filter and copy.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::analyze::{parse_listing_output, run_listing_tool, DependencyRecord, ListingLine};
use crate::copy::{copy_library, CopyOutcome};
use crate::error::{CollectError, Result};
use crate::paths::{is_system_path, same_file_target, PathConverter};

pub const DEFAULT_LISTING_TOOL: &str = "ldd";
pub const DEFAULT_CONVERTER_TOOL: &str = "cygpath";
pub const DEFAULT_SYSTEM_PREFIX: &str = "C:\\Windows";

/// What to do when copying a library fails for a reason other than
/// source and destination being the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyErrorPolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log the failure and continue with the next library.
    Skip,
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub listing_tool: String,
    pub converter_tool: String,
    pub system_prefixes: Vec<String>,
    pub on_copy_error: CopyErrorPolicy,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            listing_tool: DEFAULT_LISTING_TOOL.to_string(),
            converter_tool: DEFAULT_CONVERTER_TOOL.to_string(),
            system_prefixes: vec![DEFAULT_SYSTEM_PREFIX.to_string()],
            on_copy_error: CopyErrorPolicy::default(),
        }
    }
}

/// Decision taken for one line of listing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Copied { name: String, from: PathBuf },
    SkippedSystem { name: String, path: String },
    SkippedSelf { name: String },
    SkippedUnresolved { name: String },
    SkippedMalformed { line: String },
    CopyFailed { name: String, reason: String },
}

/// Everything a run decided, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Whether resolved paths went through the conversion helper.
    pub converted_paths: bool,
    pub actions: Vec<Action>,
}

impl CollectReport {
    /// Names of the libraries written into the destination.
    pub fn copied(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Copied { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::CopyFailed { .. }))
            .count()
    }
}

/// Make sure `dest` is a directory, creating it (one level) if absent.
pub fn prepare_destination(dest: &Path) -> Result<()> {
    match fs::metadata(dest) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CollectError::Configuration {
            path: dest.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Creating {}", dest.display());
            fs::create_dir(dest).map_err(|e| CollectError::Io {
                action: "create directory",
                path: dest.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(CollectError::Io {
            action: "inspect",
            path: dest.to_path_buf(),
            source: e,
        }),
    }
}

/// Copy every non-system library `executable` depends on into `dest`.
///
/// # Errors
///
/// - [`CollectError::Configuration`] if `dest` exists and is not a directory
/// - [`CollectError::Io`] if `dest` cannot be created
/// - [`CollectError::Tool`] if the listing tool cannot be run or fails
/// - [`CollectError::Copy`] on a copy failure under [`CopyErrorPolicy::Abort`]
pub fn collect(executable: &Path, dest: &Path, options: &CollectOptions) -> Result<CollectReport> {
    prepare_destination(dest)?;

    let converter = PathConverter::probe(&options.converter_tool);
    let listing = run_listing_tool(&options.listing_tool, executable)?;

    let mut report = CollectReport {
        converted_paths: converter.is_available(),
        ..CollectReport::default()
    };
    for line in parse_listing_output(&listing) {
        let action = match line {
            ListingLine::Resolved(record) => process_record(record, dest, &converter, options)?,
            ListingLine::Unresolved { name } => {
                tracing::info!("Unknown DLL {}, skipping", name);
                Action::SkippedUnresolved { name }
            }
            ListingLine::Malformed { line } => {
                tracing::warn!("Unrecognized {} output line: {}", options.listing_tool, line);
                Action::SkippedMalformed { line }
            }
        };
        report.actions.push(action);
    }

    Ok(report)
}

fn process_record(
    record: DependencyRecord,
    dest: &Path,
    converter: &PathConverter,
    options: &CollectOptions,
) -> Result<Action> {
    let DependencyRecord {
        name,
        resolved_path,
        ..
    } = record;
    let path = converter.convert(&resolved_path);

    if is_system_path(&path, &options.system_prefixes) {
        tracing::info!("Skipping system DLL {}", path);
        return Ok(Action::SkippedSystem { name, path });
    }

    let source = PathBuf::from(&path);
    if same_file_target(&source, &dest.join(&name)) {
        tracing::info!("DLL {} is already next to executable. Skipping copy.", name);
        return Ok(Action::SkippedSelf { name });
    }

    tracing::info!("Copying {}...", name);
    match copy_library(&source, dest, &name) {
        Ok(CopyOutcome::Copied(_)) => Ok(Action::Copied { name, from: source }),
        Ok(CopyOutcome::SameFile(_)) => {
            tracing::info!("DLL {} is already next to executable. Skipping copy.", name);
            Ok(Action::SkippedSelf { name })
        }
        Err(e) => match options.on_copy_error {
            CopyErrorPolicy::Abort => Err(e),
            CopyErrorPolicy::Skip => {
                let reason = match std::error::Error::source(&e) {
                    Some(cause) => format!("{e}: {cause}"),
                    None => e.to_string(),
                };
                tracing::error!("{}", reason);
                Ok(Action::CopyFailed { name, reason })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_destination_creates_dir() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("bundle");
        prepare_destination(&dest).unwrap();
        assert!(dest.is_dir());
        // existing directory is fine
        prepare_destination(&dest).unwrap();
    }

    #[test]
    fn test_prepare_destination_rejects_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("bundle");
        fs::write(&dest, b"not a dir").unwrap();
        let err = prepare_destination(&dest).unwrap_err();
        assert!(matches!(err, CollectError::Configuration { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_prepare_destination_single_level() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing/bundle");
        let err = prepare_destination(&dest).unwrap_err();
        assert!(matches!(err, CollectError::Io { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_prepare_destination_uninspectable_path() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"regular file").unwrap();
        let err = prepare_destination(&blocker.join("bundle")).unwrap_err();
        assert!(matches!(err, CollectError::Io { action: "inspect", .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_system_record_is_skipped_without_copy() {
        let temp = TempDir::new().unwrap();
        let options = CollectOptions {
            system_prefixes: vec!["/usr/lib".to_string()],
            ..CollectOptions::default()
        };
        let record = DependencyRecord {
            name: "libc.so".to_string(),
            resolved_path: "/USR/LIB/libc.so".to_string(),
            load_address: "(0x0)".to_string(),
        };
        let action =
            process_record(record, temp.path(), &PathConverter::Unavailable, &options).unwrap();
        assert!(matches!(action, Action::SkippedSystem { .. }));
        assert!(!temp.path().join("libc.so").exists());
    }

    #[test]
    fn test_copy_failure_policy() {
        let temp = TempDir::new().unwrap();
        let record = DependencyRecord {
            name: "libgone.so".to_string(),
            resolved_path: temp.path().join("gone/libgone.so").display().to_string(),
            load_address: "(0x0)".to_string(),
        };
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();

        let abort = CollectOptions::default();
        let err = process_record(record.clone(), &dest, &PathConverter::Unavailable, &abort)
            .unwrap_err();
        assert!(matches!(err, CollectError::Copy { .. }));

        let skip = CollectOptions {
            on_copy_error: CopyErrorPolicy::Skip,
            ..CollectOptions::default()
        };
        let action = process_record(record, &dest, &PathConverter::Unavailable, &skip).unwrap();
        assert!(matches!(action, Action::CopyFailed { .. }));
    }
}
