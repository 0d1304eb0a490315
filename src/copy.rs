//! Library copying.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CollectError, Result};
use crate::paths::same_file_target;

/// Result of a single [`copy_library`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The library was written to this path.
    Copied(PathBuf),
    /// Source and destination are the same file; nothing was written.
    SameFile(PathBuf),
}

/// Copy `source` into `dest_dir` as `name`, overwriting any existing file.
///
/// Refuses to copy a file onto itself: if the destination already exists and
/// refers to the same underlying file, returns [`CopyOutcome::SameFile`]
/// instead of truncating it.
pub fn copy_library(source: &Path, dest_dir: &Path, name: &str) -> Result<CopyOutcome> {
    let dest = dest_dir.join(name);

    if is_same_file(source, &dest) {
        return Ok(CopyOutcome::SameFile(dest));
    }

    fs::copy(source, &dest).map_err(|e| CollectError::Copy {
        from: source.to_path_buf(),
        to: dest.clone(),
        source: e,
    })?;

    Ok(CopyOutcome::Copied(dest))
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        (_, Err(e)) if e.kind() == io::ErrorKind::NotFound => false,
        _ => same_file_target(a, b),
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match fs::metadata(b) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        _ => same_file_target(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_library_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("libA.so");
        fs::write(&src, b"new contents").unwrap();
        let dest_dir = temp.path().join("out");
        fs::create_dir(&dest_dir).unwrap();
        fs::write(dest_dir.join("libA.so"), b"stale").unwrap();

        let outcome = copy_library(&src, &dest_dir, "libA.so").unwrap();
        assert_eq!(outcome, CopyOutcome::Copied(dest_dir.join("libA.so")));
        assert_eq!(fs::read(dest_dir.join("libA.so")).unwrap(), b"new contents");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_library_hard_link_is_same_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("libA.so");
        fs::write(&src, b"contents").unwrap();
        let dest_dir = temp.path().join("out");
        fs::create_dir(&dest_dir).unwrap();
        fs::hard_link(&src, dest_dir.join("libA.so")).unwrap();

        let outcome = copy_library(&src, &dest_dir, "libA.so").unwrap();
        assert!(matches!(outcome, CopyOutcome::SameFile(_)));
        assert_eq!(fs::read(&src).unwrap(), b"contents");
    }

    #[test]
    fn test_copy_library_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = copy_library(&temp.path().join("nope.so"), temp.path(), "nope2.so").unwrap_err();
        assert!(matches!(err, CollectError::Copy { .. }));
    }
}
