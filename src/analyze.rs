//! Dependency enumeration using ldd.

use std::path::Path;
use std::process::Command;

use crate::error::{CollectError, Result};

/// Marker ldd prints in place of a library name it could not resolve.
pub const UNRESOLVED_MARKER: &str = "???";

/// One resolved library as reported by the listing tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub name: String,
    pub resolved_path: String,
    /// Informational only.
    pub load_address: String,
}

/// Classification of a single non-blank line of listing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine {
    Resolved(DependencyRecord),
    Unresolved { name: String },
    Malformed { line: String },
}

/// Run the listing tool against `executable` and return its stdout.
///
/// # Errors
///
/// Returns [`CollectError::Tool`] if:
/// - The executable does not exist
/// - The tool cannot be spawned (not installed, not on `PATH`)
/// - The tool exits non-zero
#[must_use = "listing output should be parsed"]
pub fn run_listing_tool(tool: &str, executable: &Path) -> Result<String> {
    let tool_error = |message: String| CollectError::Tool {
        tool: tool.to_string(),
        target: executable.to_path_buf(),
        message,
    };

    // Check file exists first for a clear error message
    if !executable.exists() {
        return Err(tool_error("file does not exist".to_string()));
    }

    let output = Command::new(tool)
        .arg(executable)
        .output()
        .map_err(|e| tool_error(format!("could not execute {tool}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(tool_error(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse ldd output into one [`ListingLine`] per non-blank line.
///
/// Example ldd output:
/// ```text
///         linux-vdso.so.1 (0x00007ffd4b3f2000)
///         libtinfo.so.6 => /lib/x86_64-linux-gnu/libtinfo.so.6 (0x00007f1c2a000000)
///         libmissing.so.1 => not found
///         ??? => ??? (0x6fff0000)
/// ```
pub fn parse_listing_output(output: &str) -> Vec<ListingLine> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_listing_line)
        .collect()
}

fn parse_listing_line(line: &str) -> ListingLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if let Some(name) = tokens.first() {
        if name.starts_with(UNRESOLVED_MARKER) {
            return ListingLine::Unresolved {
                name: name.to_string(),
            };
        }
    }

    match tokens.as_slice() {
        [name, "=>", "not", "found", ..] => ListingLine::Unresolved {
            name: name.to_string(),
        },
        [name, _, path, addr, ..] => ListingLine::Resolved(DependencyRecord {
            name: name.to_string(),
            resolved_path: path.to_string(),
            load_address: addr.to_string(),
        }),
        _ => ListingLine::Malformed {
            line: line.to_string(),
        },
    }
}
