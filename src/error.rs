//! Error taxonomy for a collection run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    /// The destination path is occupied by something that is not a directory.
    #[error("File exists with destination name: {}", path.display())]
    Configuration { path: PathBuf },

    /// The dependency-listing tool could not be run or reported failure.
    #[error("{tool} failed on {}: {message}", target.display())]
    Tool {
        tool: String,
        target: PathBuf,
        message: String,
    },

    #[error("Failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {} to {}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CollectError {
    /// Process exit status the CLI uses for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CollectError::Configuration { .. } => 1,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectError>;
