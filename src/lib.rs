//! Bundle the shared libraries an executable needs next to it.
//!
//! Runs `ldd` on the executable, optionally converts the reported paths with
//! `cygpath` (MSYS2/Cygwin), drops libraries under a system prefix and copies
//! the rest into a destination directory.

mod analyze;
mod collect;
mod copy;
mod error;
mod paths;

pub use analyze::{
    parse_listing_output, run_listing_tool, DependencyRecord, ListingLine, UNRESOLVED_MARKER,
};
pub use collect::{
    collect, prepare_destination, Action, CollectOptions, CollectReport, CopyErrorPolicy,
    DEFAULT_CONVERTER_TOOL, DEFAULT_LISTING_TOOL, DEFAULT_SYSTEM_PREFIX,
};
pub use copy::{copy_library, CopyOutcome};
pub use error::{CollectError, Result};
pub use paths::{canonicalize_lenient, is_system_path, same_file_target, PathConverter};
