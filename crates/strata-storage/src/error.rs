//! Storage error types.

use std::io;
use std::path::{Path, PathBuf};

/// Errors from region-file and world-metadata access.
///
/// A missing chunk or world file is not an error; loaders report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A tagged field in `world.dat` declared a type this build cannot size.
    #[error("unknown field type tag {tag} for field {name:?}")]
    UnknownFieldType {
        /// The type byte read from disk.
        tag: u8,
        /// Name of the field carrying it.
        name: String,
    },

    /// A name or string value in `world.dat` was not valid UTF-8.
    #[error("invalid UTF-8 in field {name:?}")]
    InvalidString {
        /// Field name, or `"<name>"` when the name itself was unreadable.
        name: String,
    },

    /// A slot points outside its region file.
    #[error("slot {slot} in {} points past end of file (offset {offset}, length {length})", .path.display())]
    CorruptSlot {
        /// Region file path.
        path: PathBuf,
        /// Slot index.
        slot: usize,
        /// Recorded byte offset.
        offset: u32,
        /// Recorded byte length.
        length: u32,
    },

    /// A payload would start beyond the `u32` offset range of the slot table.
    #[error("region file {} too large: offset {offset} does not fit in u32", .path.display())]
    SlotOverflow {
        /// Region file path.
        path: PathBuf,
        /// Offset that did not fit.
        offset: u64,
    },

    /// A world or dimension name cannot be used as a directory name.
    #[error("invalid {kind} name {name:?}")]
    InvalidName {
        /// `"world"` or `"dimension"`.
        kind: &'static str,
        /// The rejected name.
        name: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for disk faults, false for format and naming problems.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
