//! Archive entry kinds and entry metadata.

use std::path::PathBuf;

/// Kind of entry the installer knows how to materialize.
///
/// Every other tar entry kind is rejected before it reaches this type.
///
/// # Examples
///
/// ```
/// use sty_core::types::EntryKind;
/// use std::path::PathBuf;
///
/// let file = EntryKind::File;
/// let directory = EntryKind::Directory;
/// let symlink = EntryKind::Symlink {
///     target: PathBuf::from("../roles/pgsql/templates/olap.yml"),
/// };
/// assert!(symlink.is_symlink());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file entry.
    File,

    /// Directory entry.
    Directory,

    /// Symbolic link entry.
    ///
    /// The `target` is the literal link text from the archive. It has NOT
    /// been validated and must be checked before use.
    Symlink {
        /// The symlink target path (not yet validated).
        target: PathBuf,
    },
}

impl EntryKind {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` if this is a symlink.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink { .. })
    }
}

/// One record read from the tar stream.
///
/// Entries are read once, in archive order. The body of a regular file is
/// not held here; it is streamed from the tar reader by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry kind.
    pub kind: EntryKind,

    /// Path exactly as stored in the archive, including the root segment.
    pub raw_path: String,

    /// POSIX permission bits from the header.
    pub mode: u32,

    /// Body size in bytes; only meaningful for regular files.
    pub size: u64,
}

impl ArchiveEntry {
    /// Creates a directory entry.
    #[must_use]
    pub fn directory(raw_path: impl Into<String>, mode: u32) -> Self {
        Self {
            kind: EntryKind::Directory,
            raw_path: raw_path.into(),
            mode,
            size: 0,
        }
    }

    /// Creates a regular file entry.
    #[must_use]
    pub fn file(raw_path: impl Into<String>, mode: u32, size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            raw_path: raw_path.into(),
            mode,
            size,
        }
    }

    /// Creates a symlink entry.
    #[must_use]
    pub fn symlink(raw_path: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            kind: EntryKind::Symlink {
                target: target.into(),
            },
            raw_path: raw_path.into(),
            mode: 0o777,
            size: 0,
        }
    }
}
