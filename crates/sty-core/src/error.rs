//! Error types for bundle installation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `InstallError`.
pub type Result<T> = std::result::Result<T, InstallError>;

/// The symlink rule that an archive entry or the destination tree violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymlinkViolation {
    /// An existing ancestor directory is a symlink resolving outside the
    /// destination.
    AncestorEscape {
        /// The ancestor component that is a symlink.
        ancestor: PathBuf,
    },
    /// A symlink entry's relative target resolves outside the destination.
    TargetEscape {
        /// The link target as stored in the archive.
        target: PathBuf,
    },
    /// A symlink entry carries an absolute target.
    AbsoluteTarget {
        /// The link target as stored in the archive.
        target: PathBuf,
    },
    /// The path to be written is already a symlink on disk.
    ExistingSymlink,
}

impl std::fmt::Display for SymlinkViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AncestorEscape { ancestor } => write!(
                f,
                "ancestor {} is a symlink resolving outside the destination",
                ancestor.display()
            ),
            Self::TargetEscape { target } => write!(
                f,
                "link target {} resolves outside the destination",
                target.display()
            ),
            Self::AbsoluteTarget { target } => {
                write!(f, "absolute link target {} is not allowed", target.display())
            }
            Self::ExistingSymlink => write!(f, "refusing to write through an existing symlink"),
        }
    }
}

/// Errors that can occur while installing a bundle.
#[derive(Error, Debug)]
pub enum InstallError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The gzip or tar stream is corrupted or malformed.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// The target directory exists, is not empty, and overwrite is off.
    #[error("directory already exists: {} (use -f to overwrite)", path.display())]
    DestinationExists {
        /// The target directory.
        path: PathBuf,
    },

    /// An archive entry path would land outside the destination.
    #[error("archive entry escapes destination: {path}")]
    PathEscape {
        /// The entry path as stored in the archive.
        path: String,
    },

    /// A symlink, on disk or in the archive, would redirect outside the
    /// destination.
    #[error("symlink violation at {}: {violation}", path.display())]
    SymlinkViolation {
        /// Destination-relative path of the offending entry.
        path: PathBuf,
        /// The rule that was violated.
        violation: SymlinkViolation,
    },

    /// The archive holds an entry kind the installer does not materialize.
    #[error("unsupported entry type {kind}: {path}")]
    UnsupportedEntry {
        /// The entry path as stored in the archive.
        path: String,
        /// Human-readable entry kind (hard link, fifo, ...).
        kind: String,
    },
}

impl InstallError {
    /// Returns `true` if this error was raised by a safety check rather than
    /// by the environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use sty_core::InstallError;
    ///
    /// let err = InstallError::PathEscape {
    ///     path: "pigsty/../../etc/passwd".into(),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = InstallError::InvalidArchive("bad header".into());
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathEscape { .. } | Self::SymlinkViolation { .. } | Self::UnsupportedEntry { .. }
        )
    }

    /// Returns `true` if the caller can fix the failure by changing its
    /// request (a different target or the overwrite flag).
    ///
    /// Everything else indicates a hostile or corrupt archive, or an
    /// environment problem that needs outside remediation.
    ///
    /// # Examples
    ///
    /// ```
    /// use sty_core::InstallError;
    /// use std::path::PathBuf;
    ///
    /// let err = InstallError::DestinationExists {
    ///     path: PathBuf::from("/home/dba/pigsty"),
    /// };
    /// assert!(err.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DestinationExists { .. })
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::PathEscape { path } | Self::UnsupportedEntry { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the symlink rule that was violated, if applicable.
    #[must_use]
    pub const fn symlink_violation(&self) -> Option<&SymlinkViolation> {
        match self {
            Self::SymlinkViolation { violation, .. } => Some(violation),
            _ => None,
        }
    }
}
