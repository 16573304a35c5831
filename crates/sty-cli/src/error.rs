//! Error conversion utilities for CLI.
//!
//! Converts sty-core's typed errors (thiserror) into user-facing errors
//! (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use sty_core::InstallError;
use sty_core::SymlinkViolation;

/// Converts `InstallError` to a user-facing anyhow error with a HINT line.
pub fn convert_install_error(err: InstallError, archive: &Path) -> anyhow::Error {
    match err {
        InstallError::DestinationExists { path } => {
            anyhow!(
                "Directory already exists and is not empty: {}\n\
                 HINT: Re-run with -f to upgrade in place (pigsty.yml and files/pki are kept), \
                 or choose another directory with -p.",
                path.display()
            )
        }
        InstallError::PathEscape { path } => {
            anyhow!(
                "Security violation: Archive '{}' has an entry escaping the install directory: '{}'\n\
                 HINT: This archive may be malicious. Do not install from untrusted sources.",
                archive.display(),
                path
            )
        }
        InstallError::SymlinkViolation {
            path,
            violation: violation @ SymlinkViolation::AncestorEscape { .. },
        } => {
            anyhow!(
                "Symlink rejected while installing '{}': {}: {violation}\n\
                 HINT: A symlink in the install directory points outside it. \
                 Remove it or install into a clean directory.",
                archive.display(),
                path.display()
            )
        }
        InstallError::SymlinkViolation {
            path,
            violation: SymlinkViolation::ExistingSymlink,
        } => {
            anyhow!(
                "Symlink rejected while installing '{}': {} is already a symlink on disk\n\
                 HINT: Replace the symlink with a regular file, or install into a clean directory.",
                archive.display(),
                path.display()
            )
        }
        InstallError::SymlinkViolation { path, violation } => {
            anyhow!(
                "Security violation: Archive '{}' has an unsafe symlink {}: {violation}\n\
                 HINT: This archive may be malicious. Do not install from untrusted sources.",
                archive.display(),
                path.display()
            )
        }
        InstallError::UnsupportedEntry { path, kind } => {
            anyhow!(
                "Unsupported entry in '{}': {kind} '{path}'\n\
                 HINT: Bundles may only contain directories, regular files and symlinks.",
                archive.display()
            )
        }
        InstallError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {}\n\
                 HINT: The archive may be corrupted or is not a gzip-compressed tarball.",
                archive.display(),
                reason
            )
        }
        InstallError::Io(io_err) => {
            anyhow!(
                "I/O error while installing '{}': {}",
                archive.display(),
                io_err
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    fn message(err: InstallError) -> String {
        format!("{:?}", convert_install_error(err, Path::new("pigsty.tgz")))
    }

    #[test]
    fn test_convert_destination_exists() {
        let msg = message(InstallError::DestinationExists {
            path: PathBuf::from("/home/dba/pigsty"),
        });
        assert!(msg.contains("already exists"));
        assert!(msg.contains("/home/dba/pigsty"));
        assert!(msg.contains("HINT"));
        assert!(msg.contains("-f"));
    }

    #[test]
    fn test_convert_path_escape() {
        let msg = message(InstallError::PathEscape {
            path: "pigsty/../../escape.txt".into(),
        });
        assert!(msg.contains("Security violation"));
        assert!(msg.contains("pigsty/../../escape.txt"));
        assert!(msg.contains("pigsty.tgz"));
    }

    #[test]
    fn test_convert_symlink_violations() {
        let ancestor = message(InstallError::SymlinkViolation {
            path: PathBuf::from("link/escape.txt"),
            violation: SymlinkViolation::AncestorEscape {
                ancestor: PathBuf::from("/home/dba/pigsty/link"),
            },
        });
        assert!(ancestor.contains("points outside"));

        let existing = message(InstallError::SymlinkViolation {
            path: PathBuf::from("victim.txt"),
            violation: SymlinkViolation::ExistingSymlink,
        });
        assert!(existing.contains("already a symlink"));

        let target = message(InstallError::SymlinkViolation {
            path: PathBuf::from("templates/bad"),
            violation: SymlinkViolation::AbsoluteTarget {
                target: PathBuf::from("/etc/passwd"),
            },
        });
        assert!(target.contains("malicious"));
        assert!(target.contains("/etc/passwd"));
    }

    #[test]
    fn test_convert_io_error() {
        let msg = message(InstallError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        )));
        assert!(msg.contains("I/O error"));
    }
}
