//! High-level public API for bundle installation.

use std::fs;
use std::io;
use std::path::Path;

use crate::InstallConfig;
use crate::InstallError;
use crate::InstallReport;
use crate::Installer;
use crate::NoopProgress;
use crate::Result;
use crate::extraction::Extractor;
use crate::security::ProtectedPaths;
use crate::types::DestDir;

/// Installs a gzip-compressed bundle into `target_dir`.
///
/// This is the main entry point. An empty `target_dir` means `~/pigsty`.
/// A missing or empty target is created and populated; a populated target
/// is refused unless `overwrite` is set. With `overwrite`, protected files
/// that already exist (`pigsty.yml`, `files/pki/**`) are left untouched.
///
/// # Errors
///
/// Returns an error if:
/// - The target is populated and `overwrite` is false
/// - An entry would escape the target, directly or through a symlink
/// - The archive is corrupt or holds an unsupported entry kind
/// - I/O operations fail
///
/// Entries written before the error stay on disk.
///
/// # Examples
///
/// ```no_run
/// use sty_core::install;
/// use sty_core::load_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bundle = load_archive("/tmp/pigsty.tgz")?;
/// let report = install(&bundle, "/home/dba/pigsty", true)?;
/// println!("Installed {} entries", report.total_items());
/// # Ok(())
/// # }
/// ```
pub fn install<P: AsRef<Path>>(
    archive: &[u8],
    target_dir: P,
    overwrite: bool,
) -> Result<InstallReport> {
    Installer::new(InstallConfig::default().with_overwrite(overwrite))
        .run(archive, target_dir.as_ref(), &mut NoopProgress)
        .into_result()
}

/// Extracts a gzip-compressed bundle into an existing directory.
///
/// No existence or emptiness policy is applied; the default protected
/// paths are still honoured.
///
/// # Errors
///
/// Returns an error if `destination` is not an existing directory, or for
/// any extraction failure listed on [`install`].
pub fn extract_archive<P: AsRef<Path>>(archive: &[u8], destination: P) -> Result<InstallReport> {
    let dest = DestDir::new(destination.as_ref())?;
    let protected = ProtectedPaths::default();
    let mut report = InstallReport::new(dest.as_path());

    Extractor::new(&dest, &protected).extract(archive, &mut report, &mut NoopProgress)?;
    Ok(report)
}

/// Reads a bundle from a local file.
///
/// # Errors
///
/// Returns `InstallError::Io` naming the file if it cannot be read.
pub fn load_archive<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| {
        InstallError::Io(io::Error::new(
            e.kind(),
            format!("failed to read archive {}: {e}", path.display()),
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TarballBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_install_and_reinstall() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("pigsty");
        let bundle = TarballBuilder::new()
            .add_file("pigsty/pigsty.yml", b"all:")
            .build();

        install(&bundle, &target, false).unwrap();
        assert!(matches!(
            install(&bundle, &target, false),
            Err(InstallError::DestinationExists { .. })
        ));
        let report = install(&bundle, &target, true).unwrap();
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_extract_archive_requires_existing_dir() {
        let temp = TempDir::new().unwrap();
        let bundle = TarballBuilder::new().add_file("pigsty/a.txt", b"a").build();
        let result = extract_archive(&bundle, temp.path().join("missing"));
        assert!(matches!(result, Err(InstallError::Io(_))));

        let report = extract_archive(&bundle, temp.path()).unwrap();
        assert_eq!(report.files_written, 1);
    }

    #[test]
    fn test_load_archive_names_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("pigsty.tgz");
        let err = load_archive(&missing).unwrap_err();
        assert!(err.to_string().contains("pigsty.tgz"));

        std::fs::write(&missing, b"bytes").unwrap();
        assert_eq!(load_archive(&missing).unwrap(), b"bytes");
    }
}
