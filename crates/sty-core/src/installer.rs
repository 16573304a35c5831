//! Installation orchestration.

use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use tracing::info;
use tracing::warn;

use crate::InstallConfig;
use crate::InstallError;
use crate::InstallReport;
use crate::ProgressCallback;
use crate::Result;
use crate::extraction::Extractor;
use crate::types::DestDir;

/// Outcome of one installation.
///
/// The report is kept even when the installation fails, so the caller can
/// see which entries were written before the error.
#[derive(Debug)]
pub struct InstallResult {
    /// What was written and skipped.
    pub report: InstallReport,
    /// The error that stopped the installation, if any.
    pub error: Option<InstallError>,
}

impl InstallResult {
    /// Returns `true` if the installation ran to completion.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a plain `Result`, dropping the partial report on error.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the installation.
    pub fn into_result(self) -> Result<InstallReport> {
        match self.error {
            None => Ok(self.report),
            Some(e) => Err(e),
        }
    }
}

/// Installs bundles according to an [`InstallConfig`].
///
/// A target that is missing or empty is created and populated. A populated
/// target is refused unless `overwrite` is set, in which case everything is
/// written except protected files that already exist.
///
/// # Examples
///
/// ```no_run
/// use sty_core::InstallConfig;
/// use sty_core::Installer;
/// use sty_core::NoopProgress;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bundle = sty_core::load_archive("pigsty.tgz")?;
/// let installer = Installer::new(InstallConfig::default().with_overwrite(true));
/// let report = installer
///     .run(&bundle[..], Path::new(""), &mut NoopProgress)
///     .into_result()?;
/// println!("{} entries, {} preserved", report.total_items(), report.skipped.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Installer {
    config: InstallConfig,
}

impl Installer {
    /// Creates an installer with the given configuration.
    #[must_use]
    pub const fn new(config: InstallConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Installs the gzip-tar stream read from `archive` into `target`.
    ///
    /// An empty `target` means the configured default directory. The
    /// archive is never read when the target is refused.
    pub fn run<R: Read>(
        &self,
        archive: R,
        target: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> InstallResult {
        let start = Instant::now();
        let mut report = InstallReport::new(target);

        let error = self
            .install_into(archive, target, &mut report, progress)
            .err();
        report.duration = start.elapsed();

        if error.is_none() {
            info!(
                destination = %report.destination.display(),
                written = report.written.len(),
                skipped = report.skipped.len(),
                bytes = report.bytes_written,
                duration_ms = report.duration.as_millis(),
                "install complete"
            );
        }

        InstallResult { report, error }
    }

    fn install_into<R: Read>(
        &self,
        archive: R,
        target: &Path,
        report: &mut InstallReport,
        progress: &mut dyn ProgressCallback,
    ) -> Result<()> {
        let target = self.config.expand_target(target)?;
        report.destination.clone_from(&target);

        self.prepare_target(&target)?;
        let dest = DestDir::new(&target)?;
        report.destination = dest.as_path().to_path_buf();

        info!(
            destination = %dest.as_path().display(),
            overwrite = self.config.overwrite,
            "installing bundle"
        );

        Extractor::new(&dest, &self.config.protected).extract(archive, report, progress)
    }

    /// Creates a missing target, or decides whether an existing one may be
    /// written into.
    fn prepare_target(&self, target: &Path) -> Result<()> {
        match fs::metadata(target) {
            Ok(metadata) if !metadata.is_dir() => Err(InstallError::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("target is not a directory: {}", target.display()),
            ))),
            Ok(_) => {
                if is_empty_dir(target)? {
                    return Ok(());
                }
                if !self.config.overwrite {
                    return Err(InstallError::DestinationExists {
                        path: target.to_path_buf(),
                    });
                }
                warn!(destination = %target.display(), "overwriting existing installation");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(target).map_err(|e| {
                    InstallError::Io(io::Error::new(
                        e.kind(),
                        format!("failed to create {}: {e}", target.display()),
                    ))
                })
            }
            Err(e) => Err(InstallError::Io(io::Error::new(
                e.kind(),
                format!("failed to inspect {}: {e}", target.display()),
            ))),
        }
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| {
        InstallError::Io(io::Error::new(
            e.kind(),
            format!("failed to read {}: {e}", path.display()),
        ))
    })?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::NoopProgress;
    use crate::test_utils::TarballBuilder;
    use tempfile::TempDir;

    fn bundle() -> Vec<u8> {
        TarballBuilder::new()
            .add_directory("pigsty/")
            .add_file("pigsty/pigsty.yml", b"new")
            .add_file("pigsty/conf/meta.yml", b"meta")
            .build()
    }

    fn run(target: &Path, overwrite: bool, archive: &[u8]) -> InstallResult {
        Installer::new(InstallConfig::default().with_overwrite(overwrite)).run(
            archive,
            target,
            &mut NoopProgress,
        )
    }

    #[test]
    fn test_missing_target_created() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a/b/pigsty");

        let result = run(&target, false, &bundle());
        assert!(result.is_success(), "{:?}", result.error);
        assert_eq!(fs::read(target.join("pigsty.yml")).unwrap(), b"new");
        assert_eq!(result.report.files_written, 2);
    }

    #[test]
    fn test_empty_target_accepted_without_overwrite() {
        let temp = TempDir::new().unwrap();
        let result = run(temp.path(), false, &bundle());
        assert!(result.is_success());
    }

    #[test]
    fn test_populated_target_refused_without_overwrite() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pigsty.yml"), "original").unwrap();

        let result = run(temp.path(), false, &bundle());
        assert!(matches!(
            result.error,
            Some(InstallError::DestinationExists { .. })
        ));
        assert!(result.report.written.is_empty());
        assert!(!temp.path().join("conf").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("pigsty.yml")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_refusal_never_reads_archive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("keep"), "x").unwrap();

        // Garbage would fail decoding if it were read.
        let result = run(temp.path(), false, b"not a gzip stream");
        assert!(matches!(
            result.error,
            Some(InstallError::DestinationExists { .. })
        ));
    }

    #[test]
    fn test_overwrite_preserves_protected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pigsty.yml"), "original").unwrap();

        let result = run(temp.path(), true, &bundle());
        assert!(result.is_success());
        assert_eq!(
            fs::read_to_string(temp.path().join("pigsty.yml")).unwrap(),
            "original"
        );
        assert_eq!(
            fs::read(temp.path().join("conf/meta.yml")).unwrap(),
            b"meta"
        );
        assert_eq!(result.report.skipped, vec![std::path::PathBuf::from("pigsty.yml")]);
    }

    #[test]
    fn test_target_is_file_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("pigsty");
        fs::write(&file, "x").unwrap();

        let result = run(&file, true, &bundle());
        assert!(matches!(result.error, Some(InstallError::Io(_))));
    }

    #[test]
    fn test_partial_report_kept_on_failure() {
        let temp = TempDir::new().unwrap();
        let archive = TarballBuilder::new()
            .add_file("pigsty/ok.txt", b"ok")
            .add_raw_file("pigsty/../../escape.txt", b"x")
            .build();

        let result = run(temp.path(), false, &archive);
        assert!(!result.is_success());
        assert_eq!(result.report.written, vec![std::path::PathBuf::from("ok.txt")]);
        assert!(matches!(
            result.into_result(),
            Err(InstallError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_report_destination_is_canonical() {
        let temp = TempDir::new().unwrap();
        let result = run(temp.path(), false, &bundle());
        assert_eq!(
            result.report.destination,
            temp.path().canonicalize().unwrap()
        );
    }
}
