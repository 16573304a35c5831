//! Installation reporting.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Report of a bundle installation.
///
/// Paths are destination-relative, in archive order.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Directory the bundle was installed into.
    pub destination: PathBuf,

    /// Entries materialized on disk.
    pub written: Vec<PathBuf>,

    /// Protected files left untouched because they already existed.
    pub skipped: Vec<PathBuf>,

    /// Number of regular files written.
    pub files_written: usize,

    /// Number of directories created or confirmed.
    pub directories_created: usize,

    /// Number of symlinks created or confirmed.
    pub symlinks_created: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the installation.
    pub duration: Duration,
}

impl InstallReport {
    /// Creates an empty report for `destination`.
    #[must_use]
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    /// Returns total number of entries written.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.files_written + self.directories_created + self.symlinks_created
    }

    /// Returns whether any protected file was preserved.
    #[must_use]
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Callback trait for progress reporting during installation.
///
/// The total entry count of a streamed archive is unknown up front, so
/// `on_entry_start` only receives the running index.
///
/// # Examples
///
/// ```
/// use sty_core::ProgressCallback;
/// use std::path::Path;
///
/// struct PrintProgress;
///
/// impl ProgressCallback for PrintProgress {
///     fn on_entry_start(&mut self, path: &Path, current: usize) {
///         println!("[{current}] {}", path.display());
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _path: &Path) {}
///
///     fn on_complete(&mut self) {
///         println!("done");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called before an entry is processed.
    ///
    /// # Arguments
    ///
    /// * `path` - Entry path as stored in the archive
    /// * `current` - Entry number (1-indexed)
    fn on_entry_start(&mut self, path: &Path, current: usize);

    /// Called after file content has been written.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called when an entry has been written or skipped.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called once the whole archive has been installed.
    fn on_complete(&mut self);
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report() {
        let report = InstallReport::new("/opt/pigsty");
        assert_eq!(report.destination, PathBuf::from("/opt/pigsty"));
        assert_eq!(report.files_written, 0);
        assert_eq!(report.bytes_written, 0);
        assert!(report.written.is_empty());
        assert!(!report.has_skipped());
    }

    #[test]
    fn test_total_items() {
        let mut report = InstallReport::default();
        report.files_written = 10;
        report.directories_created = 5;
        report.symlinks_created = 2;
        assert_eq!(report.total_items(), 17);
    }

    #[test]
    fn test_has_skipped() {
        let mut report = InstallReport::default();
        report.skipped.push(PathBuf::from("pigsty.yml"));
        assert!(report.has_skipped());
    }

    #[test]
    fn test_noop_progress() {
        let mut progress = NoopProgress;
        progress.on_entry_start(Path::new("pigsty/pigsty.yml"), 1);
        progress.on_bytes_written(1024);
        progress.on_entry_complete(Path::new("pigsty/pigsty.yml"));
        progress.on_complete();
    }
}
