//! Materializes single archive entries on disk.
//!
//! Every entry passes the same gate before anything touches the filesystem:
//! lexical resolution, then the ancestor symlink walk. Kind-specific checks
//! follow, then the write itself.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::InstallError;
use crate::InstallReport;
use crate::Result;
use crate::error::SymlinkViolation;
use crate::security::ProtectedPaths;
use crate::security::check_ancestors;
use crate::security::check_existing_target;
use crate::security::resolve_entry_path;
use crate::security::sanitize_mode;
use crate::security::validate_link_target;
use crate::types::ArchiveEntry;
use crate::types::DestDir;
use crate::types::EntryKind;
use crate::types::ResolvedPath;
use crate::types::SafeSymlink;

/// Buffer size for file content writes.
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// What happened to one archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was created, overwritten or confirmed on disk.
    Written,
    /// A protected file already existed and was left alone.
    Skipped,
    /// The entry was the archive root and maps to the destination itself.
    Root,
}

/// Writes archive entries into one destination.
#[derive(Debug, Clone, Copy)]
pub struct EntryWriter<'a> {
    dest: &'a DestDir,
    protected: &'a ProtectedPaths,
}

impl<'a> EntryWriter<'a> {
    /// Creates a writer for `dest` honouring the `protected` table.
    #[must_use]
    pub const fn new(dest: &'a DestDir, protected: &'a ProtectedPaths) -> Self {
        Self { dest, protected }
    }

    /// Materializes `entry`, reading file content from `reader`.
    ///
    /// `reader` is only consumed for regular files, and then for exactly
    /// `entry.size` bytes. The outcome is also recorded in `report`.
    ///
    /// # Errors
    ///
    /// - `InstallError::PathEscape` if the entry path leaves the destination
    /// - `InstallError::SymlinkViolation` for any symlink rule violation
    /// - `InstallError::InvalidArchive` for a truncated body or a type
    ///   conflict with an existing directory
    /// - `InstallError::Io` if the filesystem operation fails
    pub fn write<R: Read>(
        &self,
        entry: &ArchiveEntry,
        reader: &mut R,
        report: &mut InstallReport,
    ) -> Result<WriteOutcome> {
        let Some(path) = resolve_entry_path(self.dest, &entry.raw_path)? else {
            return Ok(WriteOutcome::Root);
        };

        check_ancestors(self.dest, &path)?;

        let outcome = match &entry.kind {
            EntryKind::Directory => {
                self.write_directory(&path, sanitize_mode(entry.mode))?;
                report.directories_created += 1;
                WriteOutcome::Written
            }
            EntryKind::File => {
                if self.keeps_existing(&path)? {
                    debug!(path = %path.rel().display(), "preserving protected file");
                    report.skipped.push(path.into_rel());
                    return Ok(WriteOutcome::Skipped);
                }
                let written = write_file(&path, sanitize_mode(entry.mode), entry.size, reader)?;
                report.files_written += 1;
                report.bytes_written = report.bytes_written.saturating_add(written);
                WriteOutcome::Written
            }
            EntryKind::Symlink { target } => {
                let symlink = validate_link_target(self.dest, &path, target)?;
                write_symlink(&symlink)?;
                report.symlinks_created += 1;
                WriteOutcome::Written
            }
        };

        debug!(path = %path.rel().display(), kind = kind_name(&entry.kind), "wrote entry");
        report.written.push(path.into_rel());
        Ok(outcome)
    }

    /// Returns `true` if a protected regular file already sits at `path`.
    ///
    /// Both the archive's name for the file and the location the write
    /// would really reach are checked against the table.
    fn keeps_existing(&self, path: &ResolvedPath) -> Result<bool> {
        let location = path.on_disk(self.dest)?;
        if !self.protected.is_protected(path.rel()) && !self.protected.guards(self.dest, &location)
        {
            return Ok(false);
        }
        match fs::symlink_metadata(&location) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("inspect", path.abs(), &e)),
        }
    }

    fn write_directory(&self, path: &ResolvedPath, mode: u32) -> Result<()> {
        match fs::symlink_metadata(path.abs()) {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(metadata) if metadata.file_type().is_symlink() => {
                // Children will be written through this link.
                let stays_inside = path
                    .abs()
                    .canonicalize()
                    .is_ok_and(|resolved| resolved.is_dir() && self.dest.contains(&resolved));
                if stays_inside {
                    return Ok(());
                }
                return Err(InstallError::SymlinkViolation {
                    path: path.rel().to_path_buf(),
                    violation: SymlinkViolation::AncestorEscape {
                        ancestor: path.abs().to_path_buf(),
                    },
                });
            }
            Ok(_) => return Err(type_conflict(path, "directory", "file")),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error("inspect", path.abs(), &e)),
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder
            .create(path.abs())
            .map_err(|e| io_error("create directory", path.abs(), &e))
    }
}

fn write_file<R: Read>(path: &ResolvedPath, mode: u32, size: u64, reader: &mut R) -> Result<u64> {
    check_existing_target(path)?;
    match fs::symlink_metadata(path.abs()) {
        Ok(metadata) if metadata.is_dir() => {
            return Err(type_conflict(path, "file", "directory"));
        }
        // Replaced, not truncated: an earlier install may have left it read-only.
        Ok(_) => fs::remove_file(path.abs()).map_err(|e| io_error("replace", path.abs(), &e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error("inspect", path.abs(), &e)),
    }
    create_parent(path)?;

    let file = open_for_write(path, mode)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let copied = io::copy(&mut reader.take(size), &mut writer)
        .map_err(|e| io_error("write", path.abs(), &e))?;
    writer
        .flush()
        .map_err(|e| io_error("write", path.abs(), &e))?;

    if copied != size {
        return Err(InstallError::InvalidArchive(format!(
            "entry {} is truncated: expected {size} bytes, got {copied}",
            path.rel().display()
        )));
    }

    Ok(copied)
}

#[cfg(unix)]
fn open_for_write(path: &ResolvedPath, mode: u32) -> Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::fs::PermissionsExt;

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path.abs())
        .map_err(|e| {
            // A symlink swapped in after the existing-target check.
            if e.raw_os_error() == Some(libc::ELOOP) {
                InstallError::SymlinkViolation {
                    path: path.rel().to_path_buf(),
                    violation: SymlinkViolation::ExistingSymlink,
                }
            } else {
                io_error("open", path.abs(), &e)
            }
        })?;

    // The create mode only applies to new files.
    file.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| io_error("set permissions on", path.abs(), &e))?;

    Ok(file)
}

#[cfg(not(unix))]
fn open_for_write(path: &ResolvedPath, _mode: u32) -> Result<File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path.abs())
        .map_err(|e| io_error("open", path.abs(), &e))
}

fn write_symlink(symlink: &SafeSymlink) -> Result<()> {
    let path = symlink.link();

    match fs::symlink_metadata(path.abs()) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            let current =
                fs::read_link(path.abs()).map_err(|e| io_error("read link", path.abs(), &e))?;
            if current == symlink.target_path() {
                return Ok(());
            }
            return Err(InstallError::SymlinkViolation {
                path: path.rel().to_path_buf(),
                violation: SymlinkViolation::ExistingSymlink,
            });
        }
        Ok(metadata) if metadata.is_dir() => {
            return Err(type_conflict(path, "symlink", "directory"));
        }
        Ok(_) => {
            fs::remove_file(path.abs()).map_err(|e| io_error("replace", path.abs(), &e))?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error("inspect", path.abs(), &e)),
    }

    create_parent(path)?;
    create_symlink(symlink)
}

#[cfg(unix)]
fn create_symlink(symlink: &SafeSymlink) -> Result<()> {
    let link = symlink.link().abs();
    std::os::unix::fs::symlink(symlink.target_path(), link)
        .map_err(|e| io_error("create symlink", link, &e))
}

#[cfg(not(unix))]
fn create_symlink(symlink: &SafeSymlink) -> Result<()> {
    Err(InstallError::UnsupportedEntry {
        path: symlink.link().rel().display().to_string(),
        kind: "symlink (not supported on this platform)".into(),
    })
}

fn create_parent(path: &ResolvedPath) -> Result<()> {
    match path.abs().parent() {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| io_error("create directory", parent, &e))
        }
        None => Ok(()),
    }
}

fn type_conflict(path: &ResolvedPath, entry: &str, existing: &str) -> InstallError {
    InstallError::InvalidArchive(format!(
        "cannot replace existing {existing} {} with a {entry}",
        path.rel().display()
    ))
}

/// Re-wraps an I/O error with the path it concerns, keeping its kind.
fn io_error(action: &str, path: &Path, e: &io::Error) -> InstallError {
    InstallError::Io(io::Error::new(
        e.kind(),
        format!("failed to {action} {}: {e}", path.display()),
    ))
}

const fn kind_name(kind: &EntryKind) -> &'static str {
    match kind {
        EntryKind::File => "file",
        EntryKind::Directory => "directory",
        EntryKind::Symlink { .. } => "symlink",
    }
}
