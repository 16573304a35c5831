//! Streaming gzip-tar extraction loop.

use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::InstallError;
use crate::InstallReport;
use crate::ProgressCallback;
use crate::Result;
use crate::security::ProtectedPaths;
use crate::types::ArchiveEntry;
use crate::types::DestDir;

use super::writer::EntryWriter;
use super::writer::WriteOutcome;

/// Drives decompression and tar iteration for one destination.
///
/// Entries are handled one at a time, in archive order; nothing beyond the
/// current entry's header is buffered. The first error stops the loop and
/// is returned as is. Entries written before it stay on disk.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    writer: EntryWriter<'a>,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor writing into `dest`.
    #[must_use]
    pub const fn new(dest: &'a DestDir, protected: &'a ProtectedPaths) -> Self {
        Self {
            writer: EntryWriter::new(dest, protected),
        }
    }

    /// Extracts the gzip-compressed tar stream read from `reader`.
    ///
    /// Concatenated gzip members are read as one stream.
    ///
    /// # Errors
    ///
    /// - `InstallError::InvalidArchive` if the stream cannot be decoded or
    ///   an entry header is malformed
    /// - `InstallError::UnsupportedEntry` for hard links, devices, fifos and
    ///   other kinds that are not materialized
    /// - any error raised while writing an entry
    pub fn extract<R: Read>(
        &self,
        reader: R,
        report: &mut InstallReport,
        progress: &mut dyn ProgressCallback,
    ) -> Result<()> {
        let mut archive = tar::Archive::new(MultiGzDecoder::new(reader));
        let entries = archive.entries().map_err(archive_error)?;

        for (index, entry) in entries.enumerate() {
            let mut entry = entry.map_err(archive_error)?;
            let raw_path = entry_path(&entry)?;
            progress.on_entry_start(Path::new(&raw_path), index + 1);

            let Some(record) = read_record(&entry, raw_path)? else {
                continue;
            };

            let outcome = self.writer.write(&record, &mut entry, report)?;
            if outcome == WriteOutcome::Written && record.kind.is_file() {
                progress.on_bytes_written(record.size);
            }
            progress.on_entry_complete(Path::new(&record.raw_path));
        }

        progress.on_complete();
        Ok(())
    }
}

/// Classifies a tar entry. `Ok(None)` marks metadata the loop passes over.
fn read_record<R: Read>(entry: &tar::Entry<'_, R>, raw_path: String) -> Result<Option<ArchiveEntry>> {
    let header = entry.header();
    let entry_type = header.entry_type();

    let record = match entry_type {
        tar::EntryType::Directory => ArchiveEntry::directory(raw_path, header_mode(header)?),
        tar::EntryType::Regular | tar::EntryType::Continuous => {
            ArchiveEntry::file(raw_path, header_mode(header)?, entry.size())
        }
        tar::EntryType::Symlink => {
            let target = entry
                .link_name_bytes()
                .ok_or_else(|| {
                    InstallError::InvalidArchive(format!("symlink {raw_path} has no target"))
                })
                .and_then(|bytes| utf8(&bytes, "link target"))?;
            ArchiveEntry::symlink(raw_path, target)
        }
        tar::EntryType::XGlobalHeader => {
            debug!(path = %raw_path, "ignoring pax global header");
            return Ok(None);
        }
        other => {
            return Err(InstallError::UnsupportedEntry {
                path: raw_path,
                kind: entry_type_name(other),
            });
        }
    };

    Ok(Some(record))
}

fn entry_path<R: Read>(entry: &tar::Entry<'_, R>) -> Result<String> {
    utf8(&entry.path_bytes(), "entry path")
}

fn header_mode(header: &tar::Header) -> Result<u32> {
    header.mode().map_err(archive_error)
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| {
            InstallError::InvalidArchive(format!(
                "{what} is not valid UTF-8: {}",
                String::from_utf8_lossy(bytes)
            ))
        })
}

fn entry_type_name(entry_type: tar::EntryType) -> String {
    match entry_type {
        tar::EntryType::Link => "hard link".into(),
        tar::EntryType::Char => "character device".into(),
        tar::EntryType::Block => "block device".into(),
        tar::EntryType::Fifo => "fifo".into(),
        tar::EntryType::GNUSparse => "sparse file".into(),
        other => format!("type '{}'", char::from(other.as_byte()).escape_default()),
    }
}

fn archive_error(e: std::io::Error) -> InstallError {
    InstallError::InvalidArchive(format!("failed to read archive: {e}"))
}
