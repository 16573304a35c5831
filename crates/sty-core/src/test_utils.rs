//! Test utilities for building bundle tarballs.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use flate2::Compression;
use flate2::write::GzEncoder;

/// Builder for gzip-compressed tar bundles held in memory.
///
/// The regular `add_*` methods go through the tar crate's path handling,
/// which refuses `..` and absolute names. Hostile names are written with
/// [`TarballBuilder::add_raw_file`] or [`TarballBuilder::add_raw`], which
/// copy the bytes straight into the header.
///
/// # Examples
///
/// ```
/// use sty_core::test_utils::TarballBuilder;
///
/// let bundle = TarballBuilder::new()
///     .add_directory("pigsty/")
///     .add_file("pigsty/pigsty.yml", b"all:")
///     .add_symlink("pigsty/conf/default.yml", "meta.yml")
///     .add_raw_file("pigsty/../../escape.txt", b"x")
///     .build();
/// assert!(!bundle.is_empty());
/// ```
pub struct TarballBuilder {
    builder: tar::Builder<GzEncoder<Vec<u8>>>,
}

impl TarballBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default())),
        }
    }

    /// Adds a regular file with mode 0o644.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with a custom mode.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a directory with mode 0o755.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a symlink. The target is stored verbatim, `..` and absolute
    /// targets included.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_link(path, target, tar::EntryType::Symlink)
    }

    /// Adds a hard link.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.add_link(path, target, tar::EntryType::Link)
    }

    /// Adds a named pipe.
    #[must_use]
    pub fn add_fifo(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Fifo);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a pax global header carrying a single comment record.
    #[must_use]
    pub fn add_pax_global_header(mut self) -> Self {
        let record = b"18 comment=pigsty\n";
        let mut header = tar::Header::new_ustar();
        header.set_size(record.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::XGlobalHeader);
        header.set_cksum();
        self.builder
            .append_data(&mut header, "pax_global_header", &record[..])
            .unwrap();
        self
    }

    /// Adds a regular file whose name is copied into the header unchecked.
    #[must_use]
    pub fn add_raw_file(self, name: &str, data: &[u8]) -> Self {
        self.add_raw(name.as_bytes(), tar::EntryType::Regular, data)
    }

    /// Adds an entry whose name bytes are copied into the header unchecked.
    ///
    /// The name must fit the 100-byte header field.
    #[must_use]
    pub fn add_raw(mut self, name: &[u8], entry_type: tar::EntryType, data: &[u8]) -> Self {
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(entry_type);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    /// Finishes the archive and returns the gzip-compressed bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap().finish().unwrap()
    }

    fn add_link(mut self, path: &str, target: &str, entry_type: tar::EntryType) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o777);
        header.set_entry_type(entry_type);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }
}

impl Default for TarballBuilder {
    fn default() -> Self {
        Self::new()
    }
}
