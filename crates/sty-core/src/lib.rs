//! Secure installer for gzip-compressed configuration bundles.
//!
//! `sty-core` unpacks an untrusted `.tgz` bundle into an installation
//! directory. The archive's single top-level directory is stripped, and
//! every entry is checked against path traversal and symlink pivots before
//! anything is written. Re-installing over an existing directory leaves
//! protected operator files (`pigsty.yml`, `files/pki/**`) untouched.
//!
//! # Examples
//!
//! ```no_run
//! use sty_core::install;
//! use sty_core::load_archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = load_archive("pigsty.tgz")?;
//! let report = install(&bundle, "/home/dba/pigsty", false)?;
//! println!("Installed {} files", report.files_written);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod installer;
pub mod report;
pub mod security;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::extract_archive;
pub use api::install;
pub use api::load_archive;
pub use config::InstallConfig;
pub use error::InstallError;
pub use error::Result;
pub use error::SymlinkViolation;
pub use extraction::Extractor;
pub use installer::InstallResult;
pub use installer::Installer;
pub use report::InstallReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;

// Re-export types module for easier access
pub use types::ArchiveEntry;
pub use types::DestDir;
pub use types::EntryKind;
pub use types::ResolvedPath;
pub use types::SafeSymlink;
