//! Type-safe wrappers for bundle installation.
//!
//! This module provides newtypes that enforce path validation at the type
//! level. The security-relevant types can only be obtained through their
//! validating constructors.
//!
//! # Design Principles
//!
//! - Type-driven security: an unvalidated path cannot be passed where a
//!   resolved one is expected
//! - No `From<RawType>` implementations for security types
//! - All constructors perform validation

pub mod dest_dir;
pub mod entry_kind;
pub mod resolved_path;
pub mod safe_symlink;

pub use dest_dir::DestDir;
pub use entry_kind::ArchiveEntry;
pub use entry_kind::EntryKind;
pub use resolved_path::ResolvedPath;
pub use safe_symlink::SafeSymlink;
