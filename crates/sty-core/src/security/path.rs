//! Archive entry path resolution.

use crate::Result;
use crate::types::DestDir;
use crate::types::ResolvedPath;

/// Maps a raw archive entry path into the destination directory.
///
/// This function delegates to `ResolvedPath::resolve()`, which:
/// - Strips the archive's single top-level directory
/// - Collapses repeated separators and folds `.`/`..` lexically
/// - Rejects anything that would land outside the destination
///
/// `Ok(None)` means the entry is the archive root itself and needs no work.
/// The check is purely textual and runs before any filesystem access.
///
/// # Errors
///
/// - `InstallError::PathEscape` if the path climbs out of the destination
/// - `InstallError::InvalidArchive` if the path contains null bytes
///
/// # Examples
///
/// ```no_run
/// use sty_core::security::resolve_entry_path;
/// use sty_core::types::DestDir;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/home/dba/pigsty")?;
///
/// let resolved = resolve_entry_path(&dest, "pigsty//files/readme.txt")?;
/// assert_eq!(
///     resolved.map(|r| r.into_rel()),
///     Some(Path::new("files/readme.txt").to_path_buf())
/// );
///
/// assert!(resolve_entry_path(&dest, "pigsty/../../escape.txt").is_err());
/// # Ok(())
/// # }
/// ```
pub fn resolve_entry_path(dest: &DestDir, raw_path: &str) -> Result<Option<ResolvedPath>> {
    ResolvedPath::resolve(raw_path, dest)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::InstallError;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path()).expect("failed to create dest");
        (temp, dest)
    }

    #[test]
    fn test_resolve_nested() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_entry_path(&dest, "pigsty/roles/pgsql/tasks/main.yml")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.rel(), Path::new("roles/pgsql/tasks/main.yml"));
        assert!(resolved.abs().starts_with(dest.as_path()));
    }

    #[test]
    fn test_resolve_double_slash() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_entry_path(&dest, "pigsty//files/readme.txt")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.rel(), Path::new("files/readme.txt"));
        assert_eq!(resolved.abs(), dest.as_path().join("files").join("readme.txt"));
    }

    #[test]
    fn test_resolve_traversal() {
        let (_temp, dest) = create_test_dest();
        let result = resolve_entry_path(&dest, "pigsty/../../escape.txt");
        assert!(matches!(result, Err(InstallError::PathEscape { .. })));
    }

    #[test]
    fn test_resolve_root_entry() {
        let (_temp, dest) = create_test_dest();
        assert!(resolve_entry_path(&dest, "pigsty").unwrap().is_none());
    }

    #[test]
    fn test_resolve_does_not_touch_disk() {
        let (_temp, dest) = create_test_dest();
        resolve_entry_path(&dest, "pigsty/a/b/c/file.txt").unwrap();
        assert!(!dest.as_path().join("a").exists());
    }
}
