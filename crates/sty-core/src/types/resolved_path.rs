//! Root-stripped, lexically validated entry path.

use crate::InstallError;
use crate::Result;
use crate::error::SymlinkViolation;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;

/// Symlinks followed while resolving one path before giving up.
const MAX_LINK_HOPS: usize = 40;

/// An archive entry path mapped into the destination directory.
///
/// `ResolvedPath` holds two views of the same location:
/// - `rel`: the destination-relative path, with the archive's top-level
///   directory stripped and `.`/`..` segments folded away
/// - `abs`: `dest` joined with `rel`
///
/// # Security Properties
///
/// - Can ONLY be constructed through [`ResolvedPath::resolve`]
/// - `rel` is never absolute and never starts with `..`
/// - `abs` is always a strict descendant of the destination
/// - Resolution is purely textual; nothing on disk is consulted, which is
///   why symlink checks run separately before any write
///
/// # Examples
///
/// ```no_run
/// use sty_core::types::DestDir;
/// use sty_core::types::ResolvedPath;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/home/dba/pigsty")?;
///
/// let resolved = ResolvedPath::resolve("pigsty//files/readme.txt", &dest)?
///     .expect("not the root entry");
/// assert_eq!(resolved.rel(), Path::new("files/readme.txt"));
///
/// // The archive root itself maps to nothing.
/// assert!(ResolvedPath::resolve("pigsty/", &dest)?.is_none());
///
/// // Traversal is rejected before any filesystem access.
/// assert!(ResolvedPath::resolve("pigsty/../../escape.txt", &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    rel: PathBuf,
    abs: PathBuf,
}

impl ResolvedPath {
    /// Strips the archive root segment from `raw_path` and maps the rest
    /// into `dest`.
    ///
    /// Returns `Ok(None)` when nothing remains after stripping and
    /// normalization (the root directory entry itself, `root/.` and the
    /// like): the destination already exists, so there is nothing to do.
    ///
    /// # Resolution Steps
    ///
    /// 1. Reject null bytes
    /// 2. Treat `\` as `/` and drop leading `/`
    /// 3. Split on the first `/` and discard the root segment
    /// 4. Fold empty and `.` segments; let `..` pop the previous segment
    /// 5. Reject when `..` would climb above the destination
    /// 6. Join onto `dest` and confirm the result is a strict descendant
    ///
    /// # Errors
    ///
    /// - `InstallError::PathEscape` if the path would leave the destination
    /// - `InstallError::InvalidArchive` if the path contains null bytes
    pub fn resolve(raw_path: &str, dest: &DestDir) -> Result<Option<Self>> {
        if raw_path.contains('\0') {
            return Err(InstallError::InvalidArchive(format!(
                "entry path contains null bytes: {}",
                raw_path.escape_debug()
            )));
        }

        let normalized = raw_path.replace('\\', "/");
        let trimmed = normalized.trim_start_matches('/');
        let Some((_root, remainder)) = trimmed.split_once('/') else {
            return Ok(None);
        };

        let mut segments: Vec<&str> = Vec::new();
        for segment in remainder.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(escape(raw_path));
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Ok(None);
        }

        let rel: PathBuf = segments.iter().collect();

        // A segment can still parse as a root or prefix on some platforms
        // (drive letters on Windows).
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(escape(raw_path));
        }

        let abs = dest.join_path(&rel);
        if !dest.contains(&abs) || abs == dest.as_path() {
            return Err(escape(raw_path));
        }

        Ok(Some(Self { rel, abs }))
    }

    /// Returns the destination-relative path.
    #[inline]
    #[must_use]
    pub fn rel(&self) -> &Path {
        &self.rel
    }

    /// Returns the absolute path inside the destination.
    #[inline]
    #[must_use]
    pub fn abs(&self) -> &Path {
        &self.abs
    }

    /// Converts into the destination-relative `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_rel(self) -> PathBuf {
        self.rel
    }

    /// Returns where this path lands once symlinks already on disk are
    /// followed.
    ///
    /// Every ancestor is resolved the way the kernel would, including links
    /// whose targets do not exist yet. The final component is not followed.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::SymlinkViolation` with `AncestorEscape` if the
    /// real parent lies outside `dest` or the links cannot be resolved.
    pub fn on_disk(&self, dest: &DestDir) -> Result<PathBuf> {
        let parent = self.rel.parent().unwrap_or_else(|| Path::new(""));

        match follow_links(dest.as_path(), parent) {
            Some(real_parent) if dest.contains(&real_parent) => Ok(match self.rel.file_name() {
                Some(name) => real_parent.join(name),
                None => real_parent,
            }),
            _ => Err(InstallError::SymlinkViolation {
                path: self.rel.clone(),
                violation: SymlinkViolation::AncestorEscape {
                    ancestor: self
                        .abs
                        .parent()
                        .map_or_else(|| dest.as_path().to_path_buf(), Path::to_path_buf),
                },
            }),
        }
    }
}

/// Walks `path` from `base`, replacing every symlink met on the way with its
/// target.
///
/// Missing components are taken as written. Returns `None` on a link loop or
/// a link that cannot be read.
pub(crate) fn follow_links(base: &Path, path: &Path) -> Option<PathBuf> {
    let mut hops = 0;
    follow(base.to_path_buf(), path, &mut hops)
}

fn follow(mut current: PathBuf, path: &Path, hops: &mut usize) -> Option<PathBuf> {
    for component in path.components() {
        match component {
            Component::Prefix(_) => return None,
            Component::RootDir => current = PathBuf::from("/"),
            Component::CurDir => {}
            Component::ParentDir => {
                current.pop();
            }
            Component::Normal(name) => {
                current.push(name);
                let is_link = fs::symlink_metadata(&current)
                    .is_ok_and(|metadata| metadata.file_type().is_symlink());
                if is_link {
                    *hops += 1;
                    if *hops > MAX_LINK_HOPS {
                        return None;
                    }
                    let target = fs::read_link(&current).ok()?;
                    current.pop();
                    current = follow(current, &target, hops)?;
                }
            }
        }
    }
    Some(current)
}

fn escape(raw_path: &str) -> InstallError {
    InstallError::PathEscape {
        path: raw_path.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path()).expect("failed to create dest");
        (temp, dest)
    }

    fn resolve_ok(raw: &str, dest: &DestDir) -> ResolvedPath {
        ResolvedPath::resolve(raw, dest)
            .expect("path should resolve")
            .expect("path should not be the root entry")
    }

    #[test]
    fn test_strips_root_segment() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_ok("pigsty/files/pki/ca.key", &dest);
        assert_eq!(resolved.rel(), Path::new("files/pki/ca.key"));
        assert_eq!(resolved.abs(), dest.as_path().join("files/pki/ca.key"));
    }

    #[test]
    fn test_root_name_is_irrelevant() {
        let (_temp, dest) = create_test_dest();
        let a = resolve_ok("pigsty-v3.4.1/pigsty.yml", &dest);
        let b = resolve_ok("anything/pigsty.yml", &dest);
        assert_eq!(a, b);
    }

    #[test]
    fn test_root_entry_is_noop() {
        let (_temp, dest) = create_test_dest();
        for raw in ["pigsty", "pigsty/", "pigsty/.", "pigsty//", "pigsty/a/.."] {
            assert!(
                ResolvedPath::resolve(raw, &dest).unwrap().is_none(),
                "{raw} should resolve to the root"
            );
        }
    }

    #[test]
    fn test_double_separator_matches_single() {
        let (_temp, dest) = create_test_dest();
        let doubled = resolve_ok("pigsty//files/readme.txt", &dest);
        let single = resolve_ok("pigsty/files/readme.txt", &dest);
        assert_eq!(doubled.rel(), Path::new("files/readme.txt"));
        assert_eq!(doubled, single);
        assert_eq!(doubled.abs().parent().unwrap(), dest.as_path().join("files"));
    }

    #[test]
    fn test_current_dir_segments_folded() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_ok("pigsty/./files/./readme.txt", &dest);
        assert_eq!(resolved.rel(), Path::new("files/readme.txt"));
    }

    #[test]
    fn test_inner_parent_dir_folded() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_ok("pigsty/roles/../templates/olap.yml", &dest);
        assert_eq!(resolved.rel(), Path::new("templates/olap.yml"));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_temp, dest) = create_test_dest();
        for raw in [
            "pigsty/../../escape.txt",
            "pigsty/..",
            "pigsty/../sibling/file",
            "pigsty/a/../../b",
            "pigsty/a/b/../../../../etc/passwd",
        ] {
            let result = ResolvedPath::resolve(raw, &dest);
            assert!(
                matches!(result, Err(InstallError::PathEscape { ref path }) if path == raw),
                "{raw} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_leading_slash_and_backslash_normalized() {
        let (_temp, dest) = create_test_dest();
        assert_eq!(
            resolve_ok("/pigsty/conf/ha.yml", &dest).rel(),
            Path::new("conf/ha.yml")
        );
        assert_eq!(
            resolve_ok("pigsty\\conf\\ha.yml", &dest).rel(),
            Path::new("conf/ha.yml")
        );
        assert!(ResolvedPath::resolve("pigsty\\..\\..\\evil", &dest).is_err());
    }

    #[test]
    fn test_absolute_remainder_stays_inside() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_ok("pigsty//etc/passwd", &dest);
        assert_eq!(resolved.rel(), Path::new("etc/passwd"));
        assert!(dest.contains(resolved.abs()));
    }

    #[test]
    fn test_null_bytes_rejected() {
        let (_temp, dest) = create_test_dest();
        let result = ResolvedPath::resolve("pigsty/evil\0.txt", &dest);
        assert!(matches!(result, Err(InstallError::InvalidArchive(_))));
    }

    #[test]
    fn test_on_disk_without_links_is_abs() {
        let (_temp, dest) = create_test_dest();
        let resolved = resolve_ok("pigsty/roles/pgsql/tasks/main.yml", &dest);
        assert_eq!(resolved.on_disk(&dest).unwrap(), resolved.abs());
    }

    #[cfg(unix)]
    #[test]
    fn test_on_disk_follows_symlinked_ancestors() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = create_test_dest();
        fs::create_dir_all(dest.join_path(Path::new("files/pki"))).unwrap();
        fs::create_dir_all(dest.join_path(Path::new("x/y"))).unwrap();
        symlink("files", dest.join_path(Path::new("alias"))).unwrap();
        symlink("../..", dest.join_path(Path::new("x/y/up"))).unwrap();

        let through_alias = resolve_ok("pigsty/alias/pki/ca.key", &dest);
        assert_eq!(
            through_alias.on_disk(&dest).unwrap(),
            dest.join_path(Path::new("files/pki/ca.key"))
        );

        let through_up = resolve_ok("pigsty/x/y/up/esc", &dest);
        assert_eq!(
            through_up.on_disk(&dest).unwrap(),
            dest.join_path(Path::new("esc"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_on_disk_final_component_not_followed() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = create_test_dest();
        symlink("/etc/passwd", dest.join_path(Path::new("passwd"))).unwrap();
        let resolved = resolve_ok("pigsty/passwd", &dest);
        assert_eq!(resolved.on_disk(&dest).unwrap(), resolved.abs());
    }

    #[cfg(unix)]
    #[test]
    fn test_on_disk_escaping_or_looping_ancestor_rejected() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = create_test_dest();
        let outside = TempDir::new().unwrap();
        symlink(outside.path(), dest.join_path(Path::new("out"))).unwrap();
        symlink("loop", dest.join_path(Path::new("loop"))).unwrap();

        for raw in ["pigsty/out/file", "pigsty/loop/file"] {
            let resolved = resolve_ok(raw, &dest);
            assert!(
                matches!(
                    resolved.on_disk(&dest),
                    Err(InstallError::SymlinkViolation {
                        violation: SymlinkViolation::AncestorEscape { .. },
                        ..
                    })
                ),
                "{raw} should be rejected"
            );
        }
    }
}
