//! Validated safe symlink type.

use crate::InstallError;
use crate::Result;
use crate::error::SymlinkViolation;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;
use super::ResolvedPath;
use super::resolved_path::follow_links;

/// A symlink entry whose target has been proven to stay in the destination.
///
/// `SafeSymlink` represents a symbolic link where:
/// - The link location is a `ResolvedPath`
/// - The target text is relative and non-empty
/// - The target, resolved against the link's parent directory, lands inside
///   the destination
///
/// The target text is kept verbatim. Validation never rewrites what ends up
/// on disk; `../roles/pgsql/templates/olap.yml` is created as exactly that.
///
/// # Security Properties
///
/// - Can ONLY be constructed through validation
/// - Walking up and back down (`../shared/x`) is fine as long as the final
///   location is inside the destination
///
/// # Examples
///
/// ```no_run
/// use sty_core::types::DestDir;
/// use sty_core::types::ResolvedPath;
/// use sty_core::types::SafeSymlink;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/home/dba/pigsty")?;
/// let link = ResolvedPath::resolve("pigsty/templates/olap.yml", &dest)?
///     .expect("not the root entry");
///
/// let target = Path::new("../roles/pgsql/templates/olap.yml");
/// let symlink = SafeSymlink::validate(&link, target, &dest)?;
/// assert_eq!(symlink.target_path(), target);
///
/// assert!(SafeSymlink::validate(&link, Path::new("/etc/passwd"), &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSymlink {
    link: ResolvedPath,
    target_path: PathBuf,
}

impl SafeSymlink {
    /// Validates and constructs a `SafeSymlink`.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject an empty target
    /// 2. Reject an absolute target
    /// 3. Find the link's real parent directory, following symlinked
    ///    ancestors already on disk
    /// 4. Join the target onto it and fold `.` and `..` lexically (the target
    ///    may not exist yet)
    /// 5. Resolve the same join again following existing symlinks
    /// 6. Verify both results are inside the destination
    ///
    /// # Errors
    ///
    /// - `InstallError::InvalidArchive` for an empty target
    /// - `InstallError::SymlinkViolation` with `AbsoluteTarget`,
    ///   `TargetEscape`, or `AncestorEscape` when the link's own parent
    ///   resolves outside the destination
    pub fn validate(link: &ResolvedPath, target: &Path, dest: &DestDir) -> Result<Self> {
        if target.as_os_str().is_empty() {
            return Err(InstallError::InvalidArchive(format!(
                "symlink {} has an empty target",
                link.rel().display()
            )));
        }

        if target.is_absolute() || target.has_root() {
            return Err(InstallError::SymlinkViolation {
                path: link.rel().to_path_buf(),
                violation: SymlinkViolation::AbsoluteTarget {
                    target: target.to_path_buf(),
                },
            });
        }

        let location = link.on_disk(dest)?;
        let link_parent = location.parent().unwrap_or_else(|| dest.as_path());
        let lexical = normalize_link_target(&link_parent.join(target));
        let physical = follow_links(link_parent, target);

        if !dest.contains(&lexical) || !physical.is_some_and(|p| dest.contains(&p)) {
            return Err(InstallError::SymlinkViolation {
                path: link.rel().to_path_buf(),
                violation: SymlinkViolation::TargetEscape {
                    target: target.to_path_buf(),
                },
            });
        }

        Ok(Self {
            link: link.clone(),
            target_path: target.to_path_buf(),
        })
    }

    /// Returns the resolved location of the link itself.
    #[inline]
    #[must_use]
    pub fn link(&self) -> &ResolvedPath {
        &self.link
    }

    /// Returns the target text exactly as stored in the archive.
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}

/// Folds `.` and `..` components without touching the filesystem.
///
/// A `..` that would climb above the root simply drops the root, which
/// leaves a relative path that can never pass the containment check.
fn normalize_link_target(path: &Path) -> PathBuf {
    let mut components = Vec::with_capacity(path.components().count());

    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }

    components.iter().collect()
}
