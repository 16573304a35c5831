//! Symlink pivot defenses.
//!
//! Lexical resolution cannot see symlinks, so three independent checks run
//! against the live filesystem before anything is written:
//!
//! - [`check_ancestors`]: no existing ancestor of the entry may be a symlink
//!   that resolves outside the destination
//! - [`check_existing_target`]: the entry's own path must not already be a
//!   symlink, so a write can never be followed through it
//! - [`validate_link_target`]: a symlink entry's target must resolve inside
//!   the destination

use std::fs;
use std::io;
use std::path::Path;

use crate::InstallError;
use crate::Result;
use crate::error::SymlinkViolation;
use crate::types::DestDir;
use crate::types::ResolvedPath;
use crate::types::SafeSymlink;

/// Verifies that no existing ancestor of `path` redirects outside `dest`.
///
/// Walks every ancestor directory from the destination down to (not
/// including) the entry itself, inspecting each with `lstat` semantics. An
/// ancestor that is a symlink is resolved; if it lands outside the
/// destination, or cannot be resolved at all, the check fails. Symlinked
/// ancestors that stay inside the destination are accepted.
///
/// The walk stops at the first missing ancestor, since nothing below it can
/// exist yet.
///
/// # Errors
///
/// - `InstallError::SymlinkViolation` with `AncestorEscape`
/// - `InstallError::Io` if an ancestor cannot be inspected
pub fn check_ancestors(dest: &DestDir, path: &ResolvedPath) -> Result<()> {
    let Some(parent) = path.rel().parent() else {
        return Ok(());
    };

    let mut current = dest.as_path().to_path_buf();
    for component in parent.components() {
        current.push(component);

        let metadata = match fs::symlink_metadata(&current) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(inspect_error(&current, &e)),
        };

        if metadata.file_type().is_symlink() {
            let stays_inside = current
                .canonicalize()
                .is_ok_and(|resolved| dest.contains(&resolved));

            if !stays_inside {
                return Err(InstallError::SymlinkViolation {
                    path: path.rel().to_path_buf(),
                    violation: SymlinkViolation::AncestorEscape { ancestor: current },
                });
            }
        }
    }

    Ok(())
}

/// Refuses to act on a path that is already a symlink.
///
/// Inspects the entry's own path without following it. Writing file content
/// through an existing symlink would land wherever it points, so the write
/// is refused instead.
///
/// # Errors
///
/// - `InstallError::SymlinkViolation` with `ExistingSymlink`
/// - `InstallError::Io` if the path cannot be inspected
pub fn check_existing_target(path: &ResolvedPath) -> Result<()> {
    match fs::symlink_metadata(path.abs()) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            Err(InstallError::SymlinkViolation {
                path: path.rel().to_path_buf(),
                violation: SymlinkViolation::ExistingSymlink,
            })
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(inspect_error(path.abs(), &e)),
    }
}

/// Validates the target of a symlink entry.
///
/// This function delegates to `SafeSymlink::validate()`, which rejects
/// absolute targets and relative targets that resolve outside the
/// destination when joined onto the link's parent directory.
///
/// # Errors
///
/// - `InstallError::SymlinkViolation` with `AbsoluteTarget` or
///   `TargetEscape`
/// - `InstallError::InvalidArchive` for an empty target
///
/// # Examples
///
/// ```no_run
/// use sty_core::security::resolve_entry_path;
/// use sty_core::security::validate_link_target;
/// use sty_core::types::DestDir;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/home/dba/pigsty")?;
/// let link = resolve_entry_path(&dest, "pigsty/templates/bad")?.expect("not root");
///
/// assert!(validate_link_target(&dest, &link, Path::new("../../../etc/passwd")).is_err());
/// assert!(validate_link_target(&dest, &link, Path::new("../conf/meta.yml")).is_ok());
/// # Ok(())
/// # }
/// ```
pub fn validate_link_target(
    dest: &DestDir,
    link: &ResolvedPath,
    target: &Path,
) -> Result<SafeSymlink> {
    SafeSymlink::validate(link, target, dest)
}

fn inspect_error(path: &Path, e: &io::Error) -> InstallError {
    InstallError::Io(io::Error::new(
        e.kind(),
        format!("failed to inspect {}: {e}", path.display()),
    ))
}
