//! File permission sanitizing.

/// Permission bits kept from archive headers.
const PERMISSION_MASK: u32 = 0o777;

/// Strips everything but the rwx bits from an archive header mode.
///
/// Setuid, setgid and sticky bits, plus any file-type bits a header may carry,
/// never reach the filesystem.
///
/// # Examples
///
/// ```
/// use sty_core::security::sanitize_mode;
///
/// assert_eq!(sanitize_mode(0o644), 0o644);
/// assert_eq!(sanitize_mode(0o4755), 0o755);
/// assert_eq!(sanitize_mode(0o100_600), 0o600);
/// ```
#[must_use]
pub const fn sanitize_mode(mode: u32) -> u32 {
    mode & PERMISSION_MASK
}
