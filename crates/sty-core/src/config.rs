//! Installation configuration.

use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::InstallError;
use crate::Result;
use crate::security::ProtectedPaths;

/// Installation directory used when no target is given.
pub const DEFAULT_INSTALL_DIR: &str = "~/pigsty";

/// Configuration for a bundle installation.
///
/// # Examples
///
/// ```
/// use sty_core::InstallConfig;
///
/// // Fresh install into ~/pigsty, refusing a populated directory
/// let config = InstallConfig::default();
/// assert!(!config.overwrite);
///
/// // Upgrade in place
/// let upgrade = InstallConfig::default().with_overwrite(true);
/// assert!(upgrade.overwrite);
/// ```
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Target used when the caller passes an empty path. A leading `~/`
    /// expands against the user's home directory.
    pub default_dir: PathBuf,

    /// Paths preserved across re-installation.
    pub protected: ProtectedPaths,

    /// Install into a non-empty target instead of refusing.
    pub overwrite: bool,
}

impl Default for InstallConfig {
    /// Default values:
    /// - `default_dir`: `~/pigsty`
    /// - `protected`: `pigsty.yml` and `files/pki/**`
    /// - `overwrite`: false
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            protected: ProtectedPaths::default(),
            overwrite: false,
        }
    }
}

impl InstallConfig {
    /// Sets the fallback installation directory.
    #[must_use]
    pub fn with_default_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_dir = dir.into();
        self
    }

    /// Replaces the protected path table.
    #[must_use]
    pub fn with_protected(mut self, protected: ProtectedPaths) -> Self {
        self.protected = protected;
        self
    }

    /// Sets whether a non-empty target may be installed into.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Turns a caller-supplied target into the directory to install into.
    ///
    /// An empty target falls back to `default_dir`. A leading `~` component
    /// is replaced by the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::Io` if the path needs the home directory and it
    /// cannot be determined.
    pub fn expand_target(&self, target: &Path) -> Result<PathBuf> {
        let target = if target.as_os_str().is_empty() {
            self.default_dir.as_path()
        } else {
            target
        };
        expand_tilde(target)
    }
}

fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };

    let home = home::home_dir().ok_or_else(|| {
        InstallError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("cannot expand {}: home directory unknown", path.display()),
        ))
    })?;

    Ok(home.join(rest))
}
