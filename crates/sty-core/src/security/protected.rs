//! Paths that survive re-installation.

use std::path::Path;
use std::path::PathBuf;

use crate::types::DestDir;
use crate::types::resolved_path::follow_links;

/// One protection rule, matched against destination-relative paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProtectedRule {
    /// Matches exactly this relative path.
    Exact(PathBuf),
    /// Matches this relative path and everything beneath it.
    Prefix(PathBuf),
}

impl ProtectedRule {
    /// Returns `true` if `rel_path` falls under this rule.
    ///
    /// Matching is component-wise: `files/pki` covers `files/pki/ca.key`
    /// but not `files/pkix`.
    #[must_use]
    pub fn matches(&self, rel_path: &Path) -> bool {
        match self {
            Self::Exact(path) => rel_path == path,
            Self::Prefix(prefix) => rel_path.starts_with(prefix),
        }
    }

    /// Returns the relative path this rule names.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Exact(path) | Self::Prefix(path) => path,
        }
    }
}

/// The table of protected paths.
///
/// A protected regular file that already exists in the destination is never
/// overwritten by an installation. This is how generated secrets and an
/// operator's edited configuration survive `overwrite` re-installs.
///
/// The default table protects the primary configuration document
/// (`pigsty.yml`) and the PKI subtree (`files/pki`).
///
/// # Examples
///
/// ```
/// use sty_core::security::ProtectedPaths;
/// use std::path::Path;
///
/// let protected = ProtectedPaths::default();
/// assert!(protected.is_protected(Path::new("pigsty.yml")));
/// assert!(protected.is_protected(Path::new("files/pki/ca/ca.key")));
/// assert!(!protected.is_protected(Path::new("conf/pigsty.yml")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPaths {
    rules: Vec<ProtectedRule>,
}

impl ProtectedPaths {
    /// Creates a table from an explicit rule list.
    #[must_use]
    pub fn new(rules: Vec<ProtectedRule>) -> Self {
        Self { rules }
    }

    /// Creates a table that protects nothing.
    #[must_use]
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule to the table.
    #[must_use]
    pub fn with_rule(mut self, rule: ProtectedRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns `true` if `rel_path` is equal to, or nested under, any rule.
    #[must_use]
    pub fn is_protected(&self, rel_path: &Path) -> bool {
        self.rules.iter().any(|rule| rule.matches(rel_path))
    }

    /// Returns `true` if `location`, an absolute path under `dest` with
    /// symlinks already followed, is where a protected path really lives.
    ///
    /// Catches writes that reach protected files through a symlinked
    /// directory, and protected directories the operator replaced with a
    /// symlink.
    #[must_use]
    pub fn guards(&self, dest: &DestDir, location: &Path) -> bool {
        self.rules.iter().any(|rule| {
            follow_links(dest.as_path(), rule.path()).is_some_and(|real| match rule {
                ProtectedRule::Exact(_) => location == real,
                ProtectedRule::Prefix(_) => location.starts_with(&real),
            })
        })
    }

    /// Returns the rules in this table.
    #[must_use]
    pub fn rules(&self) -> &[ProtectedRule] {
        &self.rules
    }
}

impl Default for ProtectedPaths {
    fn default() -> Self {
        Self::new(vec![
            ProtectedRule::Exact(PathBuf::from("pigsty.yml")),
            ProtectedRule::Prefix(PathBuf::from("files/pki")),
        ])
    }
}
