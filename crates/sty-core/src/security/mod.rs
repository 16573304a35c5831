//! Security validation modules.

pub mod path;
pub mod permissions;
pub mod protected;
pub mod symlink;

// Re-export public types and functions
pub use path::resolve_entry_path;
pub use permissions::sanitize_mode;
pub use protected::ProtectedPaths;
pub use protected::ProtectedRule;
pub use symlink::check_ancestors;
pub use symlink::check_existing_target;
pub use symlink::validate_link_target;
