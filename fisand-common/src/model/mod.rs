// fisand-common/src/model/mod.rs
pub mod project;
pub mod tree;

// Re-export
pub use project::Project;
pub use tree::{EntryKind, FetchTarget, TreeEntry, DEFAULT_REFERENCE, PACKAGES_ROOT};
