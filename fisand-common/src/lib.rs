// fisand-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
pub mod model;

// Re-export key types
pub use config::{Config, LocalConfig};
pub use dependency::DependencyMap;
pub use error::{FisandError, Result};
pub use model::{EntryKind, FetchTarget, Project, TreeEntry};
