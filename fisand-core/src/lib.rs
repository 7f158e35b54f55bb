// fisand-core/src/lib.rs

// Fetching, exclusion and dependency resolution for module trees.
pub mod exclusion;
pub mod fetcher;
pub mod materialize;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod session;

pub use exclusion::{ExclusionPolicy, FileAction};
pub use fetcher::ModuleFetcher;
pub use materialize::TreeMaterializer;
pub use progress::{FetchObserver, NoopObserver};
pub use report::{EntryAction, EntryOutcome, Materialization};
pub use resolver::{DependencyResolver, Resolution};
pub use session::{ImportOutcome, ImportSession};
