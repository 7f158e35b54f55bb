// fisand-net/src/lib.rs
pub mod gitlab;
pub mod http;
pub mod memory;
pub mod remote;
pub mod validation;

pub use gitlab::GitLabClient;
pub use memory::{MemoryRemote, RemoteCall};
pub use remote::RemoteRepository;
pub use validation::validate_host_url;
