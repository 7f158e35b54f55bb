// fisand-net/src/remote.rs
use async_trait::async_trait;
use fisand_common::error::{FisandError, Result};
use fisand_common::model::{FetchTarget, TreeEntry};

/// Read access to the module source repository.
///
/// `list_tree` is the tree client and `fetch_file`/`fetch_file_text` the file
/// client. Implementations report failures as `RemoteNotFound`, `RemoteAuth`
/// or `RemoteUnavailable`; text decoding failures as `Decode`.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Entries directly under `target`'s path at its reference.
    ///
    /// An existing but empty directory yields an empty vector, not an error.
    async fn list_tree(&self, target: &FetchTarget) -> Result<Vec<TreeEntry>>;

    /// Raw file content, suitable for writing to disk unchanged.
    async fn fetch_file(&self, file_path: &str, reference: &str) -> Result<Vec<u8>>;

    /// File content decoded as UTF-8 text, for manifest inspection.
    async fn fetch_file_text(&self, file_path: &str, reference: &str) -> Result<String> {
        let bytes = self.fetch_file(file_path, reference).await?;
        String::from_utf8(bytes)
            .map_err(|e| FisandError::Decode(file_path.to_string(), e.to_string()))
    }
}
