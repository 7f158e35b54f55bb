// fisand-aio/src/fs.rs
//! Filesystem primitives used while materializing modules.
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fisand_common::error::{FisandError, Result};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, error};

/// Checks if a path points to a directory (resolving symlinks).
pub async fn is_directory_async(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Creates a directory and all its parent components if they are missing.
/// Succeeds when the directory already exists.
pub async fn create_dir_all_async(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).await.map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        FisandError::from(e)
    })
}

/// Atomically writes `content` to `path`, replacing any existing file.
///
/// The parent directory must already exist; it is never created here, so a
/// write into a directory nobody created fails instead of silently
/// producing it.
pub async fn write_file_async(path: &Path, content: Vec<u8>) -> Result<()> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || atomic_write_file(&path, &content))
        .await
        .map_err(|e| FisandError::Generic(format!("Write task failed: {e}")))?
}

/// Synchronous body of [`write_file_async`].
pub fn atomic_write_file(target: &Path, content: &[u8]) -> Result<()> {
    let dir = target.parent().ok_or_else(|| {
        FisandError::IoError(format!(
            "Cannot get parent directory for {}",
            target.display()
        ))
    })?;

    if !dir.is_dir() {
        return Err(FisandError::IoError(format!(
            "Parent directory {} does not exist",
            dir.display()
        )));
    }

    let mut temp_file = NamedTempFile::new_in(dir)?;
    let temp_path = temp_file.path().to_path_buf();

    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        target.display(),
        temp_path.display()
    );

    temp_file.write_all(content)?;
    temp_file.flush()?;

    temp_file.persist(target).map_err(|e| {
        error!(
            "Failed to persist temporary file {} over {}: {}",
            temp_path.display(),
            target.display(),
            e.error
        );
        FisandError::Io(Arc::new(e.error))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_dir_all_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");

        create_dir_all_async(&nested).await.unwrap();
        create_dir_all_async(&nested).await.unwrap();

        assert!(is_directory_async(&nested).await);
    }

    #[tokio::test]
    async fn write_overwrites_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("index.ts");

        write_file_async(&target, b"first".to_vec()).await.unwrap();
        write_file_async(&target, b"second".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
    }

    #[tokio::test]
    async fn write_never_creates_parent_directory() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("missing").join("index.ts");

        let result = write_file_async(&target, b"x".to_vec()).await;

        assert!(result.is_err());
        assert!(!is_directory_async(&temp.path().join("missing")).await);
    }

    #[tokio::test]
    async fn file_is_not_a_directory() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("ui");
        write_file_async(&target, Vec::new()).await.unwrap();

        assert!(!is_directory_async(&target).await);
        assert!(!is_directory_async(&temp.path().join("absent")).await);
    }
}
