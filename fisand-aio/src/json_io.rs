// fisand-aio/src/json_io.rs
use std::path::Path;
use std::sync::Arc;

use fisand_common::error::{FisandError, Result};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

/// Asynchronously writes serializable data to a JSON file (pretty-printed, two-space indent).
pub async fn write_json_async<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    debug!("Async Writing JSON to: {}", path.display());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut json_bytes =
        serde_json::to_vec_pretty(data).map_err(|e| FisandError::Json(Arc::new(e)))?;
    json_bytes.push(b'\n');

    crate::fs::write_file_async(path, json_bytes).await
}
