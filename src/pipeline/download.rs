//! Saving the artifact: the terminal counterpart of a browser download.
//!
//! Writes go to a `.part` sibling first and are renamed into place, so an
//! interrupted save never leaves a truncated file under the final name.

use crate::error::ConvertError;
use crate::pipeline::response::Artifact;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where a converted file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    /// Name announced by the backend (or the fallback name).
    pub filename: String,
    /// Location of the saved file.
    pub path: PathBuf,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// Save `artifact` into `dir`, creating the directory if needed. An existing
/// file of the same name is replaced.
pub async fn save_artifact(artifact: Artifact, dir: &Path) -> Result<DownloadInfo, ConvertError> {
    let path = dir.join(&artifact.filename);
    let write_err = |source| ConvertError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = dir.join(format!("{}.part", artifact.filename));
    if let Err(e) = tokio::fs::write(&tmp_path, &artifact.bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    let size_bytes = artifact.bytes.len() as u64;
    info!("Saved {} ({} bytes)", path.display(), size_bytes);

    Ok(DownloadInfo {
        filename: artifact.filename,
        path,
        size_bytes,
        content_type: artifact.content_type,
    })
}
