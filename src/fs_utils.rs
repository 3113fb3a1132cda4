use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Replace `path` with `contents` without ever exposing a half-written file.
///
/// Creates missing parent directories, writes and syncs a sibling temp file,
/// then renames it over the target. The temp file is removed on any failure.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = temp_sibling(path);
    let result = async {
        write_synced(&tmp_path, contents).await?;
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if result.is_err() {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            debug!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temp file");
        }
    }
    result
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("data"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
