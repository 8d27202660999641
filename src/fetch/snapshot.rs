use std::path::{Path, PathBuf};
use tokio::fs;

use super::FetchResult;

/// Save the fetched page under `<dir>/<year>/<state_index>.html`.
/// Returns the full path of the saved file.
pub async fn save_snapshot(dir: impl AsRef<Path>, fetched: &FetchResult) -> std::io::Result<PathBuf> {
    let dest_dir = dir.as_ref().join(fetched.year.to_string());
    fs::create_dir_all(&dest_dir).await?;

    let dest_path = dest_dir.join(format!("{}.html", fetched.state_index));
    fs::write(&dest_path, fetched.body.as_bytes()).await?;
    Ok(dest_path)
}
