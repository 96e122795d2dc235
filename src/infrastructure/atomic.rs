//! Whole-file replacement through a sibling staging file

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// `<path>.tmp`, next to the target so the rename stays on one filesystem
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("file"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path`, creating parent directories. Readers see the
/// old file or the new one, never a partial write.
///
/// # Errors
/// The path the failing operation touched, with its io error
pub(crate) async fn replace(path: &Path, contents: &[u8]) -> Result<(), (PathBuf, io::Error)> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| (dir.to_path_buf(), e))?;
    }

    let staging = staging_path(path);
    fs::write(&staging, contents)
        .await
        .map_err(|e| (staging.clone(), e))?;
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err((path.to_path_buf(), e));
    }
    Ok(())
}
