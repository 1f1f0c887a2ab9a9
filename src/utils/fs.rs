//! File system utilities.
//!
//! Both writers replace a file through a sibling `.tmp` and a rename. The
//! blocking one serves the config file, which is edited from synchronous
//! admin code; topic state is written on the scan's runtime with the async one.

use std::fs;
use std::io::Write;

use tokio::io::AsyncWriteExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Sibling path used while a file is being replaced.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bytes atomically (write to temp, then rename).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Async counterpart of [`write_atomic`] on `tokio::fs`.
pub async fn write_atomic_async(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Save data to a JSON file with pretty printing
pub fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(data)?;
    write_atomic(path, &json)
}

/// Load JSON data from a file
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
