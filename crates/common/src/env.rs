//! Environment/runtime helpers
//!
//! Sanity checks to ensure the directory holding a data file exists at startup.
//! The persister itself never creates directories; a missing parent is a hard
//! failure on save, so binaries call this first. A missing file is left to the
//! persister, which reports it when loading.

use std::path::Path;
use tracing::debug;

/// Ensure the parent directory of `data_file` exists.
pub async fn ensure_data_dir(data_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        debug!(dir = %parent.display(), "data directory ready");
    }
    Ok(())
}
