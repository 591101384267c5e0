use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::output::types::Artifact;

/// Replace the artifact at `path` in one step: write a sibling temp file, then rename.
pub fn write_artifact(path: impl AsRef<Path>, artifact: &Artifact) -> Result<()> {
    let path = path.as_ref();

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(artifact).context("Failed to serialize artifact")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes())
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", tmp.display()))?;

    info!("Wrote {} ({} bytes)", path.display(), json.len());
    Ok(())
}
