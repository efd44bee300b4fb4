use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};

/// Copies the `.png` artifacts of `source_dir` into
/// `backup_root/figures_<YYYYmmdd_HHMMSS>/`.
///
/// Returns `Ok(None)` when there is nothing to back up.
pub fn backup_existing_artifacts(
    source_dir: &Path,
    backup_root: &Path,
) -> std::io::Result<Option<PathBuf>> {
    if !source_dir.is_dir() {
        debug!("Nothing to back up, {} does not exist", source_dir.display());
        return Ok(None);
    }

    let mut artifacts = Vec::new();
    for entry in std::fs::read_dir(source_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("png") {
            artifacts.push(path);
        }
    }
    if artifacts.is_empty() {
        debug!("No artifacts in {}, skipping backup", source_dir.display());
        return Ok(None);
    }

    let backup_dir = backup_root.join(format!(
        "figures_{}",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    std::fs::create_dir_all(&backup_dir)?;
    for artifact in &artifacts {
        if let Some(name) = artifact.file_name() {
            std::fs::copy(artifact, backup_dir.join(name))?;
        }
    }
    info!(
        "Backup created: {} ({} file(s))",
        backup_dir.display(),
        artifacts.len()
    );
    Ok(Some(backup_dir))
}
