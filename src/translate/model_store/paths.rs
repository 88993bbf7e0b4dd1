use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::translate::engine::TranslateError;

use super::{
    download, ModelStoreOptions, MODEL_BASE_URL, MODEL_FILES, QUANTIZED_WEIGHTS_FILE, WEIGHTS_FILE,
};

/// Assets a snapshot directory is still missing.
pub fn missing_model_files(snapshot_dir: &Path) -> Vec<String> {
    MODEL_FILES
        .iter()
        .filter(|file| !snapshot_dir.join(file).exists())
        .map(|file| (*file).to_string())
        .collect()
}

/// Storage root for downloaded snapshots. An environment with neither a
/// cache directory nor a home directory cannot hold model assets at all.
pub fn default_model_root() -> Result<PathBuf, TranslateError> {
    let base = dirs_next::cache_dir()
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .ok_or_else(|| {
            TranslateError::ResourceUnavailable(
                "no cache or home directory to store model assets".to_string(),
            )
        })?;

    Ok(base
        .join("linguatools")
        .join("models--Helsinki-NLP--opus-mt-en-fr"))
}

/// Preferred weights file inside a snapshot.
pub fn weights_path(snapshot_dir: &Path, quantized: bool) -> PathBuf {
    if quantized {
        let q = snapshot_dir.join(QUANTIZED_WEIGHTS_FILE);
        if q.exists() {
            return q;
        }
    }
    snapshot_dir.join(WEIGHTS_FILE)
}

fn ensure_snapshot_complete(
    options: &ModelStoreOptions,
    root: &Path,
    snapshot_dir: PathBuf,
) -> Result<PathBuf, TranslateError> {
    if !snapshot_dir.is_dir() {
        if !options.allow_download {
            return Err(TranslateError::SnapshotNotFound(
                snapshot_dir.display().to_string(),
            ));
        }
        log::warn!(
            "Model snapshot directory missing at {}. Downloading fresh snapshot.",
            snapshot_dir.display()
        );
        return download::download_snapshot(root);
    }

    let missing = missing_model_files(&snapshot_dir);
    if missing.is_empty() {
        return Ok(snapshot_dir);
    }

    if !options.allow_download {
        return Err(TranslateError::ResourceUnavailable(format!(
            "model snapshot at {} is incomplete and downloads are disabled",
            snapshot_dir.display()
        )));
    }

    log::warn!(
        "Model snapshot at {} missing required files ({}). Downloading missing assets.",
        snapshot_dir.display(),
        missing.join(", ")
    );

    match download::download_missing_files(&snapshot_dir, &missing) {
        Ok(()) => Ok(snapshot_dir),
        Err(err) => {
            log::warn!("Snapshot repair failed, falling back to fresh download: {err}");
            download::download_snapshot(root)
        }
    }
}

/// Locate a usable snapshot under `options.root`: the one pinned by
/// `refs/main` if valid, else the newest directory under `snapshots/`,
/// else a fresh download.
pub fn resolve_snapshot_dir(options: &ModelStoreOptions) -> Result<PathBuf, TranslateError> {
    let root = match &options.root {
        Some(root) => root.clone(),
        None => default_model_root()?,
    };
    log::debug!("Resolving model snapshot under {}", root.display());

    let refs_main = root.join("refs").join("main");
    if refs_main.exists() {
        let name = fs::read_to_string(&refs_main)?.trim().to_string();
        let pinned = root.join("snapshots").join(&name);
        if pinned.is_dir() {
            return ensure_snapshot_complete(options, &root, pinned);
        }
        log::warn!(
            "Snapshot {name} pinned by refs/main does not exist under {}",
            root.display()
        );
    }

    let snapshots = root.join("snapshots");
    if snapshots.is_dir() {
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&snapshots)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            match &mut newest {
                Some((ts, best)) if modified > *ts => {
                    *ts = modified;
                    *best = entry.path();
                }
                None => newest = Some((modified, entry.path())),
                _ => {}
            }
        }
        if let Some((_, path)) = newest {
            log::info!("Selected newest snapshot: {}", path.display());
            return ensure_snapshot_complete(options, &root, path);
        }
    }

    if !options.allow_download {
        return Err(TranslateError::ResourceUnavailable(format!(
            "no local model snapshot under {} and downloads are disabled",
            root.display()
        )));
    }

    log::info!(
        "No local model snapshot under {}; downloading from {}",
        root.display(),
        MODEL_BASE_URL
    );
    download::download_snapshot(&root)
}
