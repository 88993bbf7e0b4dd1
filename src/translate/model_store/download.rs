use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use serde::Serialize;

use crate::translate::engine::TranslateError;

use super::{MAX_RETRIES, MODEL_BASE_URL, MODEL_FILES, RETRY_BACKOFF_SECS};

const SNAPSHOT_NAME: &str = "downloaded";

/// Fetch only the named files into an existing snapshot.
pub(crate) fn download_missing_files(
    snapshot_dir: &Path,
    missing_files: &[String],
) -> Result<(), TranslateError> {
    if missing_files.is_empty() {
        return Ok(());
    }

    start_tracking(missing_files.len());
    let result: Result<(), TranslateError> = (|| {
        for (index, file) in missing_files.iter().enumerate() {
            set_file_index(index + 1);
            let dest = snapshot_dir.join(file);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fetch_asset(&format!("{MODEL_BASE_URL}/{file}"), &dest)?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            mark_finished();
            log::info!("Repaired model snapshot at {}", snapshot_dir.display());
            Ok(())
        }
        Err(err) => {
            log::error!("Model snapshot repair failed: {err}");
            record_failure(err.user_message().to_string());
            Err(err)
        }
    }
}

/// Fetch a complete snapshot under `root` and pin it via `refs/main`.
pub(crate) fn download_snapshot(root: &Path) -> Result<PathBuf, TranslateError> {
    start_tracking(MODEL_FILES.len());
    let result: Result<PathBuf, TranslateError> = (|| {
        let snapshot_dir = root.join("snapshots").join(SNAPSHOT_NAME);
        fs::create_dir_all(&snapshot_dir)?;

        for (index, file) in MODEL_FILES.iter().enumerate() {
            set_file_index(index + 1);
            let dest = snapshot_dir.join(file);
            if dest.exists() {
                continue;
            }
            fetch_asset(&format!("{MODEL_BASE_URL}/{file}"), &dest)?;
        }

        let refs_dir = root.join("refs");
        fs::create_dir_all(&refs_dir)?;
        fs::write(refs_dir.join("main"), SNAPSHOT_NAME)?;

        Ok(snapshot_dir)
    })();

    match result {
        Ok(path) => {
            mark_finished();
            Ok(path)
        }
        Err(err) => {
            log::error!("Model download failed: {err}");
            record_failure(err.user_message().to_string());
            Err(err)
        }
    }
}

fn fetch_asset(url: &str, dest: &Path) -> Result<(), TranslateError> {
    let tmp = dest.with_extension("download");
    let config = ureq::config::Config::builder()
        .timeout_global(Some(Duration::from_secs(30)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let mut last_err: Option<TranslateError> = None;
    for attempt in 1..=MAX_RETRIES {
        log::info!(
            "Downloading {url} to {} (attempt {attempt}/{MAX_RETRIES})",
            dest.display()
        );
        match fetch_resumable(&agent, url, &tmp, dest) {
            Ok(()) => return Ok(()),
            Err(err) => {
                log::warn!("Download attempt {attempt} failed: {err}");
                last_err = Some(err);
                if attempt < MAX_RETRIES {
                    std::thread::sleep(Duration::from_secs(RETRY_BACKOFF_SECS * attempt as u64));
                }
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| TranslateError::Download(format!("{url}: failed to download"))))
}

fn content_length(response: &ureq::http::Response<ureq::Body>) -> u64 {
    response
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn fetch_resumable(
    agent: &ureq::Agent,
    url: &str,
    tmp: &Path,
    dest: &Path,
) -> Result<(), TranslateError> {
    let partial_len = fs::metadata(tmp).map(|m| m.len()).unwrap_or(0);

    let mut request = agent.get(url);
    if partial_len > 0 {
        request = request.header("Range", &format!("bytes={partial_len}-"));
    }
    let response = request
        .call()
        .map_err(|e| TranslateError::Download(format!("{url}: request failed: {e}")))?;

    let status = response.status();
    if !(200..300).contains(&status.as_u16()) {
        return Err(TranslateError::Download(format!(
            "{url}: unexpected status {status}"
        )));
    }

    let resumed = status.as_u16() == 206;
    let mut downloaded = if resumed { partial_len } else { 0 };
    let total = downloaded + content_length(&response);

    let mut file = if resumed {
        log::debug!("Resuming download from byte {partial_len}");
        fs::OpenOptions::new().create(true).append(true).open(tmp)?
    } else {
        if partial_len > 0 {
            log::warn!("Server ignored the Range request (status {status}), restarting download.");
        }
        fs::File::create(tmp)?
    };
    update_download_bytes(downloaded, total);

    let mut reader = response.into_body().into_reader();
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| TranslateError::Download(format!("{url}: read failed: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| TranslateError::Download(format!("{url}: write failed: {e}")))?;
        downloaded += n as u64;
        update_download_bytes(downloaded, total);
    }

    if total > 0 && downloaded != total {
        return Err(TranslateError::Download(format!(
            "Incomplete download: expected {total} bytes, got {downloaded}"
        )));
    }

    fs::rename(tmp, dest)?;
    Ok(())
}

/// Process-wide progress of the current asset download.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadProgress {
    pub file_index: usize,
    pub file_count: usize,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub done: bool,
    pub error: Option<String>,
}

static DOWNLOAD_PROGRESS: OnceLock<Mutex<DownloadProgress>> = OnceLock::new();

fn progress_state() -> &'static Mutex<DownloadProgress> {
    DOWNLOAD_PROGRESS.get_or_init(|| {
        Mutex::new(DownloadProgress {
            file_index: 0,
            file_count: 0,
            downloaded_bytes: 0,
            total_bytes: 0,
            done: false,
            error: None,
        })
    })
}

pub fn start_tracking(file_count: usize) {
    if let Ok(mut progress) = progress_state().lock() {
        progress.file_index = 0;
        progress.file_count = file_count;
        progress.downloaded_bytes = 0;
        progress.total_bytes = 0;
        progress.done = false;
        progress.error = None;
    }
}

pub fn set_file_index(file_index: usize) {
    if let Ok(mut progress) = progress_state().lock() {
        progress.file_index = file_index;
        progress.downloaded_bytes = 0;
        progress.total_bytes = 0;
    }
}

pub(crate) fn update_download_bytes(downloaded: u64, total: u64) {
    if let Ok(mut progress) = progress_state().lock() {
        progress.downloaded_bytes = downloaded;
        progress.total_bytes = total;
    }
}

pub fn mark_finished() {
    if let Ok(mut progress) = progress_state().lock() {
        progress.file_index = progress.file_count;
        progress.done = true;
    }
}

pub fn record_failure(error: String) {
    if let Ok(mut progress) = progress_state().lock() {
        progress.error = Some(error);
        progress.done = true;
    }
}

pub fn current_download_progress() -> Option<DownloadProgress> {
    DOWNLOAD_PROGRESS
        .get()
        .and_then(|mutex| mutex.lock().ok().map(|progress| progress.clone()))
}
