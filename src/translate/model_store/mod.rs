mod download;
mod paths;

pub use download::{
    current_download_progress, mark_finished, record_failure, set_file_index, start_tracking,
    DownloadProgress,
};
pub use paths::{
    default_model_root, missing_model_files, resolve_snapshot_dir, weights_path,
};

use std::path::PathBuf;

pub(crate) const MODEL_BASE_URL: &str =
    "https://huggingface.co/Helsinki-NLP/opus-mt-en-fr/resolve/main";

pub(crate) const WEIGHTS_FILE: &str = "opus-mt-en-fr.onnx";
pub(crate) const QUANTIZED_WEIGHTS_FILE: &str = "opus-mt-en-fr.int8.onnx";
pub(crate) const TOKENIZER_FILE: &str = "tokenizer.json";
pub(crate) const CONFIG_FILE: &str = "config.json";

/// Every asset a complete snapshot holds.
pub(crate) const MODEL_FILES: &[&str] = &[
    WEIGHTS_FILE,
    QUANTIZED_WEIGHTS_FILE,
    TOKENIZER_FILE,
    CONFIG_FILE,
];

const MAX_RETRIES: usize = 3;
const RETRY_BACKOFF_SECS: u64 = 2;

/// Where model assets live and whether missing ones may be fetched.
#[derive(Debug, Clone)]
pub struct ModelStoreOptions {
    /// Explicit snapshot root; resolved from the OS cache dir when unset.
    pub root: Option<PathBuf>,
    pub allow_download: bool,
    /// Prefer the int8 weights when present.
    pub quantized: bool,
}

impl Default for ModelStoreOptions {
    fn default() -> Self {
        Self {
            root: None,
            allow_download: true,
            quantized: true,
        }
    }
}
