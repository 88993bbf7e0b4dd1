pub mod decoder;
pub mod engine;
pub mod model_store;
pub mod runtime;

pub use engine::{
    HfTokenizer, LoadStage, ModelConfig, OrtSeq2Seq, Seq2SeqModel, SequenceLimits, SpecialTokens,
    StepInputs, SubwordTokenizer, TokenizedText, TranslateError, Translator,
};
pub use model_store::{
    current_download_progress, default_model_root, mark_finished, missing_model_files,
    record_failure, resolve_snapshot_dir, set_file_index, start_tracking, weights_path,
    DownloadProgress, ModelStoreOptions,
};
pub use runtime::{ModelDownloadStatus, ModelRuntime, ResourceProvider, SnapshotProvider};

/// Sequence bounds baked into the exported model graph. Longer inputs are
/// truncated, shorter ones padded; both feeds are always exactly this wide.
pub const MAX_SRC_LEN: usize = 128;
pub const MAX_TGT_LEN: usize = 128;
