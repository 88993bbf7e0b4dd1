use std::fmt;
use std::fs;
use std::path::Path;

use ndarray::ShapeError;
use serde::Deserialize;

use super::tokenizer::SubwordTokenizer;
use crate::translate::{MAX_SRC_LEN, MAX_TGT_LEN};

/// Which resource failed to come up. Each stage is cached separately and a
/// failed stage is retried on the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Tokenizer,
    Config,
    Model,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tokenizer => write!(f, "tokenizer"),
            Self::Config => write!(f, "model config"),
            Self::Model => write!(f, "model"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ndarray shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("model output not found: {0}")]
    OutputNotFound(String),
    #[error("model download failed: {0}")]
    Download(String),
    #[error("model snapshot not found under {0}")]
    SnapshotNotFound(String),
    #[error("{stage} load failed: {reason}")]
    Load { stage: LoadStage, reason: String },
    #[error("translation resources unavailable: {0}")]
    ResourceUnavailable(String),
}

impl TranslateError {
    pub(crate) fn load(stage: LoadStage, reason: impl fmt::Display) -> Self {
        Self::Load {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Tag an error with the loading stage it happened in. Errors that
    /// already carry their own load semantics pass through unchanged.
    pub(crate) fn for_stage(self, stage: LoadStage) -> Self {
        match self {
            Self::ResourceUnavailable(_)
            | Self::Load { .. }
            | Self::Download(_)
            | Self::SnapshotNotFound(_) => self,
            other => Self::load(stage, other),
        }
    }

    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::Download(_) | Self::SnapshotNotFound(_)
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Download(_) => {
                "Could not download the translation model. Check your internet connection and try again."
            }
            Self::SnapshotNotFound(_) => {
                "Translation model files are missing or corrupted. Try downloading them again."
            }
            Self::ResourceUnavailable(_) => {
                "Translation is not available here. No usable location for model files was found."
            }
            Self::Load { .. } => {
                "The translation model failed to load. Try downloading it again."
            }
            Self::Tokenizer(_) => "The translation engine could not process this text.",
            Self::Ort(_) | Self::OutputNotFound(_) | Self::Shape(_) => {
                "The translation engine failed to run. Try restarting the app or downloading the model again."
            }
            Self::Io(_) => {
                "The app could not read or write its local files. Check disk space and permissions."
            }
        }
    }
}

/// Subset of the exported model's `config.json` the decoder cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    pub decoder_start_token_id: Option<u32>,
    pub eos_token_id: Option<u32>,
    pub pad_token_id: Option<u32>,
}

impl ModelConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TranslateError> {
        let raw = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| TranslateError::load(LoadStage::Config, e))
    }
}

/// The three ids the decode loop needs, resolved once per model load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub start: u32,
    pub eos: u32,
    pub pad: u32,
}

impl SpecialTokens {
    /// Start prefers the config's decoder-specific id and falls back to the
    /// tokenizer's BOS; EOS must exist somewhere; pad defaults to 0.
    pub fn resolve<T: SubwordTokenizer>(
        config: &ModelConfig,
        tokenizer: &T,
    ) -> Result<Self, TranslateError> {
        let start = config
            .decoder_start_token_id
            .or_else(|| tokenizer.bos_token_id())
            .ok_or_else(|| {
                TranslateError::load(
                    LoadStage::Config,
                    "no decoder start token id in config or tokenizer",
                )
            })?;

        let eos = tokenizer
            .eos_token_id()
            .or(config.eos_token_id)
            .ok_or_else(|| {
                TranslateError::load(
                    LoadStage::Tokenizer,
                    "tokenizer exposes no end-of-sequence id",
                )
            })?;

        let pad = tokenizer.pad_token_id().or(config.pad_token_id).unwrap_or(0);

        log::debug!("Special ids resolved: start={start} eos={eos} pad={pad}");
        Ok(Self { start, eos, pad })
    }
}

/// Fixed-length bounds for one translator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLimits {
    pub max_source: usize,
    pub max_target: usize,
}

impl Default for SequenceLimits {
    fn default() -> Self {
        Self {
            max_source: MAX_SRC_LEN,
            max_target: MAX_TGT_LEN,
        }
    }
}
