use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::engine::{
    HfTokenizer, LoadStage, ModelConfig, OrtSeq2Seq, Seq2SeqModel, SequenceLimits, SpecialTokens,
    SubwordTokenizer, TranslateError, Translator,
};
use super::model_store::{self, current_download_progress, ModelStoreOptions};

/// One fallible load per resource stage. A stage that fails stays uncached,
/// so the next call retries it without touching the other stages.
pub trait ResourceProvider {
    type Tokenizer: SubwordTokenizer;
    type Model: Seq2SeqModel;

    fn load_tokenizer(&self) -> Result<Self::Tokenizer, TranslateError>;
    fn load_config(&self) -> Result<ModelConfig, TranslateError>;
    fn load_model(&self) -> Result<Self::Model, TranslateError>;
}

/// Loaded/downloading state of the model, for UI polling.
#[derive(Clone, Debug, Serialize)]
pub struct ModelDownloadStatus {
    pub progress: u8,
    pub downloaded: bool,
    pub error: Option<String>,
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-lifetime owner of the lazily loaded tokenizer, model config and
/// model session.
///
/// Each cache slot's mutex is held across the load, so concurrent first
/// callers wait for the one in-flight load instead of starting their own.
/// The slots are set-once apart from [`ModelRuntime::clear_model_cache`],
/// which deliberately drops only the model: weights are the one asset worth
/// evicting, while tokenizer and config stay valid for any reload.
pub struct ModelRuntime<P: ResourceProvider> {
    provider: P,
    limits: SequenceLimits,
    tokenizer: Mutex<Option<Arc<P::Tokenizer>>>,
    config: Mutex<Option<Arc<ModelConfig>>>,
    model: Mutex<Option<Arc<Mutex<P::Model>>>>,
    tokenizer_loads: AtomicUsize,
    config_loads: AtomicUsize,
    model_loads: AtomicUsize,
}

impl<P: ResourceProvider> ModelRuntime<P> {
    pub fn new(provider: P) -> Self {
        Self::with_limits(provider, SequenceLimits::default())
    }

    pub fn with_limits(provider: P, limits: SequenceLimits) -> Self {
        Self {
            provider,
            limits,
            tokenizer: Mutex::new(None),
            config: Mutex::new(None),
            model: Mutex::new(None),
            tokenizer_loads: AtomicUsize::new(0),
            config_loads: AtomicUsize::new(0),
            model_loads: AtomicUsize::new(0),
        }
    }

    /// Translate `text`, loading any resource not yet cached. The model
    /// session is exclusive per run; independent callers share the cached
    /// tokenizer and config.
    pub fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let tokenizer = self.tokenizer()?;
        let config = self.config()?;
        let specials = SpecialTokens::resolve(config.as_ref(), tokenizer.as_ref())?;
        let model = self.model()?;

        let mut session = lock_unpoisoned(&model);
        let mut translator =
            Translator::new(tokenizer.as_ref(), &mut *session, specials, self.limits);
        translator.translate(text)
    }

    pub fn tokenizer(&self) -> Result<Arc<P::Tokenizer>, TranslateError> {
        let mut slot = lock_unpoisoned(&self.tokenizer);
        if let Some(cached) = slot.as_ref() {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new(self.provider.load_tokenizer()?);
        self.tokenizer_loads.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn config(&self) -> Result<Arc<ModelConfig>, TranslateError> {
        let mut slot = lock_unpoisoned(&self.config);
        if let Some(cached) = slot.as_ref() {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new(self.provider.load_config()?);
        self.config_loads.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn model(&self) -> Result<Arc<Mutex<P::Model>>, TranslateError> {
        let mut slot = lock_unpoisoned(&self.model);
        if let Some(cached) = slot.as_ref() {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new(Mutex::new(self.provider.load_model()?));
        self.model_loads.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop the cached model session only; the next translation reloads it.
    /// Tokenizer and config caches are left in place.
    pub fn clear_model_cache(&self) {
        let mut slot = lock_unpoisoned(&self.model);
        if slot.take().is_some() {
            log::info!("Model cache cleared; next translation reloads the model");
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        lock_unpoisoned(&self.model).is_some()
    }

    pub fn tokenizer_load_count(&self) -> usize {
        self.tokenizer_loads.load(Ordering::SeqCst)
    }

    pub fn config_load_count(&self) -> usize {
        self.config_loads.load(Ordering::SeqCst)
    }

    pub fn model_load_count(&self) -> usize {
        self.model_loads.load(Ordering::SeqCst)
    }

    pub fn download_status(&self) -> ModelDownloadStatus {
        let downloaded = self.is_model_loaded();
        let progress = current_download_progress();

        let percent = if downloaded {
            100
        } else {
            progress
                .as_ref()
                .filter(|p| p.total_bytes > 0)
                .map(|p| (p.downloaded_bytes * 100 / p.total_bytes) as u8)
                .unwrap_or(0)
        };

        ModelDownloadStatus {
            progress: percent,
            downloaded,
            error: progress.and_then(|p| p.error),
        }
    }
}

/// Production provider: resolves a local snapshot (downloading missing
/// assets) and loads each resource from it.
pub struct SnapshotProvider {
    options: ModelStoreOptions,
}

impl SnapshotProvider {
    pub fn new(options: ModelStoreOptions) -> Self {
        Self { options }
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self::new(ModelStoreOptions {
            root: Some(root),
            ..ModelStoreOptions::default()
        })
    }

    fn snapshot_dir(&self) -> Result<PathBuf, TranslateError> {
        model_store::resolve_snapshot_dir(&self.options)
    }
}

impl Default for SnapshotProvider {
    fn default() -> Self {
        Self::new(ModelStoreOptions::default())
    }
}

impl ResourceProvider for SnapshotProvider {
    type Tokenizer = HfTokenizer;
    type Model = OrtSeq2Seq;

    fn load_tokenizer(&self) -> Result<HfTokenizer, TranslateError> {
        let dir = self.snapshot_dir()?;
        HfTokenizer::from_file(dir.join(model_store::TOKENIZER_FILE))
            .map_err(|e| e.for_stage(LoadStage::Tokenizer))
    }

    fn load_config(&self) -> Result<ModelConfig, TranslateError> {
        let dir = self.snapshot_dir()?;
        ModelConfig::from_file(dir.join(model_store::CONFIG_FILE))
            .map_err(|e| e.for_stage(LoadStage::Config))
    }

    fn load_model(&self) -> Result<OrtSeq2Seq, TranslateError> {
        let dir = self.snapshot_dir()?;
        let weights = model_store::weights_path(&dir, self.options.quantized);
        OrtSeq2Seq::from_file(weights).map_err(|e| e.for_stage(LoadStage::Model))
    }
}
