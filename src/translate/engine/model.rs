use std::path::Path;
use std::time::Instant;

use ndarray::{Array2, Array3, ArrayD, Ix3};
use num_cpus::get_physical;
use ort::{
    execution_providers::CPUExecutionProvider,
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};

use super::config::TranslateError;

const THREAD_ENV: &str = "ORT_THREADS";

/// Input names fixed by the exported serving signature.
pub const INPUT_IDS: &str = "serving_default_input_ids:0";
pub const ATTENTION_MASK: &str = "serving_default_attention_mask:0";
pub const DECODER_INPUT_IDS: &str = "serving_default_decoder_input_ids:0";
pub const DECODER_ATTENTION_MASK: &str = "serving_default_decoder_attention_mask:0";

const OUTPUT_LOGITS: &str = "StatefulPartitionedCall:0";

fn resolve_thread_count() -> usize {
    std::env::var(THREAD_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(get_physical)
}

/// One decoding step's inputs. Encoder tensors are `[1, max_source]`,
/// decoder tensors `[1, max_target]`, every step.
pub struct StepInputs<'a> {
    pub input_ids: &'a Array2<i64>,
    pub attention_mask: &'a Array2<i64>,
    pub decoder_input_ids: &'a Array2<i64>,
    pub decoder_attention_mask: &'a Array2<i64>,
}

/// Encoder-decoder model boundary. Returns next-token logits for every
/// target position, shape `[1, max_target, vocab]`.
pub trait Seq2SeqModel {
    fn predict(&mut self, step: StepInputs<'_>) -> Result<Array3<f32>, TranslateError>;
}

impl<M: Seq2SeqModel + ?Sized> Seq2SeqModel for &mut M {
    fn predict(&mut self, step: StepInputs<'_>) -> Result<Array3<f32>, TranslateError> {
        (**self).predict(step)
    }
}

/// ONNX Runtime session wrapper for the exported translation graph.
pub struct OrtSeq2Seq {
    session: Session,
}

impl Drop for OrtSeq2Seq {
    fn drop(&mut self) {
        log::debug!("Dropping translation model session");
    }
}

impl OrtSeq2Seq {
    pub fn from_file<P: AsRef<Path>>(model_path: P) -> Result<Self, TranslateError> {
        let start = Instant::now();
        let threads = resolve_thread_count();
        let opt = if cfg!(target_os = "windows") {
            GraphOptimizationLevel::Level1
        } else {
            GraphOptimizationLevel::Level3
        };
        let session = Session::builder()?
            .with_optimization_level(opt)?
            .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
            .with_parallel_execution(true)?
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?
            .commit_from_file(model_path.as_ref())?;

        log::info!("Translation model initialized in {:?}", start.elapsed());
        Ok(Self { session })
    }
}

impl Seq2SeqModel for OrtSeq2Seq {
    fn predict(&mut self, step: StepInputs<'_>) -> Result<Array3<f32>, TranslateError> {
        let outputs = self.session.run(inputs![
            INPUT_IDS => TensorRef::from_array_view(step.input_ids.view())?,
            ATTENTION_MASK => TensorRef::from_array_view(step.attention_mask.view())?,
            DECODER_INPUT_IDS => TensorRef::from_array_view(step.decoder_input_ids.view())?,
            DECODER_ATTENTION_MASK => TensorRef::from_array_view(step.decoder_attention_mask.view())?,
        ])?;

        let logits: ArrayD<f32> = outputs
            .get(OUTPUT_LOGITS)
            .ok_or_else(|| TranslateError::OutputNotFound(OUTPUT_LOGITS.into()))?
            .try_extract_array()?
            .to_owned();

        Ok(logits.into_dimensionality::<Ix3>()?)
    }
}
