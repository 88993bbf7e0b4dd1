pub mod config;
mod inference;
mod model;
mod tokenizer;

pub use config::{LoadStage, ModelConfig, SequenceLimits, SpecialTokens, TranslateError};
pub use inference::Translator;
pub use model::{OrtSeq2Seq, Seq2SeqModel, StepInputs};
pub use tokenizer::{HfTokenizer, SubwordTokenizer, TokenizedText};
