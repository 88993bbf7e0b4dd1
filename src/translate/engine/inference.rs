use std::time::Instant;

use super::config::{SequenceLimits, SpecialTokens, TranslateError};
use super::model::Seq2SeqModel;
use super::tokenizer::SubwordTokenizer;
use crate::translate::decoder::{decode_greedy, EncoderFeed};

/// Tokenizer, model and resolved special ids wired together; drives one
/// translation request end to end.
pub struct Translator<T, M> {
    tokenizer: T,
    model: M,
    specials: SpecialTokens,
    limits: SequenceLimits,
}

impl<T: SubwordTokenizer, M: Seq2SeqModel> Translator<T, M> {
    pub fn new(tokenizer: T, model: M, specials: SpecialTokens, limits: SequenceLimits) -> Self {
        Self {
            tokenizer,
            model,
            specials,
            limits,
        }
    }

    pub fn specials(&self) -> SpecialTokens {
        self.specials
    }

    /// Tokenize, run the greedy decode loop, and detokenize. Empty input is
    /// fine; output truncated at the length bound is success, not an error.
    pub fn translate(&mut self, text: &str) -> Result<String, TranslateError> {
        let start = Instant::now();

        let encoding = self.tokenizer.encode(text)?;
        let source_len = encoding.input_ids.len();
        let feed = EncoderFeed::new(&encoding, self.specials.pad, self.limits.max_source)?;

        let state = decode_greedy(
            &mut self.model,
            &feed,
            self.specials,
            self.limits.max_target,
        )?;

        let output_ids = state.into_output_ids(self.specials.eos);
        let translated = self.tokenizer.decode(&output_ids, true)?;

        log::debug!(
            "Translated {source_len} -> {} tokens in {:?}",
            output_ids.len(),
            start.elapsed()
        );
        Ok(translated)
    }
}
