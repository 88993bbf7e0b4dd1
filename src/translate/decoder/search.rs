use ndarray::{s, ErrorKind, ShapeError};

use crate::translate::engine::{Seq2SeqModel, SpecialTokens, StepInputs, TranslateError};

use super::state::{argmax, DecodeState, EncoderFeed};

/// Greedy autoregressive decode: one argmax token per step until the end id
/// or the target length bound. Exhausting the bound is not an error; the
/// caller gets whatever was generated.
pub fn decode_greedy<M: Seq2SeqModel>(
    model: &mut M,
    encoder: &EncoderFeed,
    specials: SpecialTokens,
    max_target: usize,
) -> Result<DecodeState, TranslateError> {
    let mut state = DecodeState::new(specials.start, specials.pad, max_target);

    for _step in 1..=max_target {
        let (decoder_input_ids, decoder_attention_mask) = state.decoder_feed()?;

        let logits = model.predict(StepInputs {
            input_ids: &encoder.input_ids,
            attention_mask: &encoder.attention_mask,
            decoder_input_ids: &decoder_input_ids,
            decoder_attention_mask: &decoder_attention_mask,
        })?;

        // The row for the most recently appended real token, which is not
        // the tensor's last row while the sequence is shorter than the bound.
        let row_index = state.len() - 1;
        let (_, rows, _) = logits.dim();
        if row_index >= rows {
            return Err(TranslateError::Shape(ShapeError::from_kind(
                ErrorKind::IncompatibleShape,
            )));
        }
        let row = logits.slice(s![0, row_index, ..]);
        let row = row.as_slice().ok_or_else(|| {
            TranslateError::Shape(ShapeError::from_kind(ErrorKind::IncompatibleShape))
        })?;

        let next = argmax(row) as u32;
        state.push(next);
        if next == specials.eos {
            break;
        }
    }

    Ok(state)
}
