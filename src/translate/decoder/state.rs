use ndarray::Array2;

use crate::translate::engine::{TokenizedText, TranslateError};

/// Right-truncate, then right-pad to exactly `len`.
pub(crate) fn pad_trunc(values: &[i64], len: usize, pad: i64) -> Vec<i64> {
    let mut out: Vec<i64> = values.iter().copied().take(len).collect();
    out.resize(len, pad);
    out
}

fn row_tensor(values: Vec<i64>, len: usize) -> Result<Array2<i64>, TranslateError> {
    Ok(Array2::from_shape_vec((1, len), values)?)
}

/// Fixed-shape encoder tensors for one request. Ids are padded with the pad
/// id, the mask with 0; both end up `[1, max_source]` regardless of input
/// length.
pub struct EncoderFeed {
    pub(crate) input_ids: Array2<i64>,
    pub(crate) attention_mask: Array2<i64>,
}

impl EncoderFeed {
    pub fn new(
        encoding: &TokenizedText,
        pad_id: u32,
        max_source: usize,
    ) -> Result<Self, TranslateError> {
        let ids: Vec<i64> = encoding.input_ids.iter().map(|&v| i64::from(v)).collect();
        let mask: Vec<i64> = encoding
            .attention_mask
            .iter()
            .map(|&v| i64::from(v))
            .collect();
        Ok(Self {
            input_ids: row_tensor(pad_trunc(&ids, max_source, i64::from(pad_id)), max_source)?,
            attention_mask: row_tensor(pad_trunc(&mask, max_source, 0), max_source)?,
        })
    }
}

/// Growing target sequence, seeded with the decoder start id. Grows by one
/// id per step; every feed built from it is exactly `max_target` wide.
pub struct DecodeState {
    tokens: Vec<u32>,
    pad_id: u32,
    max_target: usize,
}

impl DecodeState {
    pub fn new(start_id: u32, pad_id: u32, max_target: usize) -> Self {
        Self {
            tokens: vec![start_id],
            pad_id,
            max_target,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Decoder ids and mask for the current step. The mask's ones-count
    /// comes from the pre-padding sequence length, and the mask array is
    /// then padded to the final width on its own — same construction order
    /// as the ids.
    pub fn decoder_feed(&self) -> Result<(Array2<i64>, Array2<i64>), TranslateError> {
        let ids: Vec<i64> = self.tokens.iter().map(|&v| i64::from(v)).collect();
        let ids = pad_trunc(&ids, self.max_target, i64::from(self.pad_id));

        let ones = vec![1i64; self.tokens.len().min(self.max_target)];
        let mask = pad_trunc(&ones, self.max_target, 0);

        Ok((
            row_tensor(ids, self.max_target)?,
            row_tensor(mask, self.max_target)?,
        ))
    }

    pub fn push(&mut self, id: u32) {
        self.tokens.push(id);
    }

    /// Generated ids: the start token dropped, the rest cut before the
    /// first end id if one was emitted.
    pub fn into_output_ids(self, eos_id: u32) -> Vec<u32> {
        let mut out = self.tokens;
        out.remove(0);
        if let Some(pos) = out.iter().position(|&t| t == eos_id) {
            out.truncate(pos);
        }
        out
    }
}

/// Index of the largest value; ties resolve to the first index.
pub(crate) fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate().skip(1) {
        if v > row[best] {
            best = i;
        }
    }
    best
}
