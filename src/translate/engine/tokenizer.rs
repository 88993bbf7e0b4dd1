use std::path::Path;

use tokenizers::Tokenizer;

use super::config::TranslateError;

/// Ids and attention mask for one piece of text, special tokens included.
/// The two vectors always have equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Text <-> token-id boundary. Implementations expose whatever special ids
/// their vocabulary defines; absent ones are `None` and resolved by
/// `SpecialTokens::resolve`.
pub trait SubwordTokenizer {
    fn encode(&self, text: &str) -> Result<TokenizedText, TranslateError>;
    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, TranslateError>;
    fn bos_token_id(&self) -> Option<u32>;
    fn eos_token_id(&self) -> Option<u32>;
    fn pad_token_id(&self) -> Option<u32>;
}

impl<T: SubwordTokenizer + ?Sized> SubwordTokenizer for &T {
    fn encode(&self, text: &str) -> Result<TokenizedText, TranslateError> {
        (**self).encode(text)
    }
    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, TranslateError> {
        (**self).decode(ids, skip_special_tokens)
    }
    fn bos_token_id(&self) -> Option<u32> {
        (**self).bos_token_id()
    }
    fn eos_token_id(&self) -> Option<u32> {
        (**self).eos_token_id()
    }
    fn pad_token_id(&self) -> Option<u32> {
        (**self).pad_token_id()
    }
}

/// `tokenizer.json` backed tokenizer. Special ids are probed once at load
/// time from the usual token spellings.
pub struct HfTokenizer {
    inner: Tokenizer,
    bos: Option<u32>,
    eos: Option<u32>,
    pad: Option<u32>,
}

impl HfTokenizer {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TranslateError> {
        let inner = Tokenizer::from_file(path.as_ref())
            .map_err(|e| TranslateError::Tokenizer(e.to_string()))?;

        let bos = first_known_id(&inner, &["<s>", "<bos>"]);
        let eos = first_known_id(&inner, &["</s>", "<eos>", "<|endoftext|>"]);
        let pad = first_known_id(&inner, &["<pad>", "<PAD>"]);

        log::debug!(
            "Tokenizer loaded from {} (bos={bos:?} eos={eos:?} pad={pad:?})",
            path.as_ref().display()
        );
        Ok(Self {
            inner,
            bos,
            eos,
            pad,
        })
    }
}

fn first_known_id(tokenizer: &Tokenizer, spellings: &[&str]) -> Option<u32> {
    spellings.iter().find_map(|t| tokenizer.token_to_id(t))
}

impl SubwordTokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<TokenizedText, TranslateError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| TranslateError::Tokenizer(e.to_string()))?;
        Ok(TokenizedText {
            input_ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, TranslateError> {
        self.inner
            .decode(ids, skip_special_tokens)
            .map_err(|e| TranslateError::Tokenizer(e.to_string()))
    }

    fn bos_token_id(&self) -> Option<u32> {
        self.bos
    }

    fn eos_token_id(&self) -> Option<u32> {
        self.eos
    }

    fn pad_token_id(&self) -> Option<u32> {
        self.pad
    }
}
