use std::time::{SystemTime, UNIX_EPOCH};

use linguatools::translate::{
    LoadStage, ModelConfig, SpecialTokens, SubwordTokenizer, TokenizedText, TranslateError,
};

/// Tokenizer stub exposing a configurable set of special ids.
struct IdsOnly {
    bos: Option<u32>,
    eos: Option<u32>,
    pad: Option<u32>,
}

impl SubwordTokenizer for IdsOnly {
    fn encode(&self, _text: &str) -> Result<TokenizedText, TranslateError> {
        Ok(TokenizedText {
            input_ids: Vec::new(),
            attention_mask: Vec::new(),
        })
    }

    fn decode(&self, _ids: &[u32], _skip_special_tokens: bool) -> Result<String, TranslateError> {
        Ok(String::new())
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

#[test]
fn special_ids_prefer_config_decoder_start() {
    let config = ModelConfig {
        decoder_start_token_id: Some(59513),
        ..ModelConfig::default()
    };
    let tokenizer = IdsOnly {
        bos: Some(1),
        eos: Some(2),
        pad: Some(0),
    };

    let specials = SpecialTokens::resolve(&config, &tokenizer).unwrap();
    assert_eq!(specials.start, 59513);
    assert_eq!(specials.eos, 2);
    assert_eq!(specials.pad, 0);
}

#[test]
fn special_ids_fall_back_to_tokenizer_bos() {
    let tokenizer = IdsOnly {
        bos: Some(1),
        eos: Some(2),
        pad: None,
    };

    let specials = SpecialTokens::resolve(&ModelConfig::default(), &tokenizer).unwrap();
    assert_eq!(specials.start, 1);
    // No pad id anywhere defaults to 0.
    assert_eq!(specials.pad, 0);
}

#[test]
fn missing_start_id_is_a_config_load_failure() {
    let tokenizer = IdsOnly {
        bos: None,
        eos: Some(2),
        pad: None,
    };

    let err = SpecialTokens::resolve(&ModelConfig::default(), &tokenizer).unwrap_err();
    match err {
        TranslateError::Load { stage, .. } => assert_eq!(stage, LoadStage::Config),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_eos_id_is_a_tokenizer_load_failure() {
    let tokenizer = IdsOnly {
        bos: Some(1),
        eos: None,
        pad: None,
    };

    let err = SpecialTokens::resolve(&ModelConfig::default(), &tokenizer).unwrap_err();
    match err {
        TranslateError::Load { stage, .. } => assert_eq!(stage, LoadStage::Tokenizer),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn model_config_parses_hf_config_json() {
    let temp_dir = std::env::temp_dir().join(format!(
        "translate_config_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&temp_dir).expect("temp dir should be creatable");

    let path = temp_dir.join("config.json");
    std::fs::write(
        &path,
        r#"{
            "architectures": ["MarianMTModel"],
            "decoder_start_token_id": 59513,
            "eos_token_id": 0,
            "pad_token_id": 59513,
            "vocab_size": 59514
        }"#,
    )
    .expect("write should succeed");

    let config = ModelConfig::from_file(&path).unwrap();
    assert_eq!(config.decoder_start_token_id, Some(59513));
    assert_eq!(config.eos_token_id, Some(0));
    assert_eq!(config.pad_token_id, Some(59513));

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[test]
fn user_message_download() {
    let err = TranslateError::Download("connection failed".to_string());
    let msg = err.user_message();
    assert!(msg.contains("download") || msg.contains("internet"));
}

#[test]
fn user_message_snapshot_not_found() {
    let err = TranslateError::SnapshotNotFound("/path/to/model".to_string());
    let msg = err.user_message();
    assert!(msg.contains("missing") || msg.contains("corrupted"));
}

#[test]
fn user_message_resource_unavailable() {
    let err = TranslateError::ResourceUnavailable("no cache dir".to_string());
    assert!(!err.user_message().is_empty());
}

#[test]
fn user_message_io() {
    let err = TranslateError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "file not found",
    ));
    let msg = err.user_message();
    assert!(msg.contains("read") || msg.contains("write") || msg.contains("files"));
}

#[test]
fn user_message_runtime_errors() {
    let err = TranslateError::OutputNotFound("logits".to_string());
    assert!(!err.user_message().is_empty());

    let err = TranslateError::Tokenizer("bad vocab".to_string());
    assert!(!err.user_message().is_empty());
}

#[test]
fn load_failures_are_classified() {
    assert!(TranslateError::Download("x".into()).is_load_failure());
    assert!(TranslateError::SnapshotNotFound("x".into()).is_load_failure());
    assert!(TranslateError::Load {
        stage: LoadStage::Model,
        reason: "x".into()
    }
    .is_load_failure());
    assert!(!TranslateError::OutputNotFound("x".into()).is_load_failure());
}

#[test]
fn display_includes_details() {
    let err = TranslateError::Download("timeout".to_string());
    let display = format!("{err}");
    assert!(display.contains("timeout"));

    let err = TranslateError::Load {
        stage: LoadStage::Model,
        reason: "bad graph".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("model") && display.contains("bad graph"));
}
