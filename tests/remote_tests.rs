use linguatools::remote::{is_supported, language_name, RemoteError, RemoteTranslator, LANGUAGES};

#[test]
fn language_table_covers_common_codes() {
    assert!(LANGUAGES.len() > 100);
    assert_eq!(language_name("en"), Some("English"));
    assert_eq!(language_name("fr"), Some("French"));
    assert_eq!(language_name("zh-CN"), Some("Chinese (Simplified)"));
    assert_eq!(language_name("xx"), None);
}

#[test]
fn supported_lookup_matches_table() {
    assert!(is_supported("de"));
    assert!(!is_supported("tlh"));
}

#[test]
fn empty_text_is_rejected_before_any_request() {
    let client = RemoteTranslator::new("http://127.0.0.1:9/api/translate");
    match client.translate("", None, "fr") {
        Err(RemoteError::MissingInput) => {}
        other => panic!("expected MissingInput, got {other:?}"),
    }
}

#[test]
fn missing_target_language_is_rejected_before_any_request() {
    let client = RemoteTranslator::new("http://127.0.0.1:9/api/translate");
    match client.translate("bonjour", Some("fr"), "") {
        Err(RemoteError::MissingInput) => {}
        other => panic!("expected MissingInput, got {other:?}"),
    }
}
