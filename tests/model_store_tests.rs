use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use linguatools::translate::{
    current_download_progress, mark_finished, missing_model_files, record_failure,
    resolve_snapshot_dir, set_file_index, start_tracking, weights_path, ModelStoreOptions,
    TranslateError,
};

fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "{prefix}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn missing_model_files_detects_incomplete_snapshot() {
    let snapshot = temp_dir("translate_missing_snapshot");

    let initial_missing = missing_model_files(&snapshot);
    assert!(
        initial_missing.contains(&"tokenizer.json".to_string()),
        "expected a known model file to be missing in an empty snapshot"
    );

    for file in &initial_missing {
        std::fs::write(snapshot.join(file), b"ok").expect("write should succeed");
    }

    assert!(missing_model_files(&snapshot).is_empty());

    let _ = std::fs::remove_dir_all(&snapshot);
}

#[test]
fn resolve_prefers_complete_pinned_snapshot() {
    let root = temp_dir("translate_store_root");

    let snapshot = root.join("snapshots").join("local");
    std::fs::create_dir_all(&snapshot).unwrap();
    for file in missing_model_files(&snapshot) {
        std::fs::write(snapshot.join(file), b"ok").unwrap();
    }
    std::fs::create_dir_all(root.join("refs")).unwrap();
    std::fs::write(root.join("refs").join("main"), "local").unwrap();

    let options = ModelStoreOptions {
        root: Some(root.clone()),
        allow_download: false,
        ..ModelStoreOptions::default()
    };
    let resolved = resolve_snapshot_dir(&options).unwrap();
    assert_eq!(resolved, snapshot);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn resolve_without_snapshot_or_download_is_unavailable() {
    let root = temp_dir("translate_store_empty");

    let options = ModelStoreOptions {
        root: Some(root.clone()),
        allow_download: false,
        ..ModelStoreOptions::default()
    };
    match resolve_snapshot_dir(&options) {
        Err(TranslateError::ResourceUnavailable(_)) => {}
        other => panic!("expected ResourceUnavailable, got {other:?}"),
    }

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn incomplete_snapshot_without_download_is_unavailable() {
    let root = temp_dir("translate_store_partial");

    let snapshot = root.join("snapshots").join("local");
    std::fs::create_dir_all(&snapshot).unwrap();
    // Only one of the required assets present.
    std::fs::write(snapshot.join("config.json"), b"{}").unwrap();
    std::fs::create_dir_all(root.join("refs")).unwrap();
    std::fs::write(root.join("refs").join("main"), "local").unwrap();

    let options = ModelStoreOptions {
        root: Some(root.clone()),
        allow_download: false,
        ..ModelStoreOptions::default()
    };
    match resolve_snapshot_dir(&options) {
        Err(TranslateError::ResourceUnavailable(_)) => {}
        other => panic!("expected ResourceUnavailable, got {other:?}"),
    }

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn weights_path_prefers_quantized_when_present() {
    let snapshot = temp_dir("translate_store_weights");

    let fp32 = weights_path(&snapshot, true);
    assert!(fp32.to_string_lossy().ends_with(".onnx"));
    assert!(!fp32.to_string_lossy().contains("int8"));

    let quantized_name = missing_model_files(&snapshot)
        .into_iter()
        .find(|f| f.contains("int8"))
        .expect("store should list a quantized weights file");
    std::fs::write(snapshot.join(&quantized_name), b"ok").unwrap();

    assert!(weights_path(&snapshot, true)
        .to_string_lossy()
        .contains("int8"));
    assert!(!weights_path(&snapshot, false)
        .to_string_lossy()
        .contains("int8"));

    let _ = std::fs::remove_dir_all(&snapshot);
}

#[test]
fn download_progress_lifecycle_is_coherent() {
    start_tracking(3);
    let p = current_download_progress().expect("progress should be initialized");
    assert_eq!(p.file_count, 3);
    assert_eq!(p.file_index, 0);
    assert!(!p.done);
    assert_eq!(p.downloaded_bytes, 0);
    assert_eq!(p.total_bytes, 0);
    assert!(p.error.is_none());

    set_file_index(1);
    let p = current_download_progress().unwrap();
    assert_eq!(p.file_index, 1);

    mark_finished();
    let p = current_download_progress().unwrap();
    assert!(p.done);
    assert_eq!(p.file_index, 3);
    assert!(p.error.is_none());

    record_failure("network error".to_string());
    let p = current_download_progress().unwrap();
    assert!(p.done);
    assert_eq!(p.error.as_deref(), Some("network error"));
}

#[test]
fn store_defaults_allow_download() {
    let options = ModelStoreOptions::default();
    assert!(options.allow_download);
    assert!(options.quantized);
    assert!(options.root.is_none());
}
