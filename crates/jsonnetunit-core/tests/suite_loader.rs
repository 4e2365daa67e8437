//! SuiteLoader against a recording transport and a temp mirror directory.

use std::fs;
use std::sync::Arc;

use jsonnetunit_core::{SuiteLoadError, SuiteLoader, DEFAULT_SUITE_URL};
use jsonnetunit_fetch::fakes::RecordingTransport;

const TYPE_SUITE: &str = r#"[
    {
        "description": "string type matches strings",
        "schema": {"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "string"},
        "tests": [
            {"description": "1 is not a string", "data": 1, "valid": false},
            {"description": "a string is a string", "data": "foo", "valid": true}
        ]
    }
]"#;

fn type_url() -> String {
    format!("{DEFAULT_SUITE_URL}draft2020-12/type.json")
}

#[test]
fn empty_mirror_fetches_once_then_reads_locally() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new().with_response(&type_url(), TYPE_SUITE));
    let loader = SuiteLoader::new(dir.path().join("suites"), DEFAULT_SUITE_URL, transport.clone());

    let first = loader.load("draft2020-12/type.json").expect("first load");
    assert_eq!(transport.calls(), 1);
    assert_eq!(transport.requested(), vec![type_url()]);

    let mirrored = dir.path().join("suites/draft2020-12/type.json");
    assert_eq!(fs::read_to_string(&mirrored).unwrap(), TYPE_SUITE);

    let second = loader.load("draft2020-12/type.json").expect("second load");
    assert_eq!(transport.calls(), 1, "second load must not hit the network");
    assert_eq!(first, second);

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].description, "string type matches strings");
    assert_eq!(first[0].tests.len(), 2);
    assert!(!first[0].tests[0].valid);
    assert!(first[0].tests[1].valid);
}

#[test]
fn existing_mirror_needs_no_network() {
    let dir = tempfile::tempdir().unwrap();
    let mirrored = dir.path().join("suites/draft2020-12/type.json");
    fs::create_dir_all(mirrored.parent().unwrap()).unwrap();
    fs::write(&mirrored, TYPE_SUITE).unwrap();

    let transport = Arc::new(RecordingTransport::new());
    let loader = SuiteLoader::new(dir.path().join("suites"), DEFAULT_SUITE_URL, transport.clone());

    let suites = loader.load("draft2020-12/type.json").unwrap();
    assert_eq!(suites.len(), 1);
    assert_eq!(transport.calls(), 0);
}

#[test]
fn non_2xx_is_terminal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new().with_status(&type_url(), 404));
    let loader = SuiteLoader::new(dir.path().join("suites"), DEFAULT_SUITE_URL, transport.clone());

    let err = loader.load("draft2020-12/type.json").unwrap_err();
    match &err {
        SuiteLoadError::Sync { url, source } => {
            assert_eq!(url, &type_url());
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("expected Sync error, got {other:?}"),
    }
    assert!(err.to_string().contains("sync failed from"));
    assert_eq!(transport.calls(), 1);
    assert!(!dir.path().join("suites/draft2020-12/type.json").exists());
}

#[test]
fn malformed_suite_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new().with_response(&type_url(), "{\"not\": \"an array\"}"));
    let loader = SuiteLoader::new(dir.path().join("suites"), DEFAULT_SUITE_URL, transport);

    let err = loader.load("draft2020-12/type.json").unwrap_err();
    assert!(matches!(err, SuiteLoadError::Decode { .. }), "got {err:?}");
}

#[test]
fn traversal_names_are_rejected_before_any_io() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let loader = SuiteLoader::new(dir.path().join("suites"), DEFAULT_SUITE_URL, transport.clone());

    let err = loader.load("../../etc/passwd").unwrap_err();
    assert!(matches!(err, SuiteLoadError::InvalidName(_)));
    assert_eq!(transport.calls(), 0);
}
