//! Artifact loading from disk.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::Write;

use modelserve_core::model::load;
use modelserve_core::{Model, ServeError};

#[test]
fn loads_fixture_from_disk() {
    let m = load("tests/vectors/iris_forest.json").unwrap();
    assert_eq!(m.n_features(), 4);
    assert_eq!(m.trees().len(), 3);
}

#[test]
fn missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(dir.path().join("nope.json")).unwrap_err();
    match err {
        ServeError::Load(msg) => assert!(msg.contains("nope.json"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn corrupt_file_is_load_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"\x80\x04\x95joblib pickle bytes").unwrap();
    let err = load(f.path()).unwrap_err();
    assert_eq!(err.client_code().as_str(), "LOAD_FAILED");
}

#[test]
fn empty_file_is_load_error() {
    let f = tempfile::NamedTempFile::new().unwrap();
    assert!(matches!(load(f.path()), Err(ServeError::Load(_))));
}
