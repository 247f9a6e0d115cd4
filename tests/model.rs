use replan::model::Model;
use std::path::{Path, PathBuf};

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    Path::new(file!())
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
        .join("hybrid")
}

/// An integration test which attempts to load the demo model
#[test]
fn test_model_from_path() {
    Model::from_path(get_model_dir()).unwrap();
}
