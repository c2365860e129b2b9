pub mod mock_api;

use std::path::PathBuf;

/// Write `contents` to `name` inside `dir` and return the full path.
pub fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture file");
    path
}
