#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use csv_station::{
    dataset::Dataset,
    error::{Result, StationError},
    loader::{self, Fetch, LoadOptions, Source},
};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// The compiled `csv-station` binary.
pub fn station() -> Command {
    Command::cargo_bin("csv-station").expect("binary exists")
}

/// Fetcher for tests that must never reach the network.
pub struct Offline;

impl Fetch for Offline {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(StationError::Network(format!("offline: {url}")))
    }
}

/// Serves fixed bytes for any URL and records nothing.
pub struct Canned(pub Vec<u8>);

impl Fetch for Canned {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Loads a fixture the way an upload would be loaded.
pub fn load_fixture(name: &str) -> Dataset {
    let bytes = fs::read(fixture_path(name)).expect("read fixture");
    load_text(name, &String::from_utf8(bytes).expect("utf-8 fixture"))
}

/// Loads `text` as an uploaded file called `file_name`.
pub fn load_text(file_name: &str, text: &str) -> Dataset {
    let source = Source::Upload {
        file_name: file_name.to_string(),
        bytes: text.as_bytes().to_vec(),
    };
    loader::load(&source, &LoadOptions::default(), &Offline)
        .expect("load dataset")
        .dataset
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }
}
