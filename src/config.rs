//! Manager configuration
//!
//! All values are supplied before a rent/drop-off cycle begins; nothing is
//! reconfigured mid-cycle. Mutation goes through explicit setters so test
//! harnesses can flip flags between cycles without reaching into fields.

use std::path::{Path, PathBuf};

/// Default directory (under the test directory) holding extracted cassettes
pub const CASSETTE_DIRECTORY: &str = "cassettes";

/// Default archive file name (under the test directory)
pub const CASSETTE_FILE: &str = "vcr_cassettes.tar.gz";

/// Default test directory
pub const TEST_DIRECTORY: &str = "test";

/// Whether the cassette directory is wiped before extraction by default
pub const WIPE_CASSETTE_DIR: bool = true;

/// Construction-time settings for a [`crate::CassetteManager`]
#[derive(Debug, Clone)]
pub struct Config {
    test_directory: PathBuf,
    cassette_directory: String,
    cassette_file: String,
    local_mode: bool,
    wipe_cassette_dir: bool,
    silent: bool,
    tracking_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_directory: PathBuf::from(TEST_DIRECTORY),
            cassette_directory: CASSETTE_DIRECTORY.to_string(),
            cassette_file: CASSETTE_FILE.to_string(),
            local_mode: false,
            wipe_cassette_dir: WIPE_CASSETTE_DIR,
            silent: false,
            tracking_enabled: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory the cassette directory and archive file live under
    pub fn test_directory(&self) -> &Path {
        &self.test_directory
    }

    /// Name of the cassette directory under the test directory
    pub fn cassette_directory(&self) -> &str {
        &self.cassette_directory
    }

    /// Name of the archive file under the test directory
    pub fn cassette_file(&self) -> &str {
        &self.cassette_file
    }

    pub fn local_mode(&self) -> bool {
        self.local_mode
    }

    pub fn wipe_cassette_dir(&self) -> bool {
        self.wipe_cassette_dir
    }

    pub fn silent(&self) -> bool {
        self.silent
    }

    /// Whether extraction records a baseline fingerprint for comparison
    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }

    /// Full path of the directory cassettes are extracted into
    pub fn cassette_dir_path(&self) -> PathBuf {
        self.test_directory.join(&self.cassette_directory)
    }

    /// Full path of the archive file
    pub fn archive_file_path(&self) -> PathBuf {
        self.test_directory.join(&self.cassette_file)
    }

    pub fn set_test_directory(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.test_directory = dir.into();
        self
    }

    pub fn set_cassette_directory(&mut self, name: impl Into<String>) -> &mut Self {
        self.cassette_directory = name.into();
        self
    }

    pub fn set_cassette_file(&mut self, name: impl Into<String>) -> &mut Self {
        self.cassette_file = name.into();
        self
    }

    /// Disables destructive operations (directory wipe) for this manager
    pub fn set_local_mode(&mut self, local: bool) -> &mut Self {
        self.local_mode = local;
        self
    }

    pub fn set_wipe_cassette_dir(&mut self, wipe: bool) -> &mut Self {
        self.wipe_cassette_dir = wipe;
        self
    }

    pub fn set_silent(&mut self, silent: bool) -> &mut Self {
        self.silent = silent;
        self
    }

    pub fn set_tracking_enabled(&mut self, enabled: bool) -> &mut Self {
        self.tracking_enabled = enabled;
        self
    }
}
