//! Cassette lifecycle orchestration
//!
//! [`CassetteManager`] drives one rent/drop-off cycle: extract the archive
//! into the working directory before tests run, fingerprint what came out,
//! and repack the archive afterwards only if a recording was added or
//! changed. Archive I/O, notices, and mode detection are injected
//! collaborators; the manager owns the decision-making.

use anyhow::{Context, Result};
use std::fs;

use crate::archive::{ArchiveAdapter, TarGzArchiver};
use crate::comparator;
use crate::config::Config;
use crate::fingerprint::{self, FingerprintMap};
use crate::mode::{EnvMode, ModeProvider};
use crate::output::{ConsoleSink, NoticeSink, SilentSink};

/// Result of an extraction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentOutcome {
    /// Cassettes were extracted into the working directory
    Extracted,
    /// The configured archive file does not exist; nothing was touched
    MissingArchive,
    /// The global local-mode override is active; nothing was touched
    SkippedLocalMode,
}

impl RentOutcome {
    pub fn extracted(self) -> bool {
        self == Self::Extracted
    }
}

/// Result of a repackaging attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOffOutcome {
    /// A new archive was written over the old one
    Repackaged,
    /// Nothing added or modified; zero filesystem writes occurred
    Unchanged,
    /// The global local-mode override is active; nothing was touched
    SkippedLocalMode,
}

impl DropOffOutcome {
    pub fn repackaged(self) -> bool {
        self == Self::Repackaged
    }
}

/// Manages cassette packaging and unpackaging for one working set
pub struct CassetteManager {
    config: Config,
    archiver: Box<dyn ArchiveAdapter>,
    sink: Box<dyn NoticeSink>,
    mode: Box<dyn ModeProvider>,
    baseline: FingerprintMap,
}

impl CassetteManager {
    /// Build a manager with the default collaborators: tar.gz archiver,
    /// console (or silent) notices, and `VCR_MODE` environment detection
    pub fn new(config: Config) -> Self {
        let sink: Box<dyn NoticeSink> = if config.silent() {
            Box::new(SilentSink)
        } else {
            Box::new(ConsoleSink)
        };
        Self::with_parts(config, Box::new(TarGzArchiver), sink, Box::new(EnvMode))
    }

    /// Build a manager with every collaborator injected
    pub fn with_parts(
        config: Config,
        archiver: Box<dyn ArchiveAdapter>,
        sink: Box<dyn NoticeSink>,
        mode: Box<dyn ModeProvider>,
    ) -> Self {
        Self {
            config,
            archiver,
            sink,
            mode,
            baseline: FingerprintMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Baseline fingerprint recorded by the last extraction
    pub fn baseline(&self) -> &FingerprintMap {
        &self.baseline
    }

    /// Flip silent mode by swapping the notice sink
    ///
    /// Only meaningful for managers built with [`CassetteManager::new`]; a
    /// custom injected sink is replaced by the stock console/silent one.
    pub fn set_silent(&mut self, silent: bool) {
        self.config.set_silent(silent);
        self.sink = if silent {
            Box::new(SilentSink)
        } else {
            Box::new(ConsoleSink)
        };
    }

    /// Extract the archive into the cassette directory and record a baseline
    ///
    /// Returns [`RentOutcome::MissingArchive`] (with no filesystem changes)
    /// when the configured archive file does not exist, and
    /// [`RentOutcome::SkippedLocalMode`] when the mode provider reports the
    /// local override. The cassette directory is wiped first when the wipe
    /// policy is on, unless `local_mode` disables destructive operations.
    pub fn rent(&mut self) -> Result<RentOutcome> {
        if self.mode.is_local() {
            return Ok(RentOutcome::SkippedLocalMode);
        }

        let archive = self.config.archive_file_path();
        if !archive.exists() {
            self.sink
                .notice(&format!("File does not exist: {}.", archive.display()));
            return Ok(RentOutcome::MissingArchive);
        }

        if self.config.wipe_cassette_dir() {
            self.remove_existing_cassette_directory()?;
        }

        let dir = self.config.cassette_dir_path();
        self.sink
            .notice(&format!("Extracting VCR cassettes to {}", dir.display()));
        self.archiver
            .extract_all(&archive, &dir)
            .with_context(|| format!("Failed to extract cassettes from {}", archive.display()))?;

        if self.config.tracking_enabled() {
            self.baseline = fingerprint::capture(&dir);
        }

        Ok(RentOutcome::Extracted)
    }

    /// Repack the archive if anything was added or modified since `rent`
    ///
    /// Compares a fresh fingerprint of the cassette directory against the
    /// baseline. With no baseline (rent never ran, or tracking disabled) the
    /// archive is always rewritten; with only deletions it never is. `force`
    /// rewrites regardless of the comparison. When nothing is rewritten the
    /// operation performs zero filesystem writes, so repeated calls leave
    /// the archive bytes and timestamps untouched.
    pub fn drop_off(&mut self, force: bool) -> Result<DropOffOutcome> {
        if self.mode.is_local() {
            return Ok(DropOffOutcome::SkippedLocalMode);
        }

        let dir = self.config.cassette_dir_path();
        let current = fingerprint::capture(&dir);
        let comparison = comparator::compare(&self.baseline, &current, self.sink.as_ref());

        if !(comparison.rewind || force) {
            return Ok(DropOffOutcome::Unchanged);
        }

        let archive = self.config.archive_file_path();
        self.sink.notice(&format!(
            "Recreating cassette file {}",
            self.config.cassette_file()
        ));
        self.archiver
            .create_archive(&dir, &archive)
            .with_context(|| format!("Failed to recreate archive {}", archive.display()))?;

        Ok(DropOffOutcome::Repackaged)
    }

    /// Alias for [`CassetteManager::rent`]
    pub fn setup(&mut self) -> Result<RentOutcome> {
        self.rent()
    }

    /// Alias for [`CassetteManager::drop_off`]
    pub fn teardown(&mut self, force: bool) -> Result<DropOffOutcome> {
        self.drop_off(force)
    }

    fn remove_existing_cassette_directory(&self) -> Result<()> {
        if self.config.local_mode() {
            return Ok(());
        }

        let dir = self.config.cassette_dir_path();
        if !dir.is_dir() {
            return Ok(());
        }

        self.sink
            .notice(&format!("Wiping cassettes directory: {}", dir.display()));
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to wipe cassettes directory {}", dir.display()))?;

        Ok(())
    }
}

impl std::fmt::Debug for CassetteManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassetteManager")
            .field("config", &self.config)
            .field("baseline_entries", &self.baseline.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FixedMode;
    use crate::output::MemorySink;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Archive two recordings into `<test_dir>/vcr_cassettes.tar.gz`
    fn seed_archive(test_dir: &Path) {
        let staging = test_dir.join("staging");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("match_requests_on.yml"), "recorded body one").unwrap();
        fs::write(staging.join("fake_example_response.yml"), "recorded body two").unwrap();

        fs::create_dir_all(test_dir).unwrap();
        TarGzArchiver
            .create_archive(&staging, &test_dir.join(crate::config::CASSETTE_FILE))
            .unwrap();
        fs::remove_dir_all(&staging).unwrap();
    }

    fn test_config(test_dir: &Path) -> Config {
        let mut config = Config::new();
        config.set_test_directory(test_dir).set_silent(true);
        config
    }

    fn manager_with(config: Config, mode: FixedMode) -> CassetteManager {
        CassetteManager::with_parts(
            config,
            Box::new(TarGzArchiver),
            Box::new(SilentSink),
            Box::new(mode),
        )
    }

    fn manager(test_dir: &Path) -> CassetteManager {
        manager_with(test_config(test_dir), FixedMode::none())
    }

    #[test]
    fn test_rent_missing_archive_returns_failure_and_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut mgr = manager(temp_dir.path());

        let outcome = mgr.rent().unwrap();

        assert_eq!(outcome, RentOutcome::MissingArchive);
        assert!(!outcome.extracted());
        assert!(!mgr.config().cassette_dir_path().exists());
    }

    #[test]
    fn test_rent_extracts_cassettes() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());

        assert_eq!(mgr.rent().unwrap(), RentOutcome::Extracted);

        let dir = mgr.config().cassette_dir_path();
        assert_eq!(
            fs::read_to_string(dir.join("match_requests_on.yml")).unwrap(),
            "recorded body one"
        );
        assert_eq!(
            fs::read_to_string(dir.join("fake_example_response.yml")).unwrap(),
            "recorded body two"
        );
    }

    #[test]
    fn test_rent_records_baseline_for_each_cassette() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());

        mgr.rent().unwrap();

        assert!(mgr.baseline().contains_key("match_requests_on.yml"));
        assert!(mgr.baseline().contains_key("fake_example_response.yml"));
        assert_eq!(mgr.baseline().len(), 2);
    }

    #[test]
    fn test_rent_skips_baseline_when_tracking_disabled() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut config = test_config(temp_dir.path());
        config.set_tracking_enabled(false);
        let mut mgr = manager_with(config, FixedMode::none());

        mgr.rent().unwrap();

        assert!(mgr.baseline().is_empty());
    }

    #[test]
    fn test_rent_is_a_noop_in_local_env_mode() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager_with(test_config(temp_dir.path()), FixedMode::local());

        let outcome = mgr.rent().unwrap();

        assert_eq!(outcome, RentOutcome::SkippedLocalMode);
        assert!(!mgr.config().cassette_dir_path().exists());
    }

    #[test]
    fn test_rent_wipes_stale_files_from_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());

        mgr.rent().unwrap();
        let stale = mgr.config().cassette_dir_path().join("fakefile");
        fs::write(&stale, "stale").unwrap();

        mgr.rent().unwrap();

        assert!(!stale.exists());
    }

    #[test]
    fn test_rent_keeps_stale_files_when_local_mode_disables_wipe() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut config = test_config(temp_dir.path());
        config.set_local_mode(true);
        let mut mgr = manager_with(config, FixedMode::none());

        mgr.rent().unwrap();
        let stale = mgr.config().cassette_dir_path().join("fakefile");
        fs::write(&stale, "stale").unwrap();

        mgr.rent().unwrap();

        assert!(stale.exists());
    }

    #[test]
    fn test_rent_keeps_stale_files_when_wipe_policy_is_off() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut config = test_config(temp_dir.path());
        config.set_wipe_cassette_dir(false);
        let mut mgr = manager_with(config, FixedMode::none());

        mgr.rent().unwrap();
        let stale = mgr.config().cassette_dir_path().join("fakefile");
        fs::write(&stale, "stale").unwrap();

        mgr.rent().unwrap();

        assert!(stale.exists());
    }

    #[test]
    fn test_drop_off_without_changes_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());
        mgr.rent().unwrap();

        let archive = mgr.config().archive_file_path();
        let bytes_before = fs::read(&archive).unwrap();
        let mtime_before = fs::metadata(&archive).unwrap().modified().unwrap();

        let outcome = mgr.drop_off(false).unwrap();

        assert_eq!(outcome, DropOffOutcome::Unchanged);
        assert_eq!(fs::read(&archive).unwrap(), bytes_before);
        assert_eq!(
            fs::metadata(&archive).unwrap().modified().unwrap(),
            mtime_before
        );

        // Repeated calls stay idempotent
        assert_eq!(mgr.drop_off(false).unwrap(), DropOffOutcome::Unchanged);
    }

    #[test]
    fn test_drop_off_rewrites_after_a_recording_changes() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());
        mgr.rent().unwrap();

        let archive = mgr.config().archive_file_path();
        let bytes_before = fs::read(&archive).unwrap();

        let cassette = mgr
            .config()
            .cassette_dir_path()
            .join("fake_example_response.yml");
        fs::write(&cassette, "recorded body two plus new recording").unwrap();

        let outcome = mgr.drop_off(false).unwrap();

        assert!(outcome.repackaged());
        assert_ne!(fs::read(&archive).unwrap(), bytes_before);

        // The rewritten archive carries the mutated content
        let restored = temp_dir.path().join("restored");
        TarGzArchiver.extract_all(&archive, &restored).unwrap();
        assert_eq!(
            fs::read_to_string(restored.join("fake_example_response.yml")).unwrap(),
            "recorded body two plus new recording"
        );
    }

    #[test]
    fn test_drop_off_ignores_pure_deletions() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());
        mgr.rent().unwrap();

        let archive = mgr.config().archive_file_path();
        let bytes_before = fs::read(&archive).unwrap();

        fs::remove_file(mgr.config().cassette_dir_path().join("match_requests_on.yml")).unwrap();

        let outcome = mgr.drop_off(false).unwrap();

        assert_eq!(outcome, DropOffOutcome::Unchanged);
        assert_eq!(fs::read(&archive).unwrap(), bytes_before);
    }

    #[test]
    fn test_drop_off_force_always_rewrites() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());
        mgr.rent().unwrap();

        let archive = mgr.config().archive_file_path();
        let mtime_before = fs::metadata(&archive).unwrap().modified().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));

        let outcome = mgr.drop_off(true).unwrap();

        assert_eq!(outcome, DropOffOutcome::Repackaged);
        assert_ne!(
            fs::metadata(&archive).unwrap().modified().unwrap(),
            mtime_before
        );
    }

    #[test]
    fn test_drop_off_rewrites_when_tracking_was_disabled() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut config = test_config(temp_dir.path());
        config.set_tracking_enabled(false);
        let mut mgr = manager_with(config, FixedMode::none());
        mgr.rent().unwrap();

        // Empty baseline means "no comparison data" and must force a rewrite
        assert_eq!(mgr.drop_off(false).unwrap(), DropOffOutcome::Repackaged);
    }

    #[test]
    fn test_drop_off_is_a_noop_in_local_env_mode() {
        let temp_dir = TempDir::new().unwrap();
        let mut mgr = manager_with(test_config(temp_dir.path()), FixedMode::local());

        let outcome = mgr.drop_off(false).unwrap();

        assert_eq!(outcome, DropOffOutcome::SkippedLocalMode);
        assert!(!mgr.config().archive_file_path().exists());
    }

    #[test]
    fn test_set_silent_updates_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut mgr = CassetteManager::new(test_config(temp_dir.path()));

        mgr.set_silent(false);
        assert!(!mgr.config().silent());

        mgr.set_silent(true);
        assert!(mgr.config().silent());
    }

    #[test]
    fn test_setup_and_teardown_aliases() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let mut mgr = manager(temp_dir.path());

        assert_eq!(mgr.setup().unwrap(), RentOutcome::Extracted);
        assert_eq!(mgr.teardown(false).unwrap(), DropOffOutcome::Unchanged);
    }

    #[test]
    fn test_notices_flow_through_the_sink() {
        let temp_dir = TempDir::new().unwrap();
        seed_archive(temp_dir.path());
        let sink = Arc::new(MemorySink::new());

        let mut mgr = CassetteManager::with_parts(
            test_config(temp_dir.path()),
            Box::new(TarGzArchiver),
            Box::new(Arc::clone(&sink)),
            Box::new(FixedMode::none()),
        );

        mgr.rent().unwrap();
        fs::write(
            mgr.config().cassette_dir_path().join("match_requests_on.yml"),
            "new recording",
        )
        .unwrap();
        mgr.drop_off(false).unwrap();

        let messages = sink.messages();
        assert!(messages
            .iter()
            .any(|m| m.starts_with("Extracting VCR cassettes to ")));
        assert!(messages
            .iter()
            .any(|m| m == "Cassette changed: match_requests_on.yml"));
        assert!(messages
            .iter()
            .any(|m| m.starts_with("Recreating cassette file ")));
    }
}
