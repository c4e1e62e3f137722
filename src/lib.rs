//! Rewinder library crate
//!
//! Keeps a directory of recorded VCR test cassettes packed in a single
//! compressed archive. `rent()` extracts the archive before a test run and
//! fingerprints every cassette; `drop_off()` repacks the archive afterwards
//! only when a recording was added or changed, so unchanged runs produce no
//! spurious diffs in version control.

pub mod archive;
pub mod comparator;
pub mod config;
pub mod fingerprint;
pub mod manager;
pub mod mode;
pub mod output;

pub use archive::{ArchiveAdapter, ArchiveError, TarGzArchiver};
pub use comparator::{compare, Change, ChangeKind, Comparison};
pub use config::Config;
pub use fingerprint::{capture, FingerprintMap};
pub use manager::{CassetteManager, DropOffOutcome, RentOutcome};
pub use mode::{EnvMode, FixedMode, ModeProvider, LOCAL_MODE, MODE_VAR};
pub use output::{ConsoleSink, MemorySink, NoticeSink, SilentSink};
