//! Snapshot comparison and the rewind decision
//!
//! Classifies the delta between the fingerprint taken at extraction time and
//! the one taken at drop-off time, and decides whether the archive has to be
//! recreated. Deletions are reported but never trigger a repack: the old
//! archive still holds a superset of the needed cassettes. Known accepted
//! limitation: deleted recordings therefore linger in the archive until some
//! other change (or a forced drop-off) rewrites it.

use crate::fingerprint::FingerprintMap;
use crate::output::NoticeSink;
use serde::Serialize;

/// How a single cassette differs between baseline and current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present now, absent from the baseline
    Added,
    /// Present in both, contents differ
    Modified,
    /// Present in the baseline, absent now (reported only)
    Deleted,
}

/// One classified difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
}

/// Outcome of comparing two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    /// True when the archive no longer matches the working set and must be
    /// recreated
    pub rewind: bool,
    /// Every classified difference, in path order within each pass
    pub changes: Vec<Change>,
}

impl Comparison {
    pub fn added(&self) -> usize {
        self.count(ChangeKind::Added)
    }

    pub fn modified(&self) -> usize {
        self.count(ChangeKind::Modified)
    }

    pub fn deleted(&self) -> usize {
        self.count(ChangeKind::Deleted)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// One-line human summary of the delta
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} modified, {} deleted",
            self.added(),
            self.modified(),
            self.deleted()
        )
    }
}

/// Compare the current snapshot against the baseline
///
/// The decision is true iff the baseline is empty (nothing was tracked, so
/// correctness demands a rewrite) or at least one cassette was added or
/// modified. A per-change notice goes to `sink`; the caller applies any
/// force flag on top of the returned decision.
///
/// Empty maps are valid inputs, never errors.
pub fn compare(
    baseline: &FingerprintMap,
    current: &FingerprintMap,
    sink: &dyn NoticeSink,
) -> Comparison {
    let mut changes = Vec::new();

    for (path, digest) in current {
        match baseline.get(path) {
            None => {
                sink.notice(&format!("New cassette: {path}"));
                changes.push(Change {
                    path: path.clone(),
                    kind: ChangeKind::Added,
                });
            }
            Some(previous) if previous != digest => {
                sink.notice(&format!("Cassette changed: {path}"));
                changes.push(Change {
                    path: path.clone(),
                    kind: ChangeKind::Modified,
                });
            }
            Some(_) => {}
        }
    }

    for path in baseline.keys() {
        if !current.contains_key(path) {
            sink.notice(&format!("Cassettes deleted: {path}"));
            changes.push(Change {
                path: path.clone(),
                kind: ChangeKind::Deleted,
            });
        }
    }

    let rewind = baseline.is_empty()
        || changes
            .iter()
            .any(|c| matches!(c.kind, ChangeKind::Added | ChangeKind::Modified));

    Comparison { rewind, changes }
}
