//! Content fingerprinting for cassette change detection
//!
//! Captures a snapshot of a cassette directory as a map from relative file
//! path to a blake3 digest of the file contents. Two snapshots taken at
//! different points in time are compared to decide whether the cassette
//! archive must be repackaged.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use walkdir::WalkDir;

/// Relative path (forward-slash-normalized) -> blake3 hex digest
pub type FingerprintMap = BTreeMap<String, String>;

const MEMMAP_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB
const BUFFER_SIZE: usize = 8 * 1024 * 1024; // 8MB

/// Capture a fingerprint of every regular file under `dir`
///
/// Keys are paths relative to `dir` with `/` separators regardless of
/// platform. Directories themselves never appear in the map.
///
/// A nonexistent `dir` yields an empty map: "no baseline yet" is a valid
/// state, not an error. A file that disappears or becomes unreadable while
/// the walk is in progress is simply omitted.
pub fn capture(dir: &Path) -> FingerprintMap {
    let mut map = FingerprintMap::new();

    if !dir.is_dir() {
        return map;
    }

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = match entry.path().strip_prefix(dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };

        if let Some(digest) = hash_file(entry.path()) {
            map.insert(normalize_separators(rel), digest);
        }
    }

    map
}

/// Convert a relative path to its `/`-separated string form
pub(crate) fn normalize_separators(rel: &Path) -> String {
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// Compute the blake3 hex digest of a file's full contents
///
/// Uses memory mapping for large files and buffered reads for the rest.
/// Returns `None` if the file cannot be read (deleted mid-walk, permission
/// lost); callers treat that as "file not present".
fn hash_file(path: &Path) -> Option<String> {
    use blake3::Hasher;
    use memmap2::MmapOptions;

    let metadata = std::fs::metadata(path).ok()?;
    let file_size = metadata.len();

    if file_size >= MEMMAP_THRESHOLD {
        let file = File::open(path).ok()?;

        // Safety: the map is read-only and dropped before returning
        let mmap = unsafe { MmapOptions::new().map(&file).ok()? };

        let mut hasher = Hasher::new();
        hasher.update(&mmap[..]);
        return Some(hasher.finalize().to_hex().to_string());
    }

    let file = File::open(path).ok()?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).ok()?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Some(hasher.finalize().to_hex().to_string())
}
