//! Archive container I/O
//!
//! Mechanical collaborator for the lifecycle manager: pack a directory into
//! a compressed tarball, or unpack one. The container format lives entirely
//! behind [`ArchiveAdapter`]; the manager only decides *whether* to call it.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::fingerprint::normalize_separators;

/// Errors surfaced by archive creation and extraction
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to extract archive {}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create archive {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Packs and unpacks the cassette working set
///
/// Any container that restores the same relative paths and bytes satisfies
/// the manager; compression is the adapter's concern.
pub trait ArchiveAdapter {
    /// Extract every entry of `archive` into `target`, preserving relative
    /// paths. Creates `target` if needed.
    fn extract_all(&self, archive: &Path, target: &Path) -> Result<(), ArchiveError>;

    /// Create `archive` from the full contents of `source`, replacing any
    /// existing file at that path.
    fn create_archive(&self, source: &Path, archive: &Path) -> Result<(), ArchiveError>;
}

/// Gzip-compressed tar implementation
#[derive(Debug, Default)]
pub struct TarGzArchiver;

impl ArchiveAdapter for TarGzArchiver {
    fn extract_all(&self, archive: &Path, target: &Path) -> Result<(), ArchiveError> {
        let file = File::open(archive).map_err(|source| ArchiveError::Open {
            path: archive.to_path_buf(),
            source,
        })?;

        std::fs::create_dir_all(target).map_err(|source| ArchiveError::Extract {
            path: archive.to_path_buf(),
            source,
        })?;

        let decoder = GzDecoder::new(file);
        let mut tarball = tar::Archive::new(decoder);
        tarball
            .unpack(target)
            .map_err(|source| ArchiveError::Extract {
                path: archive.to_path_buf(),
                source,
            })?;

        Ok(())
    }

    fn create_archive(&self, source: &Path, archive: &Path) -> Result<(), ArchiveError> {
        // Build next to the destination and rename into place, so a failed
        // write never leaves a torn archive where the old one was.
        let partial = partial_path(archive);

        write_tarball(source, &partial).map_err(|source| ArchiveError::Create {
            path: archive.to_path_buf(),
            source,
        })?;

        std::fs::rename(&partial, archive).map_err(|source| {
            let _ = std::fs::remove_file(&partial);
            ArchiveError::Create {
                path: archive.to_path_buf(),
                source,
            }
        })?;

        Ok(())
    }
}

fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    archive.with_file_name(name)
}

fn write_tarball(source: &Path, out_file: &Path) -> io::Result<()> {
    let out = File::create(out_file)?;
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut files: Vec<PathBuf> = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    for disk_path in &files {
        let rel = disk_path
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        builder.append_path_with_name(disk_path, normalize_separators(rel))?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}
