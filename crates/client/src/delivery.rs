//! Hand the finished archive to the user.
//!
//! [`DirectoryDeliverer`] writes the archive into an output directory the
//! way a browser download would: the suggested name is reduced to a bare
//! file name, an existing file is never overwritten (`name (1).zip`,
//! `name (2).zip`, ... are tried instead), and the bytes are staged in a
//! temporary file that is removed on every failure path.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use specgen_core::payload::Artifact;

/// File name used when the suggested name has no usable component.
const FALLBACK_FILE_NAME: &str = "download.zip";

/// Upper bound of `name (n).ext` candidates tried before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to prepare {}: {source}", dir.display())]
    Prepare {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to save {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free file name for {0}")]
    NameExhausted(String),
}

/// Destination for finished archives.
pub trait ResultDeliverer: Send + Sync {
    /// Deliver `artifact`, returning where it ended up.
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf, DeliveryError>;
}

/// Saves archives into a directory.
pub struct DirectoryDeliverer {
    dir: PathBuf,
}

impl DirectoryDeliverer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultDeliverer for DirectoryDeliverer {
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf, DeliveryError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| DeliveryError::Prepare {
            dir: self.dir.clone(),
            source,
        })?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|source| DeliveryError::Prepare {
            dir: self.dir.clone(),
            source,
        })?;
        temp.write_all(&artifact.bytes)?;
        temp.as_file().sync_all()?;

        let name = safe_file_name(&artifact.filename);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(numbered_name(&name, attempt));
            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!(path = %path.display(), size = artifact.bytes.len(), "Archive saved");
                    return Ok(path);
                }
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    temp = e.file;
                }
                Err(e) => {
                    return Err(DeliveryError::Persist {
                        path,
                        source: e.error,
                    });
                }
            }
        }

        Err(DeliveryError::NameExhausted(name))
    }
}

/// Reduce a server-suggested name to its last path component.
pub fn safe_file_name(suggested: &str) -> String {
    let last = suggested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if last.is_empty() || last == "." || last == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        last.to_string()
    }
}

/// `name` for attempt 0, then `stem (n).ext`.
fn numbered_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{name} ({attempt})"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
