//! Reading the selected files into a [`SubmitRequest`].

use std::path::{Path, PathBuf};

use specgen_core::payload::{SubmitRequest, UploadPart};
use specgen_core::types::{Granularity, JobId, Mode};
use specgen_core::validation::Selections;

/// Part filename used when a path has no final component.
const FALLBACK_PART_NAME: &str = "upload";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read every file selected for the fields of `mode`, in field-table order.
///
/// Fields that do not belong to `mode` are ignored.
pub async fn load_request(
    job_id: JobId,
    mode: Mode,
    granularity: Granularity,
    selections: &Selections,
) -> Result<SubmitRequest, PayloadError> {
    let mut parts = Vec::new();

    for spec in mode.fields() {
        for path in selections.files(spec.name) {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| PayloadError::Read {
                    path: path.clone(),
                    source,
                })?;
            parts.push(UploadPart {
                field: spec.name,
                file_name: part_name(path),
                bytes,
            });
        }
    }

    Ok(SubmitRequest {
        job_id,
        mode,
        granularity,
        parts,
    })
}

fn part_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_PART_NAME.to_string())
}
