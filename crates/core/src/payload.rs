//! In-memory request and response payloads of a submission.

use crate::types::{Granularity, JobId, Mode};

/// One file part of the multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    /// Multipart field name (see [`Mode::fields`]).
    pub field: &'static str,
    /// Original file name, sent as the part's filename.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to issue the processing request of one job.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub job_id: JobId,
    pub mode: Mode,
    pub granularity: Granularity,
    /// File parts in field-table order, files in selection order.
    pub parts: Vec<UploadPart>,
}

impl SubmitRequest {
    /// Total size of all file parts in bytes.
    pub fn payload_size(&self) -> usize {
        self.parts.iter().map(|p| p.bytes.len()).sum()
    }
}

/// A finished archive returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// Suggested filename, already resolved against the mode default.
    pub filename: String,
}
