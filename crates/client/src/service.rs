//! The seam between job orchestration and the remote service.

use std::time::Duration;

use async_trait::async_trait;

use specgen_core::error::ServiceError;
use specgen_core::job::ProgressReport;
use specgen_core::payload::{Artifact, SubmitRequest};
use specgen_core::types::JobId;

use crate::api::DocGenApi;

/// Operations the poller and controller need from the generation service.
#[async_trait]
pub trait JobService: Send + Sync + 'static {
    /// Issue the long-running processing request. Resolves once the
    /// service has produced the archive or rejected the job.
    async fn submit(&self, request: SubmitRequest) -> Result<Artifact, ServiceError>;

    /// Fetch the current progress of `job_id`, giving up after `timeout`.
    async fn fetch_progress(
        &self,
        job_id: JobId,
        timeout: Duration,
    ) -> Result<ProgressReport, ServiceError>;
}

#[async_trait]
impl JobService for DocGenApi {
    async fn submit(&self, request: SubmitRequest) -> Result<Artifact, ServiceError> {
        Ok(DocGenApi::submit(self, request).await?)
    }

    async fn fetch_progress(
        &self,
        job_id: JobId,
        timeout: Duration,
    ) -> Result<ProgressReport, ServiceError> {
        Ok(self.get_progress(job_id, timeout).await?)
    }
}
