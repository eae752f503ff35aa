//! REST API client for the document-generation service.
//!
//! Wraps the two HTTP endpoints (processing upload and progress query)
//! using [`reqwest`].

use std::time::Duration;

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};

use specgen_core::disposition::suggested_filename;
use specgen_core::error::ServiceError;
use specgen_core::job::ProgressReport;
use specgen_core::payload::{Artifact, SubmitRequest};
use specgen_core::types::{JobId, FIELD_GRANULARITY};

/// Response header in which the service echoes the job id.
const JOB_ID_HEADER: &str = "x-job-id";

/// HTTP client for one document-generation service deployment.
pub struct DocGenApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum DocGenApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl From<DocGenApiError> for ServiceError {
    fn from(err: DocGenApiError) -> Self {
        match err {
            DocGenApiError::ApiError { status, body } => ServiceError::Status { status, body },
            DocGenApiError::Request(e) if e.is_decode() => ServiceError::Decode(e.to_string()),
            DocGenApiError::Request(e) => ServiceError::Transport(e.to_string()),
        }
    }
}

impl DocGenApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base URL, e.g. `https://host/api`. A trailing slash is
    ///   ignored.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Upload the payload of a job and wait for the finished archive.
    ///
    /// Sends `POST /{upload|upload_diff}?jobId={id}` with a multipart body.
    /// No client-side timeout is applied; generation can take minutes.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Artifact, DocGenApiError> {
        let SubmitRequest {
            job_id,
            mode,
            granularity,
            parts,
        } = request;

        let mut form = Form::new();
        for part in parts {
            let file = Part::bytes(part.bytes).file_name(part.file_name);
            form = form.part(part.field, file);
        }
        form = form.text(FIELD_GRANULARITY, granularity.as_str().to_string());

        let response = self
            .client
            .post(format!("{}/{}", self.api_url, mode.endpoint_path()))
            .query(&[("jobId", job_id.to_string())])
            .multipart(form)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;

        // Quoted names may be raw UTF-8, which `to_str` rejects.
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
            .map(str::to_owned);

        if let Some(echoed) = response
            .headers()
            .get(JOB_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if echoed != job_id.to_string() {
                tracing::warn!(
                    job_id = %job_id,
                    echoed_job_id = %echoed,
                    "Service echoed a different job id",
                );
            }
        }

        let bytes = response.bytes().await?.to_vec();
        let filename = suggested_filename(disposition.as_deref(), mode);

        tracing::debug!(job_id = %job_id, size = bytes.len(), filename = %filename, "Archive received");

        Ok(Artifact { bytes, filename })
    }

    /// Query the current progress of a job.
    ///
    /// Sends `GET /progress/{job_id}`. The service answers 404 until the
    /// upload for this id has reached it.
    pub async fn get_progress(
        &self,
        job_id: JobId,
        timeout: Duration,
    ) -> Result<ProgressReport, DocGenApiError> {
        let response = self
            .client
            .get(format!("{}/progress/{}", self.api_url, job_id))
            .timeout(timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`DocGenApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DocGenApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DocGenApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DocGenApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
