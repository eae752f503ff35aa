//! Shared test doubles for the client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use specgen_client::delivery::{DeliveryError, ResultDeliverer};
use specgen_client::service::JobService;
use specgen_core::error::ServiceError;
use specgen_core::job::ProgressReport;
use specgen_core::payload::{Artifact, SubmitRequest};
use specgen_core::types::JobId;

// ---------------------------------------------------------------------------
// FakeService
// ---------------------------------------------------------------------------

/// Scripted reply to one progress poll.
pub enum PollReply {
    Report { stage: &'static str, percent: i64 },
    Fail(ServiceError),
    /// Block until the notify fires, then report.
    Gated(Arc<Notify>, &'static str, i64),
}

/// In-memory [`JobService`] recording every call.
pub struct FakeService {
    submit_delay: Duration,
    submit_result: Mutex<Option<Result<Artifact, ServiceError>>>,
    poll_script: Mutex<VecDeque<PollReply>>,
    polls: Mutex<Vec<(JobId, tokio::time::Instant)>>,
    submitted: Mutex<Vec<SubmitRequest>>,
}

impl FakeService {
    /// Submission resolves with `result` after `delay`; polls report
    /// `structuring 10%` unless scripted otherwise.
    pub fn new(delay: Duration, result: Result<Artifact, ServiceError>) -> Self {
        Self {
            submit_delay: delay,
            submit_result: Mutex::new(Some(result)),
            poll_script: Mutex::new(VecDeque::new()),
            polls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(delay: Duration, bytes: &[u8], filename: &str) -> Self {
        Self::new(
            delay,
            Ok(Artifact {
                bytes: bytes.to_vec(),
                filename: filename.to_string(),
            }),
        )
    }

    pub fn failing(delay: Duration, error: ServiceError) -> Self {
        Self::new(delay, Err(error))
    }

    /// Queue replies for the next polls, in order.
    pub fn script_polls(&self, replies: impl IntoIterator<Item = PollReply>) {
        self.poll_script.lock().unwrap().extend(replies);
    }

    pub fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    pub fn polled_ids(&self) -> Vec<JobId> {
        self.polls.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn poll_times(&self) -> Vec<tokio::time::Instant> {
        self.polls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn last_submission(&self) -> Option<SubmitRequest> {
        self.submitted.lock().unwrap().last().cloned()
    }
}

fn report(stage: &str, percent: i64) -> ProgressReport {
    ProgressReport {
        stage: stage.to_string(),
        message: format!("{stage} in progress"),
        progress: percent as f64,
        timestamp: None,
    }
}

#[async_trait]
impl JobService for FakeService {
    async fn submit(&self, request: SubmitRequest) -> Result<Artifact, ServiceError> {
        self.submitted.lock().unwrap().push(request);
        tokio::time::sleep(self.submit_delay).await;
        self.submit_result
            .lock()
            .unwrap()
            .take()
            .expect("FakeService only supports one submission")
    }

    async fn fetch_progress(
        &self,
        job_id: JobId,
        _timeout: Duration,
    ) -> Result<ProgressReport, ServiceError> {
        self.polls
            .lock()
            .unwrap()
            .push((job_id, tokio::time::Instant::now()));
        let reply = self.poll_script.lock().unwrap().pop_front();
        match reply {
            None => Ok(report("structuring", 10)),
            Some(PollReply::Report { stage, percent }) => Ok(report(stage, percent)),
            Some(PollReply::Fail(error)) => Err(error),
            Some(PollReply::Gated(gate, stage, percent)) => {
                gate.notified().await;
                Ok(report(stage, percent))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingDeliverer
// ---------------------------------------------------------------------------

/// [`ResultDeliverer`] that keeps artifacts in memory.
#[derive(Clone, Default)]
pub struct RecordingDeliverer {
    delivered: Arc<Mutex<Vec<Artifact>>>,
    fail: bool,
}

impl RecordingDeliverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deliverer whose every delivery fails.
    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<Artifact> {
        self.delivered.lock().unwrap().clone()
    }
}

impl ResultDeliverer for RecordingDeliverer {
    fn deliver(&self, artifact: &Artifact) -> Result<PathBuf, DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Write(std::io::Error::other("disk full")));
        }
        self.delivered.lock().unwrap().push(artifact.clone());
        Ok(PathBuf::from("/downloads").join(&artifact.filename))
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("test file should be writable");
    path
}
