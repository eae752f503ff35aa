//! Job lifecycle orchestration.
//!
//! [`JobController`] validates a request, submits it, runs the
//! [`ProgressPoller`] alongside the upload, and settles the job once the
//! upload resolves:
//!
//! ```text
//! Idle --submit--> Submitting --archive delivered--> Succeeded
//!                       \------upload/delivery failed--> Failed
//! ```
//!
//! The upload's resolution is authoritative. The poller is started from the
//! same `select!` loop that awaits the upload, so it cannot start after the
//! job has settled, and it is stopped exactly once per job.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use specgen_core::failure::JobFailure;
use specgen_core::job::Job;
use specgen_core::payload::Artifact;
use specgen_core::types::{Granularity, JobId, Mode};
use specgen_core::validation::{validate, Selections, ValidationError};

use crate::board::{BoardError, JobBoard, JobView};
use crate::delivery::ResultDeliverer;
use crate::payload::load_request;
use crate::poller::{PollSettings, ProgressPoller};
use crate::service::JobService;

/// A user's submission: what to generate and from which files.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub mode: Mode,
    pub granularity: Granularity,
    pub selections: Selections,
}

/// Terminal result of one job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded {
        filename: String,
        path: PathBuf,
        size: usize,
    },
    Failed {
        failure: JobFailure,
        message: String,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// What [`JobController::submit`] returns for a job that was started.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub mode: Mode,
    pub outcome: JobOutcome,
}

/// Reasons a submission never started a job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Busy(#[from] BoardError),
}

/// Owns the job lifecycle for one client instance.
pub struct JobController<S, D> {
    service: Arc<S>,
    deliverer: Arc<D>,
    board: Arc<JobBoard>,
    poller: ProgressPoller<S>,
    poll_start_delay: Duration,
}

impl<S: JobService, D: ResultDeliverer + 'static> JobController<S, D> {
    pub fn new(service: Arc<S>, deliverer: D, settings: PollSettings) -> Self {
        let board = Arc::new(JobBoard::new());
        let poller = ProgressPoller::new(Arc::clone(&service), Arc::clone(&board), settings.interval);
        Self {
            service,
            deliverer: Arc::new(deliverer),
            board,
            poller,
            poll_start_delay: settings.start_delay,
        }
    }

    /// Observe status text, progress, and submit availability.
    pub fn subscribe(&self) -> watch::Receiver<JobView> {
        self.board.subscribe()
    }

    pub fn board(&self) -> &JobBoard {
        &self.board
    }

    pub fn poller(&self) -> &ProgressPoller<S> {
        &self.poller
    }

    /// Validate and run one job to its terminal state.
    ///
    /// Validation failures surface as status text and `Err`; no request is
    /// sent. Every started job yields `Ok` with its [`JobOutcome`].
    pub async fn submit(&mut self, request: JobRequest) -> Result<JobReport, SubmitError> {
        let JobRequest {
            mode,
            granularity,
            selections,
        } = request;

        if let Err(err) = validate(mode, &selections) {
            tracing::info!(mode = %mode, field = err.field(), "Submission rejected by validation");
            self.board.set_status(err.to_string());
            return Err(err.into());
        }

        let job = Job::new(mode, granularity.clone());
        let job_id = job.id;
        self.board.begin(job)?;

        tracing::info!(job_id = %job_id, mode = %mode, granularity = %granularity, "Job started");

        let mut in_flight = InFlight {
            poller: &mut self.poller,
            board: &self.board,
            job_id,
            settled: false,
        };

        let result = upload(
            self.service.as_ref(),
            &mut in_flight,
            self.poll_start_delay,
            job_id,
            mode,
            granularity,
            &selections,
        )
        .await;

        in_flight.stop_polling();

        let outcome = match result {
            Ok(artifact) => deliver(&self.deliverer, &self.board, job_id, artifact).await,
            Err(failure) => fail(&self.board, job_id, failure),
        };

        in_flight.disarm();

        Ok(JobReport {
            job_id,
            mode,
            outcome,
        })
    }

    /// Stop any polling. The controller stays usable.
    pub fn shutdown(&mut self) {
        self.poller.stop();
    }
}

/// Hand the archive to the deliverer on the blocking pool and settle the job.
async fn deliver<D: ResultDeliverer + 'static>(
    deliverer: &Arc<D>,
    board: &JobBoard,
    job_id: JobId,
    artifact: Artifact,
) -> JobOutcome {
    let filename = artifact.filename.clone();
    let size = artifact.bytes.len();
    let deliverer = Arc::clone(deliverer);

    let saved = tokio::task::spawn_blocking(move || deliverer.deliver(&artifact)).await;

    match saved {
        Ok(Ok(path)) => {
            board.succeed(job_id);
            tracing::info!(
                job_id = %job_id,
                filename = %filename,
                path = %path.display(),
                elapsed_ms = elapsed_ms(board),
                "Job succeeded",
            );
            JobOutcome::Succeeded {
                filename,
                path,
                size,
            }
        }
        Ok(Err(e)) => fail(board, job_id, JobFailure::Internal(e.to_string())),
        Err(e) => fail(
            board,
            job_id,
            JobFailure::Internal(format!("Archive delivery task failed: {e}")),
        ),
    }
}

fn fail(board: &JobBoard, job_id: JobId, failure: JobFailure) -> JobOutcome {
    board.fail(job_id, &failure);
    tracing::warn!(
        job_id = %job_id,
        error = %failure,
        elapsed_ms = elapsed_ms(board),
        "Job failed",
    );
    JobOutcome::Failed {
        message: failure.to_string(),
        failure,
    }
}

fn elapsed_ms(board: &JobBoard) -> i64 {
    board
        .snapshot()
        .job
        .and_then(|job| job.elapsed())
        .map_or(0, |d| d.num_milliseconds())
}

/// Read the payload, issue the upload, and start the poller after
/// `start_delay` unless the upload has already resolved by then.
async fn upload<S: JobService>(
    service: &S,
    in_flight: &mut InFlight<'_, S>,
    start_delay: Duration,
    job_id: JobId,
    mode: Mode,
    granularity: Granularity,
    selections: &Selections,
) -> Result<Artifact, JobFailure> {
    let request = load_request(job_id, mode, granularity, selections)
        .await
        .map_err(|e| JobFailure::Internal(e.to_string()))?;

    tracing::debug!(
        job_id = %job_id,
        parts = request.parts.len(),
        bytes = request.payload_size(),
        "Uploading payload",
    );

    let submission = service.submit(request);
    tokio::pin!(submission);

    let poll_start = tokio::time::sleep(start_delay);
    tokio::pin!(poll_start);
    let mut poll_pending = true;

    let result = loop {
        tokio::select! {
            result = &mut submission => break result,
            _ = &mut poll_start, if poll_pending => {
                poll_pending = false;
                in_flight.start_polling();
            }
        }
    };

    result.map_err(JobFailure::from)
}

/// Ties the poller to the job in flight.
///
/// [`stop_polling`](Self::stop_polling) runs once the upload has resolved;
/// [`disarm`](Self::disarm) once the job is terminal. If the submit future
/// is dropped in between (or earlier), the guard stops the poller and fails
/// the job so the board never stays stuck in `Submitting`.
struct InFlight<'a, S> {
    poller: &'a mut ProgressPoller<S>,
    board: &'a JobBoard,
    job_id: JobId,
    settled: bool,
}

impl<S: JobService> InFlight<'_, S> {
    fn start_polling(&mut self) {
        self.poller.start(self.job_id);
    }
}

impl<S> InFlight<'_, S> {
    fn stop_polling(&mut self) {
        self.poller.stop();
    }

    fn disarm(mut self) {
        self.settled = true;
    }
}

impl<S> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.poller.stop();
        let abandoned = JobFailure::Internal("submission abandoned".to_string());
        if self.board.fail(self.job_id, &abandoned) {
            tracing::warn!(job_id = %self.job_id, "Submission abandoned before it resolved");
        }
    }
}
