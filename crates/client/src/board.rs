//! Observable state of the current job.
//!
//! [`JobBoard`] wraps a [`tokio::sync::watch`] channel holding a
//! [`JobView`]: the job record plus what a front end shows (status text,
//! progress indicator, whether a new submission is accepted). The poller
//! and the controller both write through the board; every write is a
//! single `send_modify`/`send_if_modified` closure, so writers never
//! observe each other half-way.

use serde::Serialize;
use tokio::sync::watch;

use specgen_core::failure::JobFailure;
use specgen_core::job::{Job, JobState, Progress};
use specgen_core::types::JobId;

/// Status text after a successful job.
pub const STATUS_COMPLETED: &str = "Completed";

/// Snapshot of the current job as a front end would render it.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    /// Most recent job, kept after it reaches a terminal state.
    pub job: Option<Job>,
    pub status_text: String,
    pub progress_visible: bool,
    pub submit_enabled: bool,
}

impl JobView {
    /// Progress line, present only while the indicator is visible.
    pub fn progress_text(&self) -> Option<String> {
        if !self.progress_visible {
            return None;
        }
        self.job.as_ref().map(|job| job.progress.display_text())
    }

    /// Whether a job is currently being submitted.
    pub fn is_busy(&self) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.state() == JobState::Submitting)
    }
}

impl Default for JobView {
    fn default() -> Self {
        Self {
            job: None,
            status_text: String::new(),
            progress_visible: false,
            submit_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Another job is still being submitted")]
    Busy,
}

/// Shared, observable job state.
pub struct JobBoard {
    tx: watch::Sender<JobView>,
}

impl JobBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(JobView::default());
        Self { tx }
    }

    /// Receive every change of the view.
    pub fn subscribe(&self) -> watch::Receiver<JobView> {
        self.tx.subscribe()
    }

    /// Clone of the current view.
    pub fn snapshot(&self) -> JobView {
        self.tx.borrow().clone()
    }

    /// Replace the status text without touching the job.
    pub fn set_status(&self, text: impl Into<String>) {
        let text = text.into();
        self.tx.send_modify(|view| view.status_text = text);
    }

    /// Install `job` as the current job and move it to `Submitting`:
    /// submission is disabled and the progress indicator shown at 0%.
    pub fn begin(&self, mut job: Job) -> Result<(), BoardError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|view| {
            if view.is_busy() || job.begin_submitting().is_err() {
                result = Err(BoardError::Busy);
                return false;
            }
            job.progress = Progress::initializing();
            view.submit_enabled = false;
            view.status_text = job.mode.generating_text().to_string();
            view.progress_visible = true;
            view.job = Some(job.clone());
            true
        });
        result
    }

    /// Switch the polling flag of job `id`; returns whether the flag changed.
    /// Nothing changes when `id` is not the current job, or when polling is
    /// switched on for a job that is no longer submitting.
    pub fn set_polling(&self, id: JobId, on: bool) -> bool {
        self.tx.send_if_modified(|view| match view.job.as_mut() {
            Some(job) if job.id == id && job.is_polling() != on => job.set_polling(on),
            _ => false,
        })
    }

    /// Publish a progress report for job `id`.
    ///
    /// Discarded (returns `false`) when `id` is not the current job or the
    /// job is not polling any more.
    pub fn update_progress(&self, id: JobId, progress: Progress) -> bool {
        self.tx.send_if_modified(|view| match view.job.as_mut() {
            Some(job) if job.id == id && job.is_polling() => {
                job.progress = progress;
                true
            }
            _ => false,
        })
    }

    /// `Submitting -> Succeeded` for job `id`.
    pub fn succeed(&self, id: JobId) -> bool {
        self.finish(id, STATUS_COMPLETED.to_string(), |job| job.succeed().is_ok())
    }

    /// `Submitting -> Failed` for job `id`, showing the failure message.
    pub fn fail(&self, id: JobId, failure: &JobFailure) -> bool {
        self.finish(id, failure.to_string(), |job| job.fail().is_ok())
    }

    fn finish(&self, id: JobId, status: String, transition: impl FnOnce(&mut Job) -> bool) -> bool {
        self.tx.send_if_modified(|view| {
            let moved = match view.job.as_mut() {
                Some(job) if job.id == id => transition(job),
                _ => false,
            };
            if moved {
                view.progress_visible = false;
                view.status_text = status;
                view.submit_enabled = true;
            }
            moved
        })
    }
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
