//! Best-effort progress polling for the job in flight.
//!
//! [`ProgressPoller`] owns at most one polling task. The task queries the
//! service immediately and then once per interval, republishing every
//! successful report on the [`JobBoard`]. Failed polls (including the
//! "unknown job" 404 the service returns before the upload has reached it)
//! are logged and skipped; polling never fails a job on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use specgen_core::job::Progress;
use specgen_core::types::JobId;

use crate::board::JobBoard;
use crate::service::JobService;

/// Default interval between two progress polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default delay between issuing the upload and the first poll.
pub const DEFAULT_POLL_START_DELAY: Duration = Duration::from_secs(1);

/// Smallest accepted interval; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Timing parameters of progress polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between two polls. Also the timeout of each poll request.
    pub interval: Duration,
    /// Time between issuing the upload and starting the poller.
    pub start_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            start_delay: DEFAULT_POLL_START_DELAY,
        }
    }
}

/// Bookkeeping for the running polling task.
struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
    #[allow(dead_code)]
    task_handle: tokio::task::JoinHandle<()>,
}

/// Cancellable fixed-interval progress poller.
pub struct ProgressPoller<S> {
    service: Arc<S>,
    board: Arc<JobBoard>,
    interval: Duration,
    active: Option<ActivePoll>,
}

impl<S: JobService> ProgressPoller<S> {
    pub fn new(service: Arc<S>, board: Arc<JobBoard>, interval: Duration) -> Self {
        Self {
            service,
            board,
            interval: interval.max(MIN_POLL_INTERVAL),
            active: None,
        }
    }

    /// Start polling `job_id`, stopping any previous run first.
    ///
    /// The first poll is issued right away, the next ones every interval.
    pub fn start(&mut self, job_id: JobId) {
        self.stop();

        self.board.set_polling(job_id, true);

        let cancel = CancellationToken::new();
        let task_handle = tokio::spawn(poll_loop(
            Arc::clone(&self.service),
            Arc::clone(&self.board),
            job_id,
            self.interval,
            cancel.clone(),
        ));

        tracing::debug!(job_id = %job_id, interval_ms = self.interval.as_millis() as u64, "Progress polling started");

        self.active = Some(ActivePoll {
            job_id,
            cancel,
            task_handle,
        });
    }
}

impl<S> ProgressPoller<S> {
    /// Stop the running poll task, if any.
    ///
    /// A poll request still in flight is abandoned, and the job's polling
    /// flag is cleared so that a response racing this call is discarded by
    /// the board. The last job id and progress stay on the board.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            self.board.set_polling(active.job_id, false);
            tracing::debug!(job_id = %active.job_id, "Progress polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Job currently being polled.
    pub fn job_id(&self) -> Option<JobId> {
        self.active.as_ref().map(|a| a.job_id)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S> Drop for ProgressPoller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll until `cancel` fires.
async fn poll_loop<S: JobService>(
    service: Arc<S>,
    board: Arc<JobBoard>,
    job_id: JobId,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = service.fetch_progress(job_id, interval) => match result {
                Ok(report) => {
                    let progress = Progress::from(report);
                    let percent = progress.percent;
                    if board.update_progress(job_id, progress) {
                        tracing::debug!(job_id = %job_id, percent, "Progress updated");
                    }
                }
                Err(e) => {
                    tracing::debug!(job_id = %job_id, error = %e, "Progress poll failed, continuing");
                }
            }
        }
    }
}
