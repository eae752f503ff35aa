//! The job record: lifecycle state, polling flag, and last-known progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Granularity, JobId, Mode};

// ---------------------------------------------------------------------------
// Stage constants
// ---------------------------------------------------------------------------

/// Placeholder stage used before the first successful progress poll.
pub const STAGE_INITIALIZING: &str = "initializing";
/// Design documents are being structured.
pub const STAGE_STRUCTURING: &str = "structuring";
/// Changes between old and new documents are being detected.
pub const STAGE_DIFF: &str = "diff";
/// Test perspectives are being extracted.
pub const STAGE_PERSPECTIVES: &str = "perspectives";
/// The test specification is being generated.
pub const STAGE_TESTSPEC: &str = "testspec";
/// Output artifacts are being converted.
pub const STAGE_CONVERTING: &str = "converting";

/// Display label for a known stage, `None` for anything else.
pub fn stage_label(stage: &str) -> Option<&'static str> {
    match stage {
        STAGE_INITIALIZING => Some("Starting processing..."),
        STAGE_STRUCTURING => Some("Structuring design documents..."),
        STAGE_DIFF => Some("Detecting changes..."),
        STAGE_PERSPECTIVES => Some("Extracting test perspectives..."),
        STAGE_TESTSPEC => Some("Generating test specification..."),
        STAGE_CONVERTING => Some("Converting deliverables..."),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Last-known progress of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: String,
    pub message: String,
    /// Completion percentage, always within 0..=100.
    pub percent: u8,
}

impl Progress {
    /// Value shown before any progress report has been received.
    pub fn initializing() -> Self {
        Self {
            stage: STAGE_INITIALIZING.to_string(),
            message: String::new(),
            percent: 0,
        }
    }

    /// `"<label> (<percent>%)"`, where the label comes from the stage table
    /// and falls back to the raw message for unknown stages.
    pub fn display_text(&self) -> String {
        let label = stage_label(&self.stage).unwrap_or(self.message.as_str());
        format!("{label} ({}%)", self.percent)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::initializing()
    }
}

/// JSON body returned by the progress endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressReport {
    pub stage: String,
    #[serde(default)]
    pub message: String,
    /// Raw percentage as sent by the server; may be fractional or out of
    /// range.
    pub progress: f64,
    /// Server-side update time, informational only.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<ProgressReport> for Progress {
    fn from(report: ProgressReport) -> Self {
        Self {
            stage: report.stage,
            message: report.message,
            percent: report.progress.round().clamp(0.0, 100.0) as u8,
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Error returned for a transition the lifecycle does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid job transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// One client-initiated generation request.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub mode: Mode,
    pub granularity: Granularity,
    state: JobState,
    polling: bool,
    pub progress: Progress,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create an `Idle` job with a fresh identifier.
    pub fn new(mode: Mode, granularity: Granularity) -> Self {
        Self::with_id(JobId::generate(), mode, granularity)
    }

    pub fn with_id(id: JobId, mode: Mode, granularity: Granularity) -> Self {
        Self {
            id,
            mode,
            granularity,
            state: JobState::Idle,
            polling: false,
            progress: Progress::initializing(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// `Idle -> Submitting`.
    pub fn begin_submitting(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Idle, JobState::Submitting)
    }

    /// `Submitting -> Succeeded`; also clears the polling flag.
    pub fn succeed(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Submitting, JobState::Succeeded)?;
        self.finish();
        Ok(())
    }

    /// `Submitting -> Failed`; also clears the polling flag.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Submitting, JobState::Failed)?;
        self.finish();
        Ok(())
    }

    /// Turn polling on or off. Polling can only be switched on while the job
    /// is submitting; returns whether the flag now has the requested value.
    pub fn set_polling(&mut self, on: bool) -> bool {
        if on && self.state != JobState::Submitting {
            return false;
        }
        self.polling = on;
        true
    }

    /// Wall-clock time from creation to the terminal transition.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.created_at)
    }

    fn transition(&mut self, from: JobState, to: JobState) -> Result<(), TransitionError> {
        if self.state != from {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    fn finish(&mut self) {
        self.polling = false;
        self.finished_at = Some(Utc::now());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(Mode::SingleDocument, Granularity::default())
    }

    #[test]
    fn new_job_is_idle_with_initializing_progress() {
        let job = job();
        assert_eq!(job.state(), JobState::Idle);
        assert!(!job.is_polling());
        assert_eq!(job.progress, Progress::initializing());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn polling_requires_submitting_state() {
        let mut job = job();
        assert!(!job.set_polling(true));
        assert!(!job.is_polling());

        job.begin_submitting().unwrap();
        assert!(job.set_polling(true));
        assert!(job.is_polling());
    }

    #[test]
    fn terminal_transitions_stop_polling() {
        let mut job = job();
        job.begin_submitting().unwrap();
        job.set_polling(true);
        job.succeed().unwrap();

        assert_eq!(job.state(), JobState::Succeeded);
        assert!(!job.is_polling());
        assert!(!job.set_polling(true));
        assert!(job.elapsed().is_some());
    }

    #[test]
    fn terminal_state_cannot_be_left() {
        let mut job = job();
        job.begin_submitting().unwrap();
        job.fail().unwrap();

        let err = job.succeed().unwrap_err();
        assert_eq!(err.from, JobState::Failed);
        assert_eq!(err.to, JobState::Succeeded);
        assert!(job.begin_submitting().is_err());
    }

    #[test]
    fn idle_job_cannot_fail_directly() {
        assert!(job().fail().is_err());
    }

    #[test]
    fn known_stage_uses_label() {
        let progress = Progress {
            stage: STAGE_TESTSPEC.into(),
            message: "ignored".into(),
            percent: 60,
        };
        assert_eq!(
            progress.display_text(),
            "Generating test specification... (60%)"
        );
    }

    #[test]
    fn unknown_stage_falls_back_to_message() {
        let progress = Progress {
            stage: "uploading".into(),
            message: "Uploading artifacts".into(),
            percent: 95,
        };
        assert_eq!(progress.display_text(), "Uploading artifacts (95%)");
    }

    #[test]
    fn report_percent_is_clamped() {
        let json = r#"{"stage":"diff","message":"m","progress":140}"#;
        let report: ProgressReport = serde_json::from_str(json).unwrap();
        assert_eq!(Progress::from(report).percent, 100);

        let json = r#"{"stage":"diff","progress":-3,"timestamp":"2024-05-01T10:00:00.123456"}"#;
        let report: ProgressReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.timestamp.as_deref(), Some("2024-05-01T10:00:00.123456"));
        let progress = Progress::from(report);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.message, "");
    }

    #[test]
    fn fractional_percent_is_rounded() {
        let json = r#"{"stage":"diff","message":"m","progress":42.5}"#;
        let report: ProgressReport = serde_json::from_str(json).unwrap();
        assert_eq!(Progress::from(report).percent, 43);

        let json = r#"{"stage":"testspec","message":"m","progress":99.4}"#;
        let report: ProgressReport = serde_json::from_str(json).unwrap();
        let progress = Progress::from(report);
        assert_eq!(progress.percent, 99);
        assert_eq!(progress.display_text(), "Generating test specification... (99%)");
    }
}
