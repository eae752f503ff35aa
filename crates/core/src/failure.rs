//! Classification of terminal job failures into user-facing messages.

use serde::Serialize;

use crate::error::ServiceError;

/// Why a job ended in the `Failed` state.
///
/// The [`Display`](std::fmt::Display) text is what the user sees as status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum JobFailure {
    /// 401/403, typically the caller's address is not allow-listed.
    #[error("Access denied (IP restriction)")]
    AccessDenied,

    /// 400, the server rejected the input; body text is shown verbatim.
    #[error("Input error: {0}")]
    InvalidInput(String),

    /// 500, processing failed server-side; the body is not shown.
    #[error("Server error: a problem occurred during processing")]
    ServerError,

    /// Any other non-2xx status.
    #[error("Error: {0}")]
    UnexpectedStatus(u16),

    /// No response was received (DNS, connection, aborted transfer).
    #[error("Communication error: {0}")]
    Communication(String),

    /// A local step of the submission path failed (reading inputs,
    /// writing the archive).
    #[error("Error: {0}")]
    Internal(String),
}

impl JobFailure {
    /// Classify a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::AccessDenied,
            400 => Self::InvalidInput(body.to_string()),
            500 => Self::ServerError,
            other => Self::UnexpectedStatus(other),
        }
    }
}

impl From<ServiceError> for JobFailure {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Status { status, body } => Self::from_status(status, &body),
            ServiceError::Transport(message) => Self::Communication(message),
            ServiceError::Decode(message) => Self::Communication(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn auth_statuses_are_access_denied() {
        assert_eq!(JobFailure::from_status(401, ""), JobFailure::AccessDenied);
        assert_eq!(JobFailure::from_status(403, "blocked"), JobFailure::AccessDenied);
        assert_eq!(
            JobFailure::AccessDenied.to_string(),
            "Access denied (IP restriction)"
        );
    }

    #[test]
    fn bad_request_surfaces_body_verbatim() {
        let failure = JobFailure::from_status(400, "Only .xlsx files are supported");
        assert_eq!(
            failure.to_string(),
            "Input error: Only .xlsx files are supported"
        );
    }

    #[test]
    fn server_error_hides_body() {
        let failure = JobFailure::from_status(500, "Traceback (most recent call last)");
        assert_eq!(failure, JobFailure::ServerError);
        assert!(!failure.to_string().contains("Traceback"));
    }

    #[test]
    fn other_statuses_include_the_code() {
        let failure = JobFailure::from_status(502, "");
        assert_eq!(failure.to_string(), "Error: 502");
    }

    #[test]
    fn transport_errors_are_communication_failures() {
        let failure = JobFailure::from(ServiceError::Transport("connection refused".into()));
        assert_matches!(failure, JobFailure::Communication(ref m) if m == "connection refused");
        assert_eq!(failure.to_string(), "Communication error: connection refused");
    }

    #[test]
    fn service_status_errors_are_classified() {
        let failure = JobFailure::from(ServiceError::Status {
            status: 403,
            body: String::new(),
        });
        assert_eq!(failure, JobFailure::AccessDenied);
    }
}
