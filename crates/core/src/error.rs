/// Failure reported by a job service call (submission or progress query).
///
/// Transport-agnostic: the HTTP client converts its own errors into this
/// type, and test doubles construct it directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// HTTP status code, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
