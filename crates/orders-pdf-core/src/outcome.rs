use crate::validate::ValidationFailed;

/// Result of a single retrieval strategy attempt.
///
/// Only `NotFound` and `ValidationFailed` let the resolution chain move on
/// to the next strategy; an upstream error ends the chain.
#[derive(Debug)]
pub enum FetchOutcome<D> {
    Success(D),
    NotFound { detail: String },
    UpstreamError { code: Option<u16>, message: String },
    ValidationFailed(ValidationFailed),
}

impl<D> FetchOutcome<D> {
    /// Classify a failed HTTP status. 404 and 410 mean "nothing here".
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        match code {
            404 | 410 => FetchOutcome::NotFound {
                detail: message.into(),
            },
            _ => FetchOutcome::UpstreamError {
                code: Some(code),
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// Whether the chain may try the next strategy after this outcome.
    pub fn advances_chain(&self) -> bool {
        matches!(
            self,
            FetchOutcome::NotFound { .. } | FetchOutcome::ValidationFailed(_)
        )
    }

    /// Short human-readable summary of a failed outcome.
    pub fn describe(&self) -> String {
        match self {
            FetchOutcome::Success(_) => "ok".to_string(),
            FetchOutcome::NotFound { detail } => format!("not found ({})", detail),
            FetchOutcome::UpstreamError {
                code: Some(code),
                message,
            } => format!("HTTP {}: {}", code, message),
            FetchOutcome::UpstreamError { code: None, message } => message.clone(),
            FetchOutcome::ValidationFailed(v) => v.to_string(),
        }
    }
}
