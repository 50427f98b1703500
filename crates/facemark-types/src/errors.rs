use thiserror::Error;

use crate::outcome::ServiceResponse;

pub type Result<T, E = FacemarkError> = std::result::Result<T, E>;

/// Unified error type covering failures across the capture, submission and
/// moderation paths.
#[derive(Debug, Error)]
pub enum FacemarkError {
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Camera acquisition failed; the whole flow has to be re-triggered.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("capture error: {0}")]
    Capture(String),
    /// Network failure, non-2xx reply or an unparseable body.
    #[error("transport error: {0}")]
    Transport(String),
    /// Request refused on business grounds before it reached the service.
    #[error("{0}")]
    Domain(String),
    /// Non-2xx reply whose JSON body still names an `error`. The body is kept
    /// whole because some endpoints send a complete record alongside it.
    #[error("{}", .reply.text("error").unwrap_or_default())]
    Rejected { status: u16, reply: ServiceResponse },
    #[error("{0} is already in progress")]
    Busy(&'static str),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FacemarkError {
    /// Text shown to the operator, without the category prefix for failures
    /// whose message already comes from the service.
    pub fn user_message(&self) -> String {
        match self {
            FacemarkError::Transport(message) | FacemarkError::Domain(message) => message.clone(),
            FacemarkError::Rejected { reply, .. } => {
                reply.text("error").unwrap_or_default().to_string()
            }
            other => other.to_string(),
        }
    }
}
