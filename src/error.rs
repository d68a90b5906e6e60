use thiserror::Error;

/// Errors surfaced by the frame gate.
///
/// A frame without detections is not an error; it produces a zero-confidence
/// result. Only malformed input and session bookkeeping mistakes land here.
#[derive(Debug, Error)]
pub enum FrameGateError {
    /// The frame could not be decoded or its dimensions do not match its bytes.
    /// Callers should skip the frame and keep streaming.
    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    /// The session id was never opened or has been closed.
    #[error("unknown session: {session_id}")]
    UnknownSession { session_id: String },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A thread panicked while holding a session or registry lock.
    #[error("{what} lock poisoned")]
    Poisoned { what: &'static str },

    /// The retained frame could not be encoded for output. The input stream
    /// is unaffected.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl FrameGateError {
    pub(crate) fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_session(session_id: &str) -> Self {
        Self::UnknownSession {
            session_id: session_id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameGateError>;
