//! Errors at the collaborator boundary
//!
//! Matching never fails: "no command" is a normal outcome.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Microphone or speech permission missing; needs external remediation
    #[error("permission denied (microphone or speech recognition)")]
    PermissionDenied,

    #[error("speech recognition is currently unavailable")]
    BackendUnavailable,

    /// "No speech detected"; recovered by a delayed capture restart
    #[error("no speech detected")]
    BackendTransient,

    /// Any other backend failure; capture restarts immediately
    #[error("recognizer error: {0}")]
    BackendFatal(String),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("engine runtime has shut down")]
    RuntimeClosed,
}

impl EngineError {
    /// Classify a raw backend error message
    pub fn from_backend_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("no speech") {
            EngineError::BackendTransient
        } else {
            EngineError::BackendFatal(message.to_string())
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::BackendTransient)
    }
}
