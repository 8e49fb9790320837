use std::io;
use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A model artifact (vectorizer or classifier) is missing, corrupt or incompatible.
    /// Raised at load time only; the assistant cannot serve turns without it.
    #[error("Model artifact error: {0}")]
    Artifact(String),

    /// The emotion model failed to load or to score a text.
    #[error("Emotion model error: {0}")]
    Emotion(String),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., unparsable environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A session id that the registry does not know about.
    #[error("Session error: {0}")]
    Session(String),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error prevents the assistant from serving any turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Artifact(_) | AppError::Config(_) | AppError::Validation(_))
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Artifact(s) => AppError::Artifact(s.clone()),
            AppError::Emotion(s) => AppError::Emotion(s.clone()),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Session(s) => AppError::Session(s.clone()),
            AppError::Internal(s) => AppError::Internal(s.clone()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Validation(format!("Date parse error: {}", err))
    }
}
