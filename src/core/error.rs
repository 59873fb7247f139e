//! Error types for the logging facade

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Template placeholders and supplied arguments disagree
    #[error("Template expects {expected} argument(s), got {got}")]
    ArgumentMismatch { expected: usize, got: usize },

    /// Unknown severity token or numeric level
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File backend error with path
    #[error("File backend error for '{path}': {message}")]
    FileBackendError { path: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an argument mismatch error
    pub fn argument_mismatch(expected: usize, got: usize) -> Self {
        LoggerError::ArgumentMismatch { expected, got }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file backend error
    pub fn file_backend(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileBackendError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error indicates a bug at the call site rather than a
    /// runtime condition
    #[must_use]
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            LoggerError::ArgumentMismatch { .. } | LoggerError::InvalidLevel(_)
        )
    }
}
