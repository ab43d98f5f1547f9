use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeftError {
    /// Invalid route pattern or a handler whose shape cannot be bound to
    /// the pattern's captures. Raised at registration, never at match time.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// No registered route accepted the path/method pair.
    #[error("no route matched {method} {path}")]
    NoMatch { method: String, path: String },

    /// A handler panicked during invocation.
    #[error("handler failure on {pattern}: {message}")]
    HandlerFailure { pattern: String, message: String },

    /// The response stream failed mid-write (typically a disconnected
    /// client). There is no addressee left to report a status to.
    #[error("response write failed: {0}")]
    Write(#[from] std::io::Error),
}

impl WeftError {
    pub fn configuration(message: impl Into<String>) -> Self {
        WeftError::Configuration {
            message: message.into(),
        }
    }
}
