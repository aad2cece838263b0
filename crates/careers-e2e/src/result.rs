//! Result and error types for the acceptance suite.

use thiserror::Error;

/// Result type for suite operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving the browser or reporting results
#[derive(Debug, Error)]
pub enum E2eError {
    /// Browser executable not found
    #[error("Browser not found for engine {engine}. Install it or set {env_hint}")]
    BrowserNotFound {
        /// Engine that was requested
        engine: String,
        /// Environment variable that overrides the executable path
        env_hint: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation error
    #[error("Script evaluation failed: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// Input simulation error (click, keys)
    #[error("Input failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A critical page element did not resolve within the wait budget
    #[error("Critical element missing on {page}: {locator}")]
    CriticalElementMissing {
        /// Page object name
        page: String,
        /// Locator that failed to resolve
        locator: String,
    },

    /// Window/tab switching error
    #[error("Window error: {message}")]
    WindowError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Scenario assertion failed
    #[error("Assertion failed at step '{step}': {message}")]
    AssertionFailed {
        /// Scenario step label
        step: String,
        /// Error message
        message: String,
    },

    /// Result reporting error (callers are expected to swallow this)
    #[error("Reporting failed: {message}")]
    ReportingError {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl E2eError {
    /// Shorthand for an assertion failure at a named scenario step
    pub fn assertion(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_shorthand() {
        let err = E2eError::assertion("open home", "title mismatch");
        assert!(err.to_string().contains("open home"));
        assert!(err.to_string().contains("title mismatch"));
    }

    #[test]
    fn test_timeout_display() {
        let err = E2eError::Timeout { ms: 10_000 };
        assert_eq!(err.to_string(), "Operation timed out after 10000ms");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: E2eError = io.into();
        assert!(matches!(err, E2eError::Io(_)));
    }
}
