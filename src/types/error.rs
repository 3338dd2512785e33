//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provider failures carry a classification that drives the fallback
//! controller's rotate-or-abort decision.
//!
//! ## Error Taxonomy
//!
//! - **ProviderExhausted**: every model candidate was rate-limited; retryable later
//! - **Provider**: non-rate-limit provider failure; not auto-retried
//! - **MalformedOutput**: final text failed the strict parse after stream completion
//! - **Persistence**: store write failed after successful generation
//! - Taxonomy slug conflicts are resolved internally via read-after-conflict
//!   and never surface as errors

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Provider Error
// =============================================================================

/// Classification of a provider failure, used for rotation decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Rate limited or quota exhausted - rotate to the next candidate
    RateLimit,
    /// Model unavailable, overloaded, or unknown - rotate to the next candidate
    Unavailable,
    /// Anything else - abort without rotating
    Other,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

impl ProviderErrorKind {
    /// Whether the fallback controller should rotate to the next candidate.
    /// Rotating on unrelated errors would mask real bugs, so only rate-limit
    /// and availability failures qualify.
    pub fn rotates(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Unavailable)
    }
}

/// Structured provider error with classification and retry hints
#[derive(Debug, Clone, Error)]
#[error("[{model}:{kind}] {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Model candidate that produced the error
    pub model: String,
    /// Suggested wait before retrying (from a 429 response, if any)
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        message: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            model: model.into(),
            retry_after: None,
        }
    }

    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn rotates(&self) -> bool {
        self.kind.rotates()
    }

    /// Classify from an HTTP status code (more accurate than string matching)
    pub fn from_http_status(status: u16, message: impl Into<String>, model: &str) -> Self {
        let kind = match status {
            429 => ProviderErrorKind::RateLimit,
            404 | 500 | 502 | 503 => ProviderErrorKind::Unavailable,
            _ => ProviderErrorKind::Other,
        };
        let mut err = Self::new(kind, message, model);
        if status == 429 {
            err.retry_after = Some(Duration::from_secs(30));
        }
        err
    }

    /// Classify from an error message when no status code is available
    pub fn from_message(message: impl Into<String>, model: &str) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("429")
            || lower.contains("rate limit")
            || lower.contains("quota")
            || lower.contains("resource exhausted")
            || lower.contains("too many requests")
        {
            return Self::new(ProviderErrorKind::RateLimit, message, model)
                .retry_after(Duration::from_secs(30));
        }

        if lower.contains("404")
            || lower.contains("not found")
            || lower.contains("overloaded")
            || lower.contains("unavailable")
            || lower.contains("503")
        {
            return Self::new(ProviderErrorKind::Unavailable, message, model);
        }

        Self::new(ProviderErrorKind::Other, message, model)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CardforgeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    /// Non-rate-limit provider failure; aborts the request without rotation
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Every candidate in the fallback list was rate-limited or unavailable
    #[error("All model candidates exhausted; last error: {last}")]
    ProviderExhausted { last: ProviderError },

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    /// Final text failed the strict parse even after stream completion
    #[error("Malformed provider output: {0}")]
    MalformedOutput(String),

    /// Store write failed after generation succeeded. The generated items are
    /// still returned to the caller; this error is the operator-visible signal
    /// that storage broke, not the provider.
    #[error("Persistence error: {0}")]
    Persistence(String),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'cardforge init' first")]
    NotInitialized,
}

impl From<ProviderError> for CardforgeError {
    fn from(err: ProviderError) -> Self {
        CardforgeError::Provider(err)
    }
}

pub type Result<T> = std::result::Result<T, CardforgeError>;

impl CardforgeError {
    /// Whether this is a "try again later" failure (quota will recover)
    pub fn is_retry_later(&self) -> bool {
        matches!(self, Self::ProviderExhausted { .. })
    }

    /// Whether the underlying database error is a uniqueness-constraint
    /// violation. The category resolver relies on this to detect a concurrent
    /// creation of the same slug.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error, converting it to a persistence error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| CardforgeError::Persistence(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| CardforgeError::Persistence(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_rotates() {
        assert!(ProviderErrorKind::RateLimit.rotates());
        assert!(ProviderErrorKind::Unavailable.rotates());
        assert!(!ProviderErrorKind::Other.rotates());
    }

    #[test]
    fn test_classify_http_status() {
        let rate = ProviderError::from_http_status(429, "Too many requests", "gemini-2.5-flash");
        assert_eq!(rate.kind, ProviderErrorKind::RateLimit);
        assert!(rate.retry_after.is_some());

        let missing = ProviderError::from_http_status(404, "model not found", "gemma-3-27b-it");
        assert_eq!(missing.kind, ProviderErrorKind::Unavailable);

        let auth = ProviderError::from_http_status(401, "bad key", "gemini-2.5-flash");
        assert_eq!(auth.kind, ProviderErrorKind::Other);
        assert!(!auth.rotates());
    }

    #[test]
    fn test_classify_message() {
        let quota = ProviderError::from_message("Quota exceeded for project", "m");
        assert_eq!(quota.kind, ProviderErrorKind::RateLimit);

        let exhausted = ProviderError::from_message("RESOURCE EXHAUSTED", "m");
        assert_eq!(exhausted.kind, ProviderErrorKind::RateLimit);

        let overloaded = ProviderError::from_message("The model is overloaded", "m");
        assert_eq!(overloaded.kind, ProviderErrorKind::Unavailable);

        let weird = ProviderError::from_message("something else entirely", "m");
        assert_eq!(weird.kind, ProviderErrorKind::Other);
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::new(ProviderErrorKind::RateLimit, "slow down", "gemini-2.5-flash");
        assert_eq!(err.to_string(), "[gemini-2.5-flash:RATE_LIMIT] slow down");
    }

    #[test]
    fn test_exhausted_is_retry_later() {
        let last = ProviderError::new(ProviderErrorKind::RateLimit, "429", "m");
        let err = CardforgeError::ProviderExhausted { last };
        assert!(err.is_retry_later());
        assert!(!CardforgeError::MalformedOutput("x".into()).is_retry_later());
    }

    #[test]
    fn test_with_context() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = io.with_context("writing set").unwrap_err();
        assert!(matches!(err, CardforgeError::Persistence(_)));
        assert!(err.to_string().contains("writing set"));
    }
}
