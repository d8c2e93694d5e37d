use crate::ctx::Ctx;
use std::time::Duration;
use thiserror::Error;

/// The result of running a step: a new state plus what to do next.
pub type StepResult<S> = Result<(S, Outcome), StepError>;

/// A sync workflow step that transforms state.
///
/// The crew wraps every task in one of these; implement it directly to plug
/// custom steps into a [`crate::Workflow`].
pub trait Agent<S>: Send + 'static {
    /// A unique name for this step, used as its key in the workflow.
    fn name(&self) -> &'static str;

    /// Run one step. Returns the updated state and an [`Outcome`] that tells
    /// the runner what to do next.
    fn run(&mut self, state: S, ctx: &mut Ctx) -> StepResult<S>;
}

/// Control flow for the runner.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Follow the workflow's default next step (set via `.then()`).
    Continue,
    /// Workflow complete, return the final state.
    Done,
    /// Re-run the current step (counted against `max_retries`).
    Retry(RetryHint),
    /// Sleep for the given duration, then re-run (counted against `max_retries`).
    Wait(Duration),
    /// Stop the workflow with an error.
    Fail(String),
}

/// Why a step asked to be re-run.
#[derive(Debug, Clone)]
pub struct RetryHint {
    pub reason: String,
}

impl RetryHint {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Error type for steps, tools and model calls, with variants designed
/// around what the caller can do about them.
#[derive(Debug, Error)]
pub enum StepError {
    /// Bad input or a rejected request. Don't retry.
    #[error("invalid: {0}")]
    Invalid(String),
    /// Transient failure (network, upstream 5xx). Retrying might help.
    #[error("transient: {0}")]
    Transient(String),
    /// The upstream asked us to slow down.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },
    /// A step decided to fail explicitly via Outcome::Fail.
    #[error("failed: {0}")]
    Failed(String),
    #[error("{0}")]
    Other(String),
}

impl From<ureq::Error> for StepError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => StepError::from_status(code, "", None),
            ureq::Error::Json(err) => StepError::Invalid(format!("malformed json: {err}")),
            ureq::Error::BadUri(uri) => StepError::Invalid(format!("bad uri: {uri}")),
            other => StepError::Transient(other.to_string()),
        }
    }
}

impl From<std::io::Error> for StepError {
    fn from(e: std::io::Error) -> Self {
        StepError::Other(e.to_string())
    }
}

impl StepError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StepError::Invalid(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        StepError::Other(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        StepError::Transient(msg.into())
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(code: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let message = if body.trim().is_empty() {
            format!("http status {code}")
        } else {
            format!("http status {code}: {}", body.trim())
        };
        match code {
            429 => StepError::RateLimited {
                message,
                retry_after,
            },
            408 | 500..=599 => StepError::Transient(message),
            _ => StepError::Invalid(message),
        }
    }

    /// Whether another attempt, or another endpoint, could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StepError::Transient(_) | StepError::RateLimited { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- constructors and Display ---

    #[test]
    fn invalid_constructor() {
        let err = StepError::invalid("bad input");
        assert!(matches!(err, StepError::Invalid(ref msg) if msg == "bad input"));
        assert_eq!(err.to_string(), "invalid: bad input");
    }

    #[test]
    fn transient_display() {
        assert_eq!(StepError::transient("timeout").to_string(), "transient: timeout");
    }

    #[test]
    fn other_display_is_bare_message() {
        assert_eq!(StepError::other("something").to_string(), "something");
    }

    #[test]
    fn failed_display() {
        assert_eq!(StepError::Failed("nope".into()).to_string(), "failed: nope");
    }

    // --- status classification ---

    #[test]
    fn status_429_is_rate_limited_with_hint() {
        let err = StepError::from_status(429, "slow down", Some(Duration::from_secs(3)));
        match err {
            StepError::RateLimited {
                message,
                retry_after,
            } => {
                assert!(message.contains("slow down"));
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn status_5xx_is_transient() {
        assert!(matches!(
            StepError::from_status(503, "", None),
            StepError::Transient(ref msg) if msg == "http status 503"
        ));
    }

    #[test]
    fn status_401_is_invalid_and_not_recoverable() {
        let err = StepError::from_status(401, "no auth", None);
        assert!(matches!(err, StepError::Invalid(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn ureq_status_error_is_classified() {
        let err: StepError = ureq::Error::StatusCode(502).into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let step_err: StepError = io_err.into();
        assert!(matches!(step_err, StepError::Other(msg) if msg.contains("file missing")));
    }

    #[test]
    fn retry_hint_new() {
        assert_eq!(RetryHint::new("reason").reason, "reason");
    }
}
