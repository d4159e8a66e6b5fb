//! Error type shared by the resilience primitives

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError {
    /// Failure that may succeed on another attempt (network blip, reset)
    #[error("transient failure: {0}")]
    Transient(String),

    /// Failure that will not change on retry
    #[error("permanent failure: {0}")]
    Permanent(String),

    /// The attempt did not finish within its deadline
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ResilienceError {
    /// Check if another attempt is worthwhile
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResilienceError::Transient(_) | ResilienceError::Timeout(_)
        )
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, ResilienceError::Permanent(_))
    }
}
