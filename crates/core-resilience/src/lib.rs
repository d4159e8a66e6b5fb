//! Craftlink Resilience: Pure-logic fault tolerance primitives
//!
//! # Overview
//!
//! Building blocks for calling a remote backend that may fail transiently:
//!
//! - **Retry**: at most one extra attempt, only for transient failures
//! - **Deadline**: bound a single call, turning expiry into a typed error
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of the backend, its
//! records, or how failures are reported to users. Callers classify their own
//! errors into [`ResilienceError`] before handing operations over.
//!
//! # Usage Example
//!
//! ```no_run
//! use craftlink_resilience::{retry, ResilienceError, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), ResilienceError> {
//! let policy = RetryPolicy::new(1, Duration::from_millis(250))?
//!     .with_attempt_timeout(Some(Duration::from_secs(10)));
//!
//! let games = retry(&policy, || async {
//!     // Your potentially failing remote call
//!     Ok::<_, ResilienceError>(vec!["valheim"])
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod retry;

pub use error::ResilienceError;
pub use retry::{retry, within, RetryPolicy};
