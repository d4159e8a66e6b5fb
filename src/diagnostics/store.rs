//! Preflight diagnostics store
//!
//! Holds the one `PreflightState` of the session. Reading and writing are
//! split across two handles: any number of cloned [`DiagnosticsStore`]
//! readers, and a single [`PreflightRecorder`] that the preflight runner
//! owns. The writer is not `Clone`, so there is exactly one place that can
//! mutate the state.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Outcome of one probed remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodStatus {
    Pass,
    Fail,
    Skipped,
}

impl MethodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodStatus::Pass => "pass",
            MethodStatus::Fail => "fail",
            MethodStatus::Skipped => "skipped",
        }
    }
}

/// Result of probing one remote operation
///
/// Built through [`pass`](Self::pass), [`fail`](Self::fail) and
/// [`skipped`](Self::skipped) so that `error` is present exactly when the
/// status is `fail`. Parsed reports are held to the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMethodResult")]
pub struct PreflightMethodResult {
    method: String,
    status: MethodStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawMethodResult {
    method: String,
    status: MethodStatus,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawMethodResult> for PreflightMethodResult {
    type Error = String;

    fn try_from(raw: RawMethodResult) -> Result<Self, Self::Error> {
        match (raw.status, raw.error) {
            (MethodStatus::Fail, Some(error)) => Ok(Self::fail(raw.method, error)),
            (MethodStatus::Fail, None) => {
                Err(format!("{}: failed result without an error", raw.method))
            }
            (MethodStatus::Pass, None) => Ok(Self::pass(raw.method)),
            (MethodStatus::Skipped, None) => Ok(Self::skipped(raw.method)),
            (status, Some(_)) => Err(format!(
                "{}: {} result carries an error",
                raw.method,
                status.as_str()
            )),
        }
    }
}

impl PreflightMethodResult {
    pub fn pass(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            status: MethodStatus::Pass,
            error: None,
        }
    }

    pub fn fail(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            status: MethodStatus::Fail,
            error: Some(error.into()),
        }
    }

    pub fn skipped(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            status: MethodStatus::Skipped,
            error: None,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn status(&self) -> MethodStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pass(&self) -> bool {
        self.status == MethodStatus::Pass
    }
}

/// Session-level preflight status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreflightStatus {
    #[default]
    Idle,
    Running,
    Complete,
    Skipped,
}

impl PreflightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreflightStatus::Idle => "idle",
            PreflightStatus::Running => "running",
            PreflightStatus::Complete => "complete",
            PreflightStatus::Skipped => "skipped",
        }
    }

    /// No further transition happens without a reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, PreflightStatus::Complete | PreflightStatus::Skipped)
    }
}

impl fmt::Display for PreflightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The session's preflight record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightState {
    pub status: PreflightStatus,
    /// Time of the last status transition
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    pub actor_available: bool,
    /// Meaningful only when `status` is `complete`
    #[serde(default)]
    pub results: Vec<PreflightMethodResult>,
}

impl PreflightState {
    /// Count results with the given status
    pub fn count(&self, status: MethodStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Wall-clock time at the precision the state serializes with
fn transition_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Read handle on the session's preflight state
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct DiagnosticsStore {
    tx: Arc<watch::Sender<PreflightState>>,
}

impl DiagnosticsStore {
    /// Create the store in its idle state, together with its only writer
    pub fn new() -> (Self, PreflightRecorder) {
        let (tx, _rx) = watch::channel(PreflightState::default());
        let tx = Arc::new(tx);
        (Self { tx: tx.clone() }, PreflightRecorder { tx })
    }

    /// Copy of the current state
    pub fn state(&self) -> PreflightState {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> PreflightStatus {
        self.tx.borrow().status
    }

    /// Observe every subsequent mutation
    pub fn subscribe(&self) -> watch::Receiver<PreflightState> {
        self.tx.subscribe()
    }
}

impl fmt::Debug for DiagnosticsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DiagnosticsStore")
            .field(&*self.tx.borrow())
            .finish()
    }
}

/// The single writer of the diagnostics store
///
/// Each mutation replaces the state and notifies observers before returning.
#[derive(Debug)]
pub struct PreflightRecorder {
    tx: Arc<watch::Sender<PreflightState>>,
}

impl PreflightRecorder {
    /// A read handle on the store this recorder writes
    pub fn store(&self) -> DiagnosticsStore {
        DiagnosticsStore {
            tx: self.tx.clone(),
        }
    }

    /// A sweep has started against an available actor
    pub fn set_running(&self) {
        self.tx.send_modify(|state| {
            state.status = PreflightStatus::Running;
            state.timestamp = Some(transition_time());
            state.actor_available = true;
        });
        debug!("preflight state -> running");
    }

    /// No actor was available; the session will not be probed
    pub fn set_skipped(&self) {
        self.tx.send_modify(|state| {
            state.status = PreflightStatus::Skipped;
            state.timestamp = Some(transition_time());
            state.actor_available = false;
            state.results.clear();
        });
        debug!("preflight state -> skipped");
    }

    /// Store the full result set of a finished sweep
    pub fn set_complete(&self, results: Vec<PreflightMethodResult>) {
        let count = results.len();
        self.tx.send_modify(|state| {
            state.status = PreflightStatus::Complete;
            state.timestamp = Some(transition_time());
            state.actor_available = true;
            state.results = results;
        });
        debug!(results = count, "preflight state -> complete");
    }

    /// Return to the initial idle state
    pub fn reset(&self) {
        self.tx.send_replace(PreflightState::default());
        debug!("preflight state reset");
    }
}
