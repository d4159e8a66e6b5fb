//! Diagnostics snapshot for support reports

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::delivery::{deliver, ClipboardSink, Delivery};
use super::store::{DiagnosticsStore, MethodStatus, PreflightMethodResult, PreflightState};
use crate::actor::ActorSlot;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub mode: String,
    pub dev: bool,
    pub prod: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    pub platform: String,
    pub language: String,
    /// No native counterpart; always false outside a browser host
    pub cookies_enabled: bool,
    /// A backend handle was ready at export time
    pub on_line: bool,
}

/// Build and runtime facts captured once per process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMetadata {
    pub user_agent: String,
    pub build: BuildInfo,
    pub environment: EnvironmentInfo,
    pub runtime: RuntimeInfo,
}

impl EnvironmentMetadata {
    /// Collect metadata from the compiled binary and the process environment
    ///
    /// `CRAFTLINK_BUILD_TIMESTAMP` and `CRAFTLINK_GIT_COMMIT` are read at
    /// compile time when the build sets them.
    pub fn detect() -> Self {
        let mode = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        };
        let version = env!("CARGO_PKG_VERSION");
        let platform = format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH);
        let language = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .ok()
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            user_agent: format!("craftlink/{} ({})", version, platform),
            build: BuildInfo {
                version: Some(version.to_string()),
                timestamp: option_env!("CRAFTLINK_BUILD_TIMESTAMP").map(str::to_string),
                git_commit: option_env!("CRAFTLINK_GIT_COMMIT").map(str::to_string),
                mode: mode.to_string(),
            },
            environment: EnvironmentInfo {
                mode: mode.to_string(),
                dev: cfg!(debug_assertions),
                prod: !cfg!(debug_assertions),
            },
            runtime: RuntimeInfo {
                platform,
                language,
                cookies_enabled: false,
                on_line: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreflightSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PreflightSummary {
    pub fn from_results(results: &[PreflightMethodResult]) -> Self {
        let count = |status: MethodStatus| results.iter().filter(|r| r.status() == status).count();
        Self {
            total: results.len(),
            passed: count(MethodStatus::Pass),
            failed: count(MethodStatus::Fail),
            skipped: count(MethodStatus::Skipped),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub status: String,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    pub actor_available: bool,
    pub results: Vec<PreflightMethodResult>,
    pub summary: PreflightSummary,
}

/// Point-in-time support report
///
/// Derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub build_mode: String,
    pub user_agent: String,
    pub build: BuildInfo,
    pub environment: EnvironmentInfo,
    pub runtime: RuntimeInfo,
    pub preflight: PreflightReport,
}

impl DiagnosticsSnapshot {
    /// Combine metadata with a preflight state; no side effects
    ///
    /// Timestamps are cut to whole milliseconds so the snapshot equals
    /// its own parsed JSON.
    pub fn assemble(
        now: DateTime<Utc>,
        url: &str,
        metadata: &EnvironmentMetadata,
        state: &PreflightState,
    ) -> Self {
        Self {
            timestamp: now.trunc_subsecs(3),
            url: url.to_string(),
            build_mode: metadata.build.mode.clone(),
            user_agent: metadata.user_agent.clone(),
            build: metadata.build.clone(),
            environment: metadata.environment.clone(),
            runtime: metadata.runtime.clone(),
            preflight: PreflightReport {
                status: state.status.as_str().to_string(),
                timestamp: state.timestamp.map(|at| at.trunc_subsecs(3)),
                actor_available: state.actor_available,
                results: state.results.clone(),
                summary: PreflightSummary::from_results(&state.results),
            },
        }
    }

    /// Two-space indented JSON
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl fmt::Display for DiagnosticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preflight = &self.preflight;
        writeln!(f, "Preflight: {}", preflight.status)?;
        writeln!(f, "  actor available: {}", preflight.actor_available)?;
        if preflight.summary.total > 0 {
            writeln!(
                f,
                "  {} passed, {} failed, {} skipped of {}",
                preflight.summary.passed,
                preflight.summary.failed,
                preflight.summary.skipped,
                preflight.summary.total
            )?;
        }
        for result in &preflight.results {
            match result.error() {
                Some(error) => writeln!(
                    f,
                    "  [{}] {}: {}",
                    result.status().as_str(),
                    result.method(),
                    error
                )?,
                None => writeln!(f, "  [{}] {}", result.status().as_str(), result.method())?,
            }
        }
        Ok(())
    }
}

/// Builds snapshots from the live diagnostics store
#[derive(Debug, Clone)]
pub struct DiagnosticsExporter {
    store: DiagnosticsStore,
    metadata: EnvironmentMetadata,
    slot: Option<ActorSlot>,
}

impl DiagnosticsExporter {
    pub fn new(store: DiagnosticsStore, metadata: EnvironmentMetadata) -> Self {
        Self {
            store,
            metadata,
            slot: None,
        }
    }

    /// Report `onLine` from the slot's readiness at export time
    pub fn with_slot(mut self, slot: ActorSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn metadata(&self) -> &EnvironmentMetadata {
        &self.metadata
    }

    /// Snapshot of the store as it is right now
    pub fn snapshot(&self, url: &str) -> DiagnosticsSnapshot {
        let mut snapshot =
            DiagnosticsSnapshot::assemble(Utc::now(), url, &self.metadata, &self.store.state());
        if let Some(slot) = &self.slot {
            snapshot.runtime.on_line = slot.current().is_ready();
        }
        snapshot
    }

    /// Snapshot, serialize and hand the report to the operator
    pub fn export(&self, url: &str, clipboard: Option<&mut dyn ClipboardSink>) -> Result<Delivery> {
        let text = self.snapshot(url).to_pretty_json()?;
        Ok(deliver(text, clipboard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_metadata() -> EnvironmentMetadata {
        EnvironmentMetadata {
            user_agent: "craftlink/0.1.0 (linux-x86_64)".into(),
            build: BuildInfo {
                version: Some("0.1.0".into()),
                timestamp: None,
                git_commit: Some("abc1234".into()),
                mode: "production".into(),
            },
            environment: EnvironmentInfo {
                mode: "production".into(),
                dev: false,
                prod: true,
            },
            runtime: RuntimeInfo {
                platform: "linux-x86_64".into(),
                language: "en_US.UTF-8".into(),
                cookies_enabled: false,
                on_line: true,
            },
        }
    }

    #[test]
    fn test_assemble_is_pure() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let state = PreflightState::default();
        let a = DiagnosticsSnapshot::assemble(now, "app://diagnostics", &fixed_metadata(), &state);
        let b = DiagnosticsSnapshot::assemble(now, "app://diagnostics", &fixed_metadata(), &state);
        assert_eq!(a, b);
        assert_eq!(a.preflight.summary, PreflightSummary::default());
        assert_eq!(a.preflight.status, "idle");
    }

    #[test]
    fn test_json_field_names() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let state = PreflightState {
            results: vec![
                PreflightMethodResult::pass("listGames"),
                PreflightMethodResult::fail("getItem", "transport error: reset"),
            ],
            ..Default::default()
        };
        let snapshot = DiagnosticsSnapshot::assemble(now, "app://", &fixed_metadata(), &state);
        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_pretty_json().unwrap()).unwrap();

        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["buildMode"], "production");
        assert_eq!(json["build"]["gitCommit"], "abc1234");
        assert!(json["build"].get("timestamp").is_none());
        assert_eq!(json["runtime"]["cookiesEnabled"], false);
        assert_eq!(json["runtime"]["onLine"], true);
        assert_eq!(json["preflight"]["summary"]["failed"], 1);
        assert_eq!(
            json["preflight"]["results"][1]["error"],
            "transport error: reset"
        );
    }

    #[test]
    fn test_sub_millisecond_timestamps_round_trip() {
        let now = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let state = PreflightState {
            timestamp: Some(Utc.timestamp_nanos(1_699_999_999_987_654_321)),
            ..Default::default()
        };
        let snapshot = DiagnosticsSnapshot::assemble(now, "app://", &fixed_metadata(), &state);
        assert_eq!(snapshot.timestamp.timestamp_subsec_nanos(), 123_000_000);

        let text = snapshot.to_pretty_json().unwrap();
        let parsed = DiagnosticsSnapshot::from_json(&text).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_display_lists_failures() {
        let state = PreflightState {
            results: vec![PreflightMethodResult::fail("getGame", "boom")],
            ..Default::default()
        };
        let snapshot = DiagnosticsSnapshot::assemble(Utc::now(), "", &fixed_metadata(), &state);
        let text = snapshot.to_string();
        assert!(text.contains("[fail] getGame: boom"));
        assert!(text.contains("0 passed, 1 failed, 0 skipped of 1"));
    }

    #[test]
    fn test_detect_reports_package_version() {
        let metadata = EnvironmentMetadata::detect();
        assert_eq!(
            metadata.build.version.as_deref(),
            Some(env!("CARGO_PKG_VERSION"))
        );
        assert_ne!(metadata.environment.dev, metadata.environment.prod);
        assert!(metadata.user_agent.starts_with("craftlink/"));
    }
}
