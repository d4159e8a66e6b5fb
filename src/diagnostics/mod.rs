//! Startup diagnostics: the preflight sweep, its store, and the support report

pub mod delivery;
pub mod export;
pub mod preflight;
pub mod probes;
pub mod store;

pub use delivery::{deliver, ClipboardError, ClipboardSink, Delivery, ManualCopy};
#[cfg(feature = "clipboard")]
pub use delivery::SystemClipboard;
pub use export::{
    BuildInfo, DiagnosticsExporter, DiagnosticsSnapshot, EnvironmentInfo, EnvironmentMetadata,
    PreflightReport, PreflightSummary, RuntimeInfo,
};
pub use preflight::{PreflightRunner, Trigger};
pub use probes::{default_probes, ProbeError, ProbeSpec, ResponseShape};
pub use store::{
    DiagnosticsStore, MethodStatus, PreflightMethodResult, PreflightRecorder, PreflightState,
    PreflightStatus,
};
