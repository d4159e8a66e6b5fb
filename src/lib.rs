/*!
 * Craftlink - client-side access layer for the crafting catalog backend
 *
 * - One-shot preflight sweep probing every remote read operation
 * - Single-writer diagnostics store with observable state
 * - Cached, gated query wrappers that never surface remote failures
 * - Support report export with clipboard or manual-copy delivery
 */

pub mod actor;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod query;

// Re-export commonly used types
pub use actor::{ActorSlot, ActorState};
pub use config::{CraftlinkConfig, LogLevel, LoggingConfig, PreflightConfig, QueryConfig};
pub use diagnostics::{
    deliver, ClipboardSink, Delivery, DiagnosticsExporter, DiagnosticsSnapshot, DiagnosticsStore,
    EnvironmentMetadata, ManualCopy, MethodStatus, PreflightMethodResult, PreflightRecorder,
    PreflightRunner, PreflightState, PreflightStatus, Trigger,
};
pub use error::{CraftlinkError, Result};
pub use query::{QueryClient, QueryKey, QueryState};

pub use craftlink_interface::{ActorError, ActorMethod, CatalogActor, ItemCategory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
