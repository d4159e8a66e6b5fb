//! Probe table for the preflight sweep
//!
//! One [`ProbeSpec`] per remote read operation: which method it exercises,
//! what the reply must look like, and how to invoke it with sentinel
//! arguments. Adding an operation to the sweep means adding one entry to
//! [`default_probes`].

use craftlink_interface::{ActorError, ActorMethod, CatalogActor, ItemCategory};
use craftlink_resilience::ResilienceError;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Identifier passed to single-key lookups; never a real record
pub const PROBE_ID: &str = "test-id";
/// Game identifier passed to item lookups
pub const PROBE_GAME_ID: &str = "test-game-id";
/// Item identifier passed to item lookups
pub const PROBE_ITEM_ID: &str = "test-item-id";
/// Category passed to the category filter
pub const PROBE_CATEGORY: ItemCategory = ItemCategory::Food;

/// Why a probe failed
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The remote call itself failed
    #[error(transparent)]
    Call(#[from] ActorError),

    /// The reply could not be re-encoded for validation
    #[error("failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),

    /// The call succeeded but the reply broke its contract
    #[error("unexpected reply shape: expected {expected}, got {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },

    /// The call did not settle within the probe deadline
    #[error(transparent)]
    Deadline(#[from] ResilienceError),

    #[error("probe panicked: {0}")]
    Panicked(String),
}

/// Structural contract of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A sequence, possibly empty
    Sequence,
    /// Absence of a value, or a single structured record
    OptionalRecord,
}

impl ResponseShape {
    pub fn describe(&self) -> &'static str {
        match self {
            ResponseShape::Sequence => "a sequence",
            ResponseShape::OptionalRecord => "an absent value or a record",
        }
    }

    /// Check an encoded reply against the contract
    pub fn validate(&self, reply: &Value) -> Result<(), ProbeError> {
        let ok = match self {
            ResponseShape::Sequence => reply.is_array(),
            ResponseShape::OptionalRecord => reply.is_null() || reply.is_object(),
        };
        if ok {
            Ok(())
        } else {
            Err(ProbeError::Shape {
                expected: self.describe(),
                found: json_kind(reply),
            })
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a record",
    }
}

/// Future returned by a probe invocation
pub type ProbeFuture<'a> = BoxFuture<'a, Result<Value, ProbeError>>;

/// Invokes one remote operation with sentinel arguments
pub type ProbeFn = fn(&dyn CatalogActor) -> ProbeFuture<'_>;

/// One entry of the probe table
#[derive(Clone, Copy)]
pub struct ProbeSpec {
    pub method: ActorMethod,
    pub shape: ResponseShape,
    pub invoke: ProbeFn,
}

impl ProbeSpec {
    pub const fn new(method: ActorMethod, shape: ResponseShape, invoke: ProbeFn) -> Self {
        Self {
            method,
            shape,
            invoke,
        }
    }
}

impl std::fmt::Debug for ProbeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeSpec")
            .field("method", &self.method)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

fn encode<T: Serialize>(reply: craftlink_interface::Result<T>) -> Result<Value, ProbeError> {
    Ok(serde_json::to_value(reply?)?)
}

fn probe_list_catalog_entries(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.list_catalog_entries().await) })
}

fn probe_get_catalog_entry(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.get_catalog_entry(PROBE_ID).await) })
}

fn probe_list_games(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.list_games().await) })
}

fn probe_get_game(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.get_game(PROBE_ID).await) })
}

fn probe_list_items(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.list_items(PROBE_ID).await) })
}

fn probe_get_item(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.get_item(PROBE_GAME_ID, PROBE_ITEM_ID).await) })
}

fn probe_list_items_by_category(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move {
        encode(
            actor
                .list_items_by_category(PROBE_ID, PROBE_CATEGORY)
                .await,
        )
    })
}

fn probe_get_update_status(actor: &dyn CatalogActor) -> ProbeFuture<'_> {
    Box::pin(async move { encode(actor.get_update_status(PROBE_ID).await) })
}

/// The probe table covering every remote read operation, in issue order
pub fn default_probes() -> Vec<ProbeSpec> {
    use ActorMethod::*;
    use ResponseShape::*;

    vec![
        ProbeSpec::new(ListCatalogEntries, Sequence, probe_list_catalog_entries),
        ProbeSpec::new(GetCatalogEntry, OptionalRecord, probe_get_catalog_entry),
        ProbeSpec::new(ListGames, Sequence, probe_list_games),
        ProbeSpec::new(GetGame, OptionalRecord, probe_get_game),
        ProbeSpec::new(ListItems, Sequence, probe_list_items),
        ProbeSpec::new(GetItem, OptionalRecord, probe_get_item),
        ProbeSpec::new(ListItemsByCategory, Sequence, probe_list_items_by_category),
        ProbeSpec::new(GetUpdateStatus, OptionalRecord, probe_get_update_status),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftlink_interface::MockActor;
    use serde_json::json;

    #[test]
    fn test_table_covers_every_method_once() {
        let probes = default_probes();
        let methods: Vec<ActorMethod> = probes.iter().map(|p| p.method).collect();
        assert_eq!(methods, ActorMethod::ALL.to_vec());
    }

    #[test]
    fn test_sequence_shape() {
        assert!(ResponseShape::Sequence.validate(&json!([])).is_ok());
        let records = json!([{"id": "a"}]);
        assert!(ResponseShape::Sequence.validate(&records).is_ok());

        let err = ResponseShape::Sequence.validate(&Value::Null).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected reply shape: expected a sequence, got null"
        );
    }

    #[test]
    fn test_optional_record_shape() {
        assert!(ResponseShape::OptionalRecord.validate(&Value::Null).is_ok());
        assert!(ResponseShape::OptionalRecord
            .validate(&json!({"id": "x"}))
            .is_ok());
        assert!(ResponseShape::OptionalRecord.validate(&json!([])).is_err());
        assert!(ResponseShape::OptionalRecord.validate(&json!("x")).is_err());
    }

    #[tokio::test]
    async fn test_probes_encode_empty_backend() {
        let actor = MockActor::new();
        for probe in default_probes() {
            let reply = (probe.invoke)(&actor).await.unwrap();
            assert!(
                probe.shape.validate(&reply).is_ok(),
                "{} returned {}",
                probe.method,
                reply
            );
        }
        assert_eq!(actor.total_calls(), ActorMethod::ALL.len());
    }

    #[tokio::test]
    async fn test_call_failure_keeps_message() {
        let actor = MockActor::new();
        actor.fail(
            ActorMethod::GetGame,
            ActorError::Transport("connection refused".into()),
        );

        let err = probe_get_game(&actor).await.unwrap_err();
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
