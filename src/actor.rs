//! Actor slot: the binary "actor available / not available" signal
//!
//! Acquiring the backend handle (agent creation, identity, transport setup)
//! happens outside this crate. Whoever owns that process publishes its
//! progress here; the preflight runner and the query layer only read it.

use craftlink_interface::CatalogActor;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Snapshot of handle availability
#[derive(Clone, Default)]
pub struct ActorState {
    /// Usable handle, if one has been installed
    pub actor: Option<Arc<dyn CatalogActor>>,
    /// A handle (re)acquisition is in flight
    pub resolving: bool,
}

impl ActorState {
    /// The handle is present and not being replaced
    pub fn is_ready(&self) -> bool {
        self.actor.is_some() && !self.resolving
    }

    /// The handle to use for a call, if calls are allowed right now
    pub fn ready_actor(&self) -> Option<Arc<dyn CatalogActor>> {
        if self.resolving {
            None
        } else {
            self.actor.clone()
        }
    }
}

impl fmt::Debug for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorState")
            .field("actor", &self.actor.as_ref().map(|_| "<actor>"))
            .field("resolving", &self.resolving)
            .finish()
    }
}

/// Shared, observable holder of the current backend handle
///
/// Clones share the same slot.
#[derive(Clone)]
pub struct ActorSlot {
    tx: Arc<watch::Sender<ActorState>>,
}

impl ActorSlot {
    /// Create an empty slot (no handle, not resolving)
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ActorState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Create a slot that already holds a handle
    pub fn with_actor(actor: Arc<dyn CatalogActor>) -> Self {
        let slot = Self::new();
        slot.install(actor);
        slot
    }

    /// Mark a handle (re)acquisition as in flight
    pub fn begin_resolve(&self) {
        debug!("actor handle resolution started");
        self.tx.send_modify(|state| state.resolving = true);
    }

    /// Publish a usable handle and end any resolution in flight
    pub fn install(&self, actor: Arc<dyn CatalogActor>) {
        debug!("actor handle installed");
        self.tx.send_modify(|state| {
            state.actor = Some(actor);
            state.resolving = false;
        });
    }

    /// Resolution finished without a handle, or the handle was dropped
    pub fn clear(&self) {
        debug!("actor handle cleared");
        self.tx.send_modify(|state| {
            state.actor = None;
            state.resolving = false;
        });
    }

    pub fn current(&self) -> ActorState {
        self.tx.borrow().clone()
    }

    /// Receive every subsequent change of the slot
    pub fn subscribe(&self) -> watch::Receiver<ActorState> {
        self.tx.subscribe()
    }
}

impl Default for ActorSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActorSlot").field(&*self.tx.borrow()).finish()
    }
}
