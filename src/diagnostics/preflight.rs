//! Preflight runner: one connectivity sweep per session
//!
//! ```text
//! idle ──(no actor on first settled observation)──▶ skipped
//!   │
//!   └──(actor available)──▶ running ──(all probes resolved)──▶ complete
//! ```
//!
//! The runner claims its single run with an atomic compare-and-set before any
//! asynchronous work, so repeated or concurrent triggers (a UI re-rendering,
//! several slot watchers) start at most one sweep. Probes run concurrently;
//! every probe is isolated and its failure is recorded, never propagated.

use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use craftlink_interface::CatalogActor;
use craftlink_resilience::within;

use super::probes::{default_probes, ProbeError, ProbeSpec};
use super::store::{DiagnosticsStore, PreflightMethodResult, PreflightRecorder, PreflightStatus};
use crate::actor::{ActorSlot, ActorState};
use crate::config::PreflightConfig;

/// What an observation of the actor slot did
#[derive(Debug)]
pub enum Trigger {
    /// The session's sweep was already claimed
    AlreadyTriggered,
    /// The handle is still resolving; nothing was decided
    Waiting,
    /// No usable handle (or preflight disabled); the session is marked skipped
    Skipped,
    /// A sweep was spawned
    Started(JoinHandle<()>),
}

impl Trigger {
    pub fn is_started(&self) -> bool {
        matches!(self, Trigger::Started(_))
    }
}

/// Orchestrates the session's preflight sweep
///
/// Owns the diagnostics store's only [`PreflightRecorder`].
pub struct PreflightRunner {
    recorder: PreflightRecorder,
    probes: Vec<ProbeSpec>,
    config: PreflightConfig,
    started: AtomicBool,
    /// Bumped by `reset`; held while a sweep records so a stale sweep
    /// cannot land after the store was cleared
    generation: Mutex<u64>,
}

impl PreflightRunner {
    /// Create a runner with the default probe table
    pub fn new(recorder: PreflightRecorder, config: PreflightConfig) -> Self {
        Self {
            recorder,
            probes: default_probes(),
            config,
            started: AtomicBool::new(false),
            generation: Mutex::new(0),
        }
    }

    /// Replace the probe table
    pub fn with_probes(mut self, probes: Vec<ProbeSpec>) -> Self {
        self.probes = probes;
        self
    }

    /// Read handle on the store this runner writes
    pub fn store(&self) -> DiagnosticsStore {
        self.recorder.store()
    }

    pub fn probes(&self) -> &[ProbeSpec] {
        &self.probes
    }

    /// The session's sweep has been claimed (skipped or started)
    pub fn has_triggered(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// React to the current actor slot state
    ///
    /// The first observation in which the handle is not resolving decides the
    /// session: without a handle it is marked skipped and never retried
    /// automatically; with one, a sweep is spawned on the tokio runtime and
    /// this call returns immediately.
    pub fn observe(self: &Arc<Self>, state: &ActorState) -> Trigger {
        if self.has_triggered() {
            return Trigger::AlreadyTriggered;
        }
        if state.resolving {
            debug!("actor handle still resolving, preflight waiting");
            return Trigger::Waiting;
        }
        let guard = self.lock_generation();
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Trigger::AlreadyTriggered;
        }

        let Some(actor) = state.actor.clone() else {
            info!("no backend actor available, preflight skipped");
            self.recorder.set_skipped();
            return Trigger::Skipped;
        };

        if !self.config.enabled {
            info!("preflight disabled by configuration, skipped");
            self.recorder.set_skipped();
            return Trigger::Skipped;
        }

        self.recorder.set_running();
        let generation = *guard;
        drop(guard);
        let runner = Arc::clone(self);
        Trigger::Started(tokio::spawn(async move {
            runner.complete_sweep(actor, generation).await;
        }))
    }

    /// Observe `state` and wait for any sweep it starts
    ///
    /// Returns the session status afterwards.
    pub async fn run_once(self: &Arc<Self>, state: &ActorState) -> PreflightStatus {
        if let Trigger::Started(handle) = self.observe(state) {
            if let Err(e) = handle.await {
                error!(error = %e, "preflight task aborted");
            }
        }
        self.store().status()
    }

    /// Follow the slot until the session's sweep has been decided
    ///
    /// The first settled state decides the session, so call
    /// [`ActorSlot::begin_resolve`] before spawning the watcher when the handle
    /// is still being acquired.
    pub fn spawn_watch(self: &Arc<Self>, slot: &ActorSlot) -> JoinHandle<Trigger> {
        let runner = Arc::clone(self);
        let rx = slot.subscribe();
        tokio::spawn(async move { runner.watch_slot(rx).await })
    }

    async fn watch_slot(self: Arc<Self>, mut rx: watch::Receiver<ActorState>) -> Trigger {
        loop {
            let state = rx.borrow_and_update().clone();
            match self.observe(&state) {
                Trigger::Waiting => {}
                decided => return decided,
            }
            if rx.changed().await.is_err() {
                debug!("actor slot dropped before preflight triggered");
                return Trigger::Waiting;
            }
        }
    }

    /// Clear the store and re-arm the run-once guard for a manual re-run
    pub fn reset(&self) {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.recorder.reset();
        self.started.store(false, Ordering::Release);
        drop(generation);
        info!("preflight reset");
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn complete_sweep(&self, actor: Arc<dyn CatalogActor>, generation: u64) {
        let results = self.sweep(actor.as_ref()).await;

        let total = results.len();
        let passed = results.iter().filter(|r| r.is_pass()).count();
        let details: Vec<String> = results
            .iter()
            .map(|r| format!("{}={}", r.method(), r.status().as_str()))
            .collect();
        info!(
            passed,
            total,
            details = %details.join(","),
            "backend connectivity check complete"
        );
        if passed < total {
            warn!(
                failed = total - passed,
                "some backend methods are not accessible; check network and backend availability"
            );
        }

        let current = self.lock_generation();
        if *current != generation {
            debug!("preflight was reset during the sweep, discarding results");
            return;
        }
        self.recorder.set_complete(results);
    }

    /// Probe every operation once and classify each reply
    ///
    /// Results come back in probe-table order regardless of completion order.
    /// Does not touch the store.
    pub async fn sweep(&self, actor: &dyn CatalogActor) -> Vec<PreflightMethodResult> {
        let timeout = self.config.probe_timeout();

        let probes = self.probes.iter().map(|probe| async move {
            let call = AssertUnwindSafe((probe.invoke)(actor)).catch_unwind();
            let outcome = match within(timeout, call).await {
                Ok(Ok(reply)) => reply.and_then(|value| probe.shape.validate(&value)),
                Ok(Err(panic)) => Err(ProbeError::Panicked(panic_message(&*panic))),
                Err(deadline) => Err(ProbeError::Deadline(deadline)),
            };

            match outcome {
                Ok(()) => {
                    debug!(method = %probe.method, "preflight probe passed");
                    PreflightMethodResult::pass(probe.method.as_str())
                }
                Err(e) => {
                    warn!(method = %probe.method, error = %e, "preflight probe failed");
                    PreflightMethodResult::fail(probe.method.as_str(), e.to_string())
                }
            }
        });

        join_all(probes).await
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "probe panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::probes::{ProbeFuture, ResponseShape};
    use crate::diagnostics::store::MethodStatus;
    use craftlink_interface::{ActorError, ActorMethod, MockActor};
    use std::time::Duration;

    fn runner(config: PreflightConfig) -> (DiagnosticsStore, Arc<PreflightRunner>) {
        let (store, recorder) = DiagnosticsStore::new();
        (store, Arc::new(PreflightRunner::new(recorder, config)))
    }

    fn ready(actor: &Arc<MockActor>) -> ActorState {
        ActorState {
            actor: Some(actor.clone() as Arc<dyn CatalogActor>),
            resolving: false,
        }
    }

    #[tokio::test]
    async fn test_sweep_all_pass() {
        crate::logging::init_test_logging();
        let (store, runner) = runner(PreflightConfig::default());
        let actor = Arc::new(MockActor::new());

        let status = runner.run_once(&ready(&actor)).await;

        assert_eq!(status, PreflightStatus::Complete);
        let state = store.state();
        assert_eq!(state.results.len(), 8);
        assert!(state.results.iter().all(|r| r.is_pass()));
        assert!(state.actor_available);
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_probe() {
        let (store, runner) = runner(PreflightConfig::default());
        let actor = Arc::new(MockActor::new());
        actor.fail(
            ActorMethod::ListItems,
            ActorError::Transport("socket closed".into()),
        );

        runner.run_once(&ready(&actor)).await;

        let state = store.state();
        assert_eq!(state.count(MethodStatus::Pass), 7);
        let failed: Vec<_> = state
            .results
            .iter()
            .filter(|r| r.status() == MethodStatus::Fail)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].method(), "listItems");
        assert_eq!(failed[0].error(), Some("transport error: socket closed"));
    }

    #[tokio::test]
    async fn test_no_actor_skips_without_probing() {
        let (store, runner) = runner(PreflightConfig::default());

        let trigger = runner.observe(&ActorState::default());

        assert!(matches!(trigger, Trigger::Skipped));
        let state = store.state();
        assert_eq!(state.status, PreflightStatus::Skipped);
        assert!(!state.actor_available);
        assert!(state.results.is_empty());

        // Never retried automatically
        let actor = Arc::new(MockActor::new());
        assert!(matches!(
            runner.observe(&ready(&actor)),
            Trigger::AlreadyTriggered
        ));
        assert_eq!(actor.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolving_handle_does_not_decide() {
        let (store, runner) = runner(PreflightConfig::default());
        let state = ActorState {
            actor: None,
            resolving: true,
        };

        assert!(matches!(runner.observe(&state), Trigger::Waiting));
        assert_eq!(store.status(), PreflightStatus::Idle);
        assert!(!runner.has_triggered());
    }

    #[tokio::test]
    async fn test_disabled_preflight_is_skipped() {
        let config = PreflightConfig {
            enabled: false,
            ..Default::default()
        };
        let (store, runner) = runner(config);
        let actor = Arc::new(MockActor::new());

        runner.run_once(&ready(&actor)).await;

        assert_eq!(store.status(), PreflightStatus::Skipped);
        assert_eq!(actor.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_fails_at_deadline() {
        let config = PreflightConfig {
            enabled: true,
            probe_timeout_ms: Some(2_000),
        };
        let (store, runner) = runner(config);
        let actor = Arc::new(MockActor::new());
        actor.hang(ActorMethod::GetUpdateStatus);

        runner.run_once(&ready(&actor)).await;

        let state = store.state();
        assert_eq!(state.status, PreflightStatus::Complete);
        let last = state.results.last().unwrap();
        assert_eq!(last.method(), "getUpdateStatus");
        assert_eq!(last.error(), Some("timed out after 2000ms"));
    }

    fn wrong_shape(_actor: &dyn CatalogActor) -> ProbeFuture<'_> {
        Box::pin(async { Ok(serde_json::json!("not a list")) })
    }

    fn panicking(_actor: &dyn CatalogActor) -> ProbeFuture<'_> {
        Box::pin(async {
            if true {
                panic!("decoder exploded");
            }
            Ok(serde_json::Value::Null)
        })
    }

    #[tokio::test]
    async fn test_shape_and_panic_recorded_as_fail() {
        let (store, recorder) = DiagnosticsStore::new();
        let probes = vec![
            ProbeSpec::new(
                ActorMethod::ListGames,
                ResponseShape::Sequence,
                wrong_shape,
            ),
            ProbeSpec::new(
                ActorMethod::GetGame,
                ResponseShape::OptionalRecord,
                panicking,
            ),
        ];
        let runner = PreflightRunner::new(recorder, PreflightConfig::default());
        let runner = Arc::new(runner.with_probes(probes));
        let actor = Arc::new(MockActor::new());

        runner.run_once(&ready(&actor)).await;

        let state = store.state();
        assert_eq!(state.results.len(), 2);
        assert_eq!(
            state.results[0].error(),
            Some("unexpected reply shape: expected a sequence, got a string")
        );
        assert_eq!(
            state.results[1].error(),
            Some("probe panicked: decoder exploded")
        );
    }

    #[tokio::test]
    async fn test_reset_rearms_guard() {
        let (store, runner) = runner(PreflightConfig::default());
        let actor = Arc::new(MockActor::new());

        runner.run_once(&ready(&actor)).await;
        runner.reset();
        assert_eq!(store.status(), PreflightStatus::Idle);
        assert!(!runner.has_triggered());

        runner.run_once(&ready(&actor)).await;
        assert_eq!(store.status(), PreflightStatus::Complete);
        assert_eq!(actor.calls(ActorMethod::ListGames), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_sweep_discards_results() {
        let config = PreflightConfig {
            enabled: true,
            probe_timeout_ms: Some(1_000),
        };
        let (store, runner) = runner(config);
        let actor = Arc::new(MockActor::new());
        actor.hang(ActorMethod::ListGames);

        let Trigger::Started(handle) = runner.observe(&ready(&actor)) else {
            panic!("expected a started sweep");
        };
        runner.reset();
        handle.await.unwrap();

        let state = store.state();
        assert_eq!(state.status, PreflightStatus::Idle);
        assert!(state.results.is_empty());
        assert!(state.timestamp.is_none());
        assert!(!runner.has_triggered());
    }

    #[tokio::test]
    async fn test_watch_waits_for_resolution() {
        let (store, runner) = runner(PreflightConfig::default());
        let slot = ActorSlot::new();
        slot.begin_resolve();

        let watcher = runner.spawn_watch(&slot);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.status(), PreflightStatus::Idle);

        let actor = Arc::new(MockActor::new());
        slot.install(actor.clone());

        match watcher.await.unwrap() {
            Trigger::Started(handle) => handle.await.unwrap(),
            other => panic!("expected a started sweep, got {:?}", other),
        }
        assert_eq!(store.status(), PreflightStatus::Complete);
        assert_eq!(actor.total_calls(), 8);
    }
}
