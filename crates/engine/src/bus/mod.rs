//! The phased event bus.
//!
//! The bus turns one trigger into all of its consequences, deterministically.
//! Listeners register per event kind; published events queue by phase; a
//! sweep drains each phase in ascending rank order, running listeners
//! (registration order within an event, publish order across events),
//! applying the commands they return through the session store, and seeding
//! the next phase with the applied commands' derived events. Commands
//! derived in the terminal phase are discarded by design.
//!
//! Queues are kept per session, so sweeps for different sessions never share
//! state; sweeps for the same session are serialized by the orchestration
//! layer (see `app::SessionLocks`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::RwLock;

use boardwalk_domain::{Command, EventKind, GameEvent, Phase, SessionId, SessionState};

use crate::store::SessionStore;

mod error;

pub use error::{ListenerError, SweepError};

/// What a listener returns: the mutations that should follow from the fact.
pub type ListenerOutput = Result<Vec<Command>, ListenerError>;

/// A registered reaction to one event kind. Receives the event and a cloned,
/// read-only view of the session; must express all state changes as returned
/// commands.
pub type ListenerFn =
    dyn Fn(GameEvent, SessionState) -> BoxFuture<'static, ListenerOutput> + Send + Sync;

struct RegisteredListener {
    name: &'static str,
    handler: Arc<ListenerFn>,
}

/// Append-only pending-event queues, one per phase rank.
struct PhaseQueues {
    queues: [Vec<GameEvent>; Phase::ALL.len()],
}

impl PhaseQueues {
    fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| Vec::new()),
        }
    }

    fn push(&mut self, phase: Phase, event: GameEvent) {
        self.queues[phase.rank()].push(event);
    }

    /// Take the queue as of now. Events published into this phase while its
    /// drain is running land in the fresh queue and are deferred to a later
    /// sweep rather than processed mid-drain.
    fn take(&mut self, phase: Phase) -> Vec<GameEvent> {
        std::mem::take(&mut self.queues[phase.rank()])
    }
}

/// The dispatcher at the heart of the session core.
pub struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<RegisteredListener>>>,
    queues: DashMap<SessionId, PhaseQueues>,
    store: Arc<SessionStore>,
    sweep_timeout: Duration,
}

impl EventBus {
    pub fn new(store: Arc<SessionStore>, sweep_timeout: Duration) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            queues: DashMap::new(),
            store,
            sweep_timeout,
        }
    }

    /// Register a listener for one event kind. Listeners for the same kind
    /// run in registration order; `name` identifies the listener in logs and
    /// sweep errors.
    pub async fn subscribe<F>(&self, kind: EventKind, name: &'static str, handler: F)
    where
        F: Fn(GameEvent, SessionState) -> BoxFuture<'static, ListenerOutput>
            + Send
            + Sync
            + 'static,
    {
        let mut listeners = self.listeners.write().await;
        listeners.entry(kind).or_default().push(RegisteredListener {
            name,
            handler: Arc::new(handler),
        });
        tracing::debug!(event = %kind, listener = name, "Listener registered");
    }

    /// Enqueue an event for the given phase. Publishing never runs a
    /// listener synchronously; it only records the fact for the phase drain.
    pub fn publish(&self, phase: Phase, event: GameEvent) {
        tracing::trace!(
            session_id = %event.session_id,
            phase = %phase,
            event = %event.kind(),
            "Event published"
        );
        self.queues
            .entry(event.session_id.clone())
            .or_insert_with(PhaseQueues::new)
            .push(phase, event);
    }

    /// Run every listener registered for this event's kind, in registration
    /// order, and concatenate the commands they return. An event kind with
    /// no listeners is reported (so dead events are detectable) but is not
    /// an error. A failing listener aborts this event's remaining listeners.
    pub async fn run_listeners(&self, event: &GameEvent) -> Result<Vec<Command>, SweepError> {
        let kind = event.kind();
        let handlers: Vec<(&'static str, Arc<ListenerFn>)> = {
            let listeners = self.listeners.read().await;
            listeners
                .get(&kind)
                .map(|registered| {
                    registered
                        .iter()
                        .map(|l| (l.name, Arc::clone(&l.handler)))
                        .collect()
                })
                .unwrap_or_default()
        };

        if handlers.is_empty() {
            tracing::warn!(
                session_id = %event.session_id,
                event = %kind,
                "No listeners registered for event"
            );
            return Ok(Vec::new());
        }

        let view = self
            .store
            .get_session(&event.session_id)
            .ok_or_else(|| SweepError::SessionNotFound(event.session_id.clone()))?;

        let mut commands = Vec::new();
        for (name, handler) in handlers {
            match (*handler)(event.clone(), view.clone()).await {
                Ok(mut produced) => commands.append(&mut produced),
                Err(source) => {
                    return Err(SweepError::Listener {
                        event: kind,
                        listener: name,
                        source,
                    })
                }
            }
        }
        Ok(commands)
    }

    /// Drain one phase for one session.
    ///
    /// Runs listeners for every event queued as of entry (all against the
    /// same pre-phase state), then applies the accumulated commands in
    /// order - that order is the deterministic tie-break for mutations
    /// landing in the same phase - then publishes each applied command's
    /// derived event into the next phase. A listener failure skips that
    /// event's remaining listeners but lets the rest of the phase settle
    /// before the first error is surfaced; a store failure stops the apply
    /// pass immediately, keeping what was already applied.
    pub async fn process_phase(
        &self,
        session_id: &SessionId,
        phase: Phase,
    ) -> Result<(), SweepError> {
        let drained = match self.queues.get_mut(session_id) {
            Some(mut queues) => queues.take(phase),
            None => Vec::new(),
        };
        if drained.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            session_id = %session_id,
            phase = %phase,
            events = drained.len(),
            "Processing phase"
        );

        let mut commands = Vec::new();
        let mut first_failure: Option<SweepError> = None;
        for event in &drained {
            match self.run_listeners(event).await {
                Ok(mut produced) => commands.append(&mut produced),
                Err(err) => {
                    tracing::error!(
                        session_id = %session_id,
                        phase = %phase,
                        error = %err,
                        "Listener failed during phase"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }

        let mut applied = Vec::new();
        for command in commands {
            if let Err(source) = self.store.apply(&command) {
                tracing::error!(
                    session_id = %session_id,
                    phase = %phase,
                    command = %command.kind(),
                    error = %source,
                    "Command failed to apply; earlier applies in this phase stand"
                );
                return Err(SweepError::Apply {
                    command: command.kind(),
                    source,
                });
            }
            applied.push(command);
        }

        match phase.next() {
            Some(next) => {
                for command in &applied {
                    if let Some(event) = command.derived_event() {
                        self.publish(next, event);
                    }
                }
            }
            None => {
                // Terminal phase: applied commands propagate no further.
                let discarded = applied
                    .iter()
                    .filter(|c| c.derived_event().is_some())
                    .count();
                if discarded > 0 {
                    tracing::debug!(
                        session_id = %session_id,
                        discarded,
                        "Discarding events derived in the terminal phase"
                    );
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// One sweep: process every phase in ascending rank order, exactly once.
    /// This is the unit of "apply one player action and settle all of its
    /// consequences". The sweep is bounded by the configured timeout.
    pub async fn process_all_phases(&self, session_id: &SessionId) -> Result<(), SweepError> {
        let sweep = async {
            for phase in Phase::ALL {
                self.process_phase(session_id, phase).await?;
            }
            Ok(())
        };
        match tokio::time::timeout(self.sweep_timeout, sweep).await {
            Ok(result) => result,
            Err(_) => Err(SweepError::Timeout(self.sweep_timeout)),
        }
    }
}
