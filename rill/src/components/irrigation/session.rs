use crate::audit::{AuditSink, SessionEvent};
use crate::components::irrigation::config::IrrigationConfig;
use crate::components::irrigation::dispatch::{CommandDispatcher, DispatchOutcome};
use crate::messages::bus::relay::RelayState;
use crate::messages::control::irrigation::SessionSource;
use crate::utils::secs_to_minutes;
use futures::FutureExt;
use std::{
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use strum_macros::Display;
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Terminal status of a watering session.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// The full requested duration elapsed.
    Completed,
    /// A stop signal was observed before the duration elapsed.
    Cancelled,
    /// The session failed unexpectedly.
    Error,
}

/// The single occupancy marker for the running session. Holding an
/// entry here means a session task is (or was, until a forced
/// release) counting down.
struct ActiveSession {
    /// Identity of the occupying session, guards the slot clear so
    /// a stale task never clobbers a newer occupant.
    id: Uuid,
    /// Signal the task waits on at each checkpoint.
    cancel: CancellationToken,
    /// Task handle, taken by the first stop call that joins it.
    handle: Option<JoinHandle<()>>,
}

/// Clears the session slot when the owning task winds down, whether
/// it returned normally or unwound from a panic. The clear is guarded
/// by the session id so a forcibly freed and reclaimed slot is left
/// alone. The slot mutex is a std mutex and its critical sections
/// never await, so the drop can run synchronously during unwind.
struct SlotGuard {
    slot: Arc<Mutex<Option<ActiveSession>>>,
    id: Uuid,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|active| active.id) == Some(self.id) {
            *slot = None;
        }
    }
}

/// Owns the watering session lifecycle: at most one session runs at
/// a time, and the relay is commanded off on every exit path, whether
/// the session completed, was cancelled, or failed. Construct one
/// controller at process start and hand it to all callers; there is
/// no hidden global instance.
pub struct SessionController {
    dispatcher: Arc<CommandDispatcher>,
    audit: Arc<dyn AuditSink>,
    slot: Arc<Mutex<Option<ActiveSession>>>,
    check_interval: Duration,
    stop_timeout: Duration,
}

impl SessionController {
    /// Create a controller with an empty session slot.
    ///
    /// * `dispatcher`: relay command dispatcher.
    /// * `audit`: sink for session lifecycle records.
    /// * `config`: component configuration, supplies the timing knobs.
    pub fn new(
        dispatcher: CommandDispatcher,
        audit: Arc<dyn AuditSink>,
        config: &IrrigationConfig,
    ) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            audit,
            slot: Arc::new(Mutex::new(None)),
            check_interval: Duration::from_secs(config.check_interval_sec),
            stop_timeout: Duration::from_secs(config.stop_timeout_sec),
        }
    }

    /// Start a timed watering session as a background task and return
    /// immediately. The occupancy check, the spawn, and the slot
    /// insert all happen inside one critical section, so concurrent
    /// starts can never both be accepted, and the task's own slot
    /// clear cannot run before the entry it clears exists.
    ///
    /// * `duration_sec`: how long to keep the relay on, must be positive.
    /// * `volume_m3`: optional target volume, recorded for audit only.
    /// * `source`: who initiated the session.
    pub async fn start(
        &self,
        duration_sec: u64,
        volume_m3: Option<f64>,
        source: SessionSource,
    ) -> (bool, String) {
        if duration_sec == 0 {
            return (false, String::from("duration must be a positive number of seconds"));
        }

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::warn!(%source, "start rejected, session already active");
            return (false, String::from("session already active"));
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Self::run_session(
            self.dispatcher.clone(),
            self.audit.clone(),
            self.slot.clone(),
            self.check_interval,
            id,
            cancel.clone(),
            duration_sec,
            volume_m3,
            source,
        ));
        *slot = Some(ActiveSession {
            id,
            cancel,
            handle: Some(handle),
        });

        (true, String::from("session started"))
    }

    /// Stop the current session, if any. Raises the cancellation
    /// signal, immediately issues an independent OFF command without
    /// waiting for the session task's own OFF (both may race; the
    /// relay ends up off either way and both attempts are audited),
    /// then joins the task with a bounded timeout. A task that does
    /// not wind down in time has its slot forcibly released and is
    /// left running detached; a task that already died is released
    /// the same way.
    ///
    /// Safe to call with no active session: the OFF command is still
    /// issued and its outcome returned.
    pub async fn stop(&self) -> DispatchOutcome {
        let joined = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_mut() {
                Some(active) => {
                    active.cancel.cancel();
                    Some((active.id, active.handle.take()))
                }
                None => None,
            }
        };

        let outcome = self.dispatcher.send(RelayState::Off).await;
        self.audit.log_session_event(
            SessionEvent::ManualStop,
            None,
            None,
            &format!("MANUAL_STOP_{}", outcome.code),
            "manual",
        );

        if let Some((id, Some(handle))) = joined {
            match tokio::time::timeout(self.stop_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "session task ended abnormally");
                    self.release_slot(id);
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_sec = self.stop_timeout.as_secs(),
                        "session task did not terminate cleanly, forcing the slot free (task left running detached)"
                    );
                    self.release_slot(id);
                }
            }
        }

        outcome
    }

    /// Free the slot if it still holds the given session.
    ///
    /// * `id`: session whose occupancy is being released.
    fn release_slot(&self, id: Uuid) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|active| active.id) == Some(id) {
            *slot = None;
        }
    }

    /// Body of the background session task. Runs the watering
    /// sequence with a panic net around it, issues exactly one OFF
    /// command on every exit path, records the terminal outcome, and
    /// releases the slot. The release lives in a drop guard, so it
    /// happens even when the OFF dispatch or the terminal audit
    /// itself unwinds.
    #[allow(clippy::too_many_arguments)]
    async fn run_session(
        dispatcher: Arc<CommandDispatcher>,
        audit: Arc<dyn AuditSink>,
        slot: Arc<Mutex<Option<ActiveSession>>>,
        check_interval: Duration,
        id: Uuid,
        cancel: CancellationToken,
        duration_sec: u64,
        volume_m3: Option<f64>,
        source: SessionSource,
    ) {
        let _slot_guard = SlotGuard {
            slot: slot.clone(),
            id,
        };

        // Immutable capture of the start instant the moment the task
        // begins; every elapsed figure below derives from it.
        let started = Instant::now();
        let duration = Duration::from_secs(duration_sec);

        let status = match AssertUnwindSafe(Self::watering_sequence(
            &dispatcher,
            &audit,
            &cancel,
            started,
            duration,
            check_interval,
            id,
            volume_m3,
            source,
        ))
        .catch_unwind()
        .await
        {
            Ok(status) => status,
            Err(_) => {
                tracing::error!(session = %id, "watering sequence failed unexpectedly");
                SessionStatus::Error
            }
        };
        let elapsed = started.elapsed();

        // Exactly one OFF per session, on every exit path.
        let off = dispatcher.send(RelayState::Off).await;
        let event = match status {
            SessionStatus::Error => SessionEvent::Error,
            _ => SessionEvent::Stop,
        };
        audit.log_session_event(
            event,
            Some(secs_to_minutes(elapsed.as_secs_f64())),
            volume_m3,
            &format!("RELAY_OFF_{}_{}", status, off.code),
            &source.to_string(),
        );
        tracing::info!(
            session = %id,
            status = %status,
            elapsed_sec = elapsed.as_secs_f64(),
            "session winding down"
        );
    }

    /// The watering sequence proper: issue the ON command, record the
    /// session start, then count down. Any panic in here is caught by
    /// the caller and turned into an ERROR terminal status.
    #[allow(clippy::too_many_arguments)]
    async fn watering_sequence(
        dispatcher: &CommandDispatcher,
        audit: &Arc<dyn AuditSink>,
        cancel: &CancellationToken,
        started: Instant,
        duration: Duration,
        check_interval: Duration,
        id: Uuid,
        volume_m3: Option<f64>,
        source: SessionSource,
    ) -> SessionStatus {
        let on = dispatcher.send(RelayState::On).await;
        audit.log_session_event(
            SessionEvent::Start,
            Some(secs_to_minutes(duration.as_secs_f64())),
            volume_m3,
            &format!("RELAY_ON_{}", on.code),
            &source.to_string(),
        );
        tracing::info!(
            session = %id,
            %source,
            duration_sec = duration.as_secs(),
            "watering session started"
        );

        Self::checkpoint_loop(cancel, started, duration, check_interval, id, source).await
    }

    /// Countdown loop. Wakes at the earlier of the check interval or
    /// the remaining duration; each wake observes the cancellation
    /// signal, so a stop is never starved for longer than one
    /// checkpoint.
    async fn checkpoint_loop(
        cancel: &CancellationToken,
        started: Instant,
        duration: Duration,
        check_interval: Duration,
        id: Uuid,
        source: SessionSource,
    ) -> SessionStatus {
        loop {
            let elapsed = started.elapsed();
            if elapsed >= duration {
                tracing::info!(session = %id, "full duration reached");
                return SessionStatus::Completed;
            }

            let wait = std::cmp::min(check_interval, duration - elapsed);
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(
                        session = %id,
                        elapsed_min = secs_to_minutes(elapsed.as_secs_f64()),
                        "stop signal observed"
                    );
                    return SessionStatus::Cancelled;
                }
                _ = tokio::time::sleep(wait) => {
                    tracing::debug!(
                        session = %id,
                        %source,
                        elapsed_min = secs_to_minutes(started.elapsed().as_secs_f64()),
                        total_min = secs_to_minutes(duration.as_secs_f64()),
                        "session in progress"
                    );
                }
            }
        }
    }
}
