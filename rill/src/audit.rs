use crate::components::irrigation::dispatch::DispatchCode;
use strum_macros::Display;

/// Session lifecycle transitions that get an audit record.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    /// Session task started and issued the ON command.
    Start,
    /// Session reached a terminal status and issued the OFF command.
    Stop,
    /// A caller stopped the session from outside.
    ManualStop,
    /// The session loop failed unexpectedly.
    Error,
}

/// Sink for relay command and session lifecycle records. Called
/// synchronously at each transition; implementations are expected
/// to be best-effort and must not block the control flow. The
/// historical database sits behind this seam as an external
/// collaborator.
pub trait AuditSink: Send + Sync {
    /// Record one relay command attempt, whatever the outcome.
    ///
    /// * `topic`: destination topic.
    /// * `payload`: serialized command envelope.
    /// * `outcome`: dispatch outcome code, including transport failures.
    fn log_command(&self, topic: &str, payload: &str, outcome: DispatchCode);

    /// Record one session lifecycle event.
    ///
    /// * `event`: which transition happened.
    /// * `duration_min`: requested or effective duration in minutes, if known.
    /// * `volume_m3`: target volume, if one was requested.
    /// * `detail`: free-form detail string, carries the outcome codes.
    /// * `source`: who initiated the session.
    fn log_session_event(
        &self,
        event: SessionEvent,
        duration_min: Option<f64>,
        volume_m3: Option<f64>,
        detail: &str,
        source: &str,
    );
}

/// Audit sink that writes records to the tracing subscriber.
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn log_command(&self, topic: &str, payload: &str, outcome: DispatchCode) {
        tracing::info!(%topic, %payload, outcome = %outcome, "relay command");
    }

    fn log_session_event(
        &self,
        event: SessionEvent,
        duration_min: Option<f64>,
        volume_m3: Option<f64>,
        detail: &str,
        source: &str,
    ) {
        tracing::info!(
            event = %event,
            duration_min,
            volume_m3,
            %detail,
            %source,
            "session event"
        );
    }
}
