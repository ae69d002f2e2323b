use crate::audit::AuditSink;
use crate::components::irrigation::config::IrrigationConfig;
use crate::devices::bus::mqtt::BusClient;
use crate::messages::bus::relay::{RelayCommand, RelayState};
use std::sync::Arc;
use strum_macros::Display;

/// Outcome code of one dispatch attempt. The transport failure
/// code is recorded in the audit trail even when the bus publish
/// itself went nowhere.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchCode {
    /// The bus accepted the command.
    Delivered,
    /// The bus publish failed; the command never left the process.
    TransportFailure,
}

/// Result of one dispatch attempt handed back to the caller, which
/// decides whether to retry, abort, or continue best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub code: DispatchCode,
    /// Human readable detail, the transport error text on failure.
    pub detail: String,
}

/// Dispatches discrete relay commands over the field bus. One
/// envelope is built and published per call, and every attempt is
/// audited whatever the outcome.
pub struct CommandDispatcher {
    bus: Arc<dyn BusClient>,
    audit: Arc<dyn AuditSink>,
    topic: String,
    client_id: String,
    qos: u8,
    retain: bool,
}

impl CommandDispatcher {
    /// Create a dispatcher publishing on the component's data topic.
    ///
    /// * `bus`: bus link the commands are published through.
    /// * `audit`: sink receiving one record per attempt.
    /// * `config`: component configuration.
    pub fn new(bus: Arc<dyn BusClient>, audit: Arc<dyn AuditSink>, config: &IrrigationConfig) -> Self {
        Self {
            bus,
            audit,
            topic: config.data_topic.clone(),
            client_id: config.client_id.clone(),
            qos: config.qos,
            retain: config.retain,
        }
    }

    /// Send one relay command. Transport failures are captured into
    /// the outcome and never abort the calling session.
    ///
    /// * `state`: desired relay state.
    pub async fn send(&self, state: RelayState) -> DispatchOutcome {
        let command = RelayCommand::new(state, &self.client_id, &self.topic);
        let payload = match serde_json::to_string(&command) {
            Ok(payload) => payload,
            Err(e) => {
                // Unreachable for this envelope shape, kept non-fatal anyway.
                return DispatchOutcome {
                    code: DispatchCode::TransportFailure,
                    detail: e.to_string(),
                };
            }
        };

        match self
            .bus
            .publish(&self.topic, payload.clone(), self.qos, self.retain)
            .await
        {
            Ok(()) => {
                self.audit
                    .log_command(&self.topic, &payload, DispatchCode::Delivered);
                DispatchOutcome {
                    code: DispatchCode::Delivered,
                    detail: String::from("OK"),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, topic = %self.topic, "failed to publish relay command");
                self.audit
                    .log_command(&self.topic, &payload, DispatchCode::TransportFailure);
                DispatchOutcome {
                    code: DispatchCode::TransportFailure,
                    detail: e.to_string(),
                }
            }
        }
    }
}
