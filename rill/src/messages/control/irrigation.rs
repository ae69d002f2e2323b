use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Who initiated a watering session. Carried through to the audit
/// records so manual overrides can be told apart from the schedule.
#[derive(Deserialize, Serialize, Display, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionSource {
    /// An operator pressed the button.
    #[default]
    Manual,
    /// A sensor-driven control loop asked for water.
    Automatic,
    /// The fixed watering schedule fired.
    Scheduled,
}

/// Control request read off the control socket, one JSON object
/// per line.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum IrrigationRequest {
    /// Start a timed watering session.
    Start {
        /// How long to keep the relay on, in seconds.
        duration_sec: u64,
        /// Optional target volume in cubic metres, recorded for audit only.
        #[serde(default)]
        volume_m3: Option<f64>,
        /// Who asked. Defaults to a manual request when absent.
        #[serde(default)]
        source: SessionSource,
    },
    /// Stop the current session, if any.
    Stop,
}

/// One-line JSON answer written back on the control socket.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct IrrigationReply {
    /// Whether the request took effect.
    pub accepted: bool,
    /// Human readable detail for the caller.
    pub message: String,
}
