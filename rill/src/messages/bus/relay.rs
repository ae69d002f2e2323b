use crate::utils::millis_timestamp;
use serde::{Deserialize, Serialize};

/// Desired state of the irrigation relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    /// Numeric form carried in the command payload, 1 for on
    /// and 0 for off as the firmware expects.
    pub fn device_value(self) -> u8 {
        match self {
            RelayState::On => 1,
            RelayState::Off => 0,
        }
    }
}

/// Relay command envelope published on the data topic. The field
/// names and the string typing of the header values are part of the
/// device firmware contract and must not be changed.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct RelayCommand {
    /// Command type tag, always "JOIN" for relay switching.
    #[serde(rename = "type")]
    pub command_type: String,
    /// Frame counter, unused by the relay and fixed at zero.
    pub fcnt: u32,
    /// Nested relay instruction.
    pub json: CommandBody,
    /// Header block carrying the correlation id and a copy of the
    /// destination topic.
    #[serde(rename = "mqttHeaders")]
    pub headers: CommandHeaders,
}

/// Body of the relay command.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CommandBody {
    pub switch_relay: SwitchRelay,
}

/// The relay target state.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SwitchRelay {
    /// 0 = off, 1 = on.
    pub device: u8,
}

/// Header block of the command envelope. All values are strings in
/// the firmware contract, including the booleans and numbers.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CommandHeaders {
    #[serde(rename = "mqtt_receivedRetained")]
    pub received_retained: String,
    pub mqtt_id: String,
    pub mqtt_duplicate: String,
    /// Correlation id, the publishing client id joined with the
    /// millisecond timestamp.
    pub id: String,
    #[serde(rename = "mqtt_receivedTopic")]
    pub received_topic: String,
    #[serde(rename = "mqtt_receivedQos")]
    pub received_qos: String,
    /// Millisecond timestamp the command was built at.
    pub timestamp: String,
}

impl RelayCommand {
    /// Build a command for the given relay state, stamped with a
    /// fresh correlation id.
    ///
    /// * `state`: relay target state.
    /// * `client_id`: id of the publishing client, prefixes the correlation id.
    /// * `topic`: destination topic, copied into the headers.
    pub fn new(state: RelayState, client_id: &str, topic: &str) -> Self {
        let timestamp = millis_timestamp();
        Self {
            command_type: String::from("JOIN"),
            fcnt: 0,
            json: CommandBody {
                switch_relay: SwitchRelay {
                    device: state.device_value(),
                },
            },
            headers: CommandHeaders {
                received_retained: String::from("false"),
                mqtt_id: String::from("0"),
                mqtt_duplicate: String::from("false"),
                id: format!("{client_id}-{timestamp}"),
                received_topic: String::from(topic),
                received_qos: String::from("0"),
                timestamp,
            },
        }
    }
}
