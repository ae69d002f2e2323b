use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use std::time::Duration;
use thiserror::Error;

/// Capacity of the request channel between the client handle and
/// the event loop.
const CLIENT_CHANNEL_CAPACITY: usize = 10;

/// Failure raised when a command could not be handed to the bus.
#[derive(Error, Debug)]
pub enum BusError {
    /// The underlying MQTT client rejected the publish.
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    /// The bus link is not usable for some other transport reason.
    #[error("bus transport failure: {0}")]
    Transport(String),
}

/// Narrow seam to the message bus. The dispatcher publishes through
/// this trait so the bus implementation can be swapped out in tests.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Publish one payload on a topic. Any non-success outcome comes
    /// back as an error value for the caller to fold into its own
    /// result, never as a panic.
    async fn publish(
        &self,
        topic: &str,
        payload: String,
        qos: u8,
        retain: bool,
    ) -> Result<(), BusError>;
}

/// Bus link backed by an MQTT broker connection. A background task
/// drives the protocol event loop for the lifetime of the process.
pub struct MqttBus {
    client: AsyncClient,
}

impl MqttBus {
    /// Connect to the broker and start driving the event loop.
    ///
    /// * `host`: broker host name or address.
    /// * `port`: broker port.
    /// * `client_id`: id this client presents to the broker.
    /// * `keep_alive`: MQTT keep alive interval.
    pub fn connect(host: &str, port: u16, client_id: &str, keep_alive: Duration) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(keep_alive);
        let (client, event_loop) = AsyncClient::new(options, CLIENT_CHANNEL_CAPACITY);
        tokio::spawn(Self::drive(event_loop));
        Self { client }
    }

    /// Poll the protocol event loop. Connection state changes are
    /// logged only, they never steer the session control flow.
    async fn drive(mut event_loop: EventLoop) {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    tracing::info!(code = ?ack.code, "connected to mqtt broker");
                }
                Ok(Event::Incoming(Incoming::PubAck(_))) => {
                    tracing::debug!("relay command acknowledged by broker");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "mqtt connection error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Map the numeric qos level from the config file onto the
    /// protocol enum. Unknown levels degrade to at-most-once.
    fn to_qos(qos: u8) -> QoS {
        match qos {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }
}

#[async_trait]
impl BusClient for MqttBus {
    async fn publish(
        &self,
        topic: &str,
        payload: String,
        qos: u8,
        retain: bool,
    ) -> Result<(), BusError> {
        self.client
            .publish(topic, Self::to_qos(qos), retain, payload)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, QoS::AtMostOnce)]
    #[case(1, QoS::AtLeastOnce)]
    #[case(2, QoS::ExactlyOnce)]
    #[case(7, QoS::AtMostOnce)]
    fn test_qos_mapping(#[case] level: u8, #[case] expected: QoS) {
        assert_eq!(MqttBus::to_qos(level), expected);
    }

    #[test]
    fn test_transport_error_format() {
        let error = BusError::Transport(String::from("link down"));
        assert_eq!(error.to_string(), "bus transport failure: link down");
    }
}
