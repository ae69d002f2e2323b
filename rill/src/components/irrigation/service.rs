use crate::components::irrigation::config::IrrigationConfig;
use crate::components::irrigation::dispatch::DispatchCode;
use crate::components::irrigation::session::SessionController;
use crate::messages::control::irrigation::{IrrigationRequest, IrrigationReply};
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

/// Unit struct for fronting the session controller with a control
/// socket.
pub struct IrrigationService;

impl IrrigationService {
    /// Start the control service. Accepts connections on the internal
    /// port and serves one request per connection.
    ///
    /// * `controller`: session controller serving the requests.
    /// * `config`: component configuration.
    pub async fn start(controller: SessionController, config: &IrrigationConfig) {
        // Bind on the loop back port from within the container
        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.service_port))
            .await
            .expect("Failed to bind port");

        let controller = Arc::new(controller);

        loop {
            if let Ok((socket, _)) = listener.accept().await {
                let controller = controller.clone();
                tokio::spawn(async move {
                    handle_connection(socket, controller).await;
                });
            }
        }
    }
}

/// Run one control request against the controller and shape the
/// answer for the wire.
///
/// * `request`: parsed control request.
/// * `controller`: session controller.
pub async fn serve_request(
    request: IrrigationRequest,
    controller: &SessionController,
) -> IrrigationReply {
    match request {
        IrrigationRequest::Start {
            duration_sec,
            volume_m3,
            source,
        } => {
            let (accepted, message) = controller.start(duration_sec, volume_m3, source).await;
            IrrigationReply { accepted, message }
        }
        IrrigationRequest::Stop => {
            let outcome = controller.stop().await;
            IrrigationReply {
                accepted: outcome.code == DispatchCode::Delivered,
                message: outcome.detail,
            }
        }
    }
}

/// Handle a connection from a caller: read one newline-delimited
/// JSON request, answer with a one-line JSON reply. Malformed
/// requests are answered with a rejection, never a dropped socket.
///
/// * `socket`: `TcpStream`
/// * `controller`: session controller.
async fn handle_connection(mut socket: TcpStream, controller: Arc<SessionController>) {
    let (read_stream, mut write_stream) = socket.split();
    let mut read_stream = BufReader::new(read_stream);
    let mut data = Vec::new();

    if read_stream.read_until(b'\n', &mut data).await.is_err() {
        tracing::warn!("failed to read from control socket");
        return;
    }

    let reply = match serde_json::from_slice::<IrrigationRequest>(&data) {
        Ok(request) => serve_request(request, &controller).await,
        Err(e) => {
            tracing::warn!(error = %e, "received a malformed request");
            IrrigationReply {
                accepted: false,
                message: format!("malformed request: {e}"),
            }
        }
    };

    match serde_json::to_vec(&reply) {
        Ok(mut line) => {
            line.push(b'\n');
            if write_stream.write_all(&line).await.is_err() {
                tracing::warn!("failed to write reply to control socket");
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to serialize reply"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TracingAudit;
    use crate::components::irrigation::dispatch::CommandDispatcher;
    use crate::devices::bus::mqtt::{BusClient, BusError};
    use crate::messages::control::irrigation::SessionSource;
    use async_trait::async_trait;

    /// Bus that accepts everything and records nothing.
    struct NullBus;

    #[async_trait]
    impl BusClient for NullBus {
        async fn publish(
            &self,
            _topic: &str,
            _payload: String,
            _qos: u8,
            _retain: bool,
        ) -> Result<(), BusError> {
            Ok(())
        }
    }

    fn controller() -> SessionController {
        let config = IrrigationConfig::new(
            String::from("localhost"),
            1883,
            String::from("farm/zone0/data"),
            17660,
        );
        let audit = Arc::new(TracingAudit);
        let dispatcher = CommandDispatcher::new(Arc::new(NullBus), audit.clone(), &config);
        SessionController::new(dispatcher, audit, &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_request_is_served() {
        let controller = controller();
        let request = IrrigationRequest::Start {
            duration_sec: 30,
            volume_m3: None,
            source: SessionSource::Manual,
        };

        let reply = serve_request(request, &controller).await;
        assert!(reply.accepted);
        assert_eq!(reply.message, "session started");

        controller.stop().await;
    }

    #[tokio::test]
    async fn test_stop_request_reports_dispatch_outcome() {
        let controller = controller();

        let reply = serve_request(IrrigationRequest::Stop, &controller).await;
        assert!(reply.accepted);
        assert_eq!(reply.message, "OK");
    }
}
