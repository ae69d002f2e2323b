//! Irrigation system binary

use clap::Parser;
use rill::audit::TracingAudit;
use rill::components::prelude::*;
use rill::devices::bus::mqtt::MqttBus;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

/// MQTT keep alive interval presented to the broker.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Arguments required for starting the program from the command line.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the config file for the irrigation component.
    #[arg(short, long)]
    filepath: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = IrrigationConfig::from_file(args.filepath);

    let bus = Arc::new(MqttBus::connect(
        &config.broker_host,
        config.broker_port,
        &config.client_id,
        KEEP_ALIVE,
    ));
    let audit = Arc::new(TracingAudit);
    let dispatcher = CommandDispatcher::new(bus, audit.clone(), &config);
    let controller = SessionController::new(dispatcher, audit, &config);

    IrrigationService::start(controller, &config).await;
}
