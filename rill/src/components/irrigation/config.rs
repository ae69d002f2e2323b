use serde::{Deserialize, Serialize};
use std::{ffi::OsStr, path::Path};

/// Configuration for an irrigation component: where the broker
/// lives, how commands are published, and the timing knobs for
/// the session controller.
#[derive(Deserialize, Serialize, PartialEq, Debug, Clone)]
pub struct IrrigationConfig {
    /// Broker host name or address.
    pub broker_host: String,
    /// Broker port.
    pub broker_port: u16,
    /// Id this client presents to the broker, also prefixes the
    /// per-command correlation ids.
    pub client_id: String,
    /// Topic the relay commands are published on.
    pub data_topic: String,
    /// MQTT qos level for command publishes.
    pub qos: u8,
    /// MQTT retain flag for command publishes.
    pub retain: bool,
    /// Internal linux port the control service listens on.
    pub service_port: i32,
    /// Cadence of the progress/cancellation checkpoints inside a
    /// running session, in seconds.
    pub check_interval_sec: u64,
    /// How long a stop call waits for the session task to wind
    /// down before forcing the slot free, in seconds.
    pub stop_timeout_sec: u64,
}

impl IrrigationConfig {
    /// Irrigation component configuration with the stock timing
    /// and publish settings.
    ///
    /// * `broker_host`: broker host name or address.
    /// * `broker_port`: broker port.
    /// * `data_topic`: relay command topic.
    /// * `service_port`: control socket port.
    pub fn new(broker_host: String, broker_port: u16, data_topic: String, service_port: i32) -> Self {
        Self {
            broker_host,
            broker_port,
            client_id: String::from("rill_backend"),
            data_topic,
            qos: 0,
            retain: false,
            service_port,
            check_interval_sec: 30,
            stop_timeout_sec: 5,
        }
    }

    /// Override the client id presented to the broker.
    ///
    /// * `client_id`: new id.
    pub fn with_client_id(mut self, client_id: String) -> Self {
        self.client_id = client_id;
        self
    }

    /// Override the publish settings.
    ///
    /// * `qos`: qos level, 0 to 2.
    /// * `retain`: retain flag.
    pub fn with_publish_settings(mut self, qos: u8, retain: bool) -> Self {
        self.qos = qos;
        self.retain = retain;
        self
    }

    /// Override the session timing knobs.
    ///
    /// * `check_interval_sec`: checkpoint cadence.
    /// * `stop_timeout_sec`: bounded stop join.
    pub fn with_timings(mut self, check_interval_sec: u64, stop_timeout_sec: u64) -> Self {
        self.check_interval_sec = check_interval_sec;
        self.stop_timeout_sec = stop_timeout_sec;
        self
    }

    /// Create a new `IrrigationConfig` by reading parameters stored in a file.
    ///
    /// * `filepath`: filepath to the stored parameters.
    pub fn from_file<F: AsRef<OsStr>>(filepath: F) -> Self {
        let file = Path::new(&filepath);
        if file.is_file() {
            let config_file = config::Config::builder()
                .add_source(config::File::new(
                    &file.to_string_lossy(),
                    config::FileFormat::Yaml,
                ))
                .build()
                .expect("Failed read config");

            config_file
                .try_deserialize::<IrrigationConfig>()
                .expect("Failed to parse config file into struct")
        } else {
            panic!("Could not locate the config file {:?}", file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::OpenOptions;

    #[test]
    #[serial]
    fn test_write_component_config_to_file() {
        let config = IrrigationConfig::new(
            String::from("mqtt-broker.local"),
            1883,
            String::from("farm/zone0/data"),
            17660,
        );

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(Path::new(&format!(
                "{}/config/components/irrigation/irrigation.yaml",
                env!("CARGO_MANIFEST_DIR")
            )))
            .expect("Failed to open file");
        serde_yaml::to_writer(file, &config).expect("Failed to write yaml");
    }

    #[test]
    #[serial]
    fn test_read_component_config_to_file() {
        let write_config = IrrigationConfig::new(
            String::from("mqtt-broker.local"),
            1883,
            String::from("farm/zone0/data"),
            17660,
        )
        .with_client_id(String::from("rill_zone0"))
        .with_publish_settings(1, true)
        .with_timings(15, 5);

        let filepath = format!(
            "{}/config/components/irrigation/irrigation_zone0.yaml",
            env!("CARGO_MANIFEST_DIR")
        );

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(Path::new(&filepath))
            .expect("Failed to open file");
        serde_yaml::to_writer(file, &write_config).expect("Failed to write yaml");

        let read_config = IrrigationConfig::from_file(Path::new(&filepath));

        assert_eq!(
            write_config, read_config,
            "Failed to read write irrigation config"
        );
    }
}
