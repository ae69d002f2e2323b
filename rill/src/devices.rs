/// Devices are the atomic units that can be combined together
/// into components. Their core responsibilities do not change
/// based on location, name etc.
pub mod bus {
    /// Device interface for the MQTT field bus link.
    pub mod mqtt;
}
