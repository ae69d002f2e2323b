/// Standardise how messages are sent into and out of
/// the current control system. Provide test suite to
/// ensure interfaces are respected.
pub mod control {
    /// Irrigation messages come from external callers over
    /// the control socket. They specify whether to start a
    /// timed watering session or stop the current one.
    pub mod irrigation;
}

/// Messages sent out over the field bus to the device firmware.
pub mod bus {
    /// Relay command envelope. The shape is part of the firmware
    /// contract and must be reproduced field for field.
    pub mod relay;
}
