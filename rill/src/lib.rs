/**
The rill control system keeps the micro-service style separation used across
the wider farm platform: functionality is split into small logical units
rather than a singular and highly coupled monolithic binary. The crate
controls a single irrigation relay over an MQTT command channel and runs
timed watering sessions that can be started, monitored and cancelled from
concurrent callers.
*/

/// Audit sink for relay commands and session lifecycle
/// events. Persistence of the records themselves is the
/// job of an external collaborator.
pub mod audit;
/// Components in the system are created by grouping together
/// devices into a logical unit that performs some function
/// for the overall control system.
pub mod components;
/// Devices that are an atomic unit, and can be composed
/// with other devices into components to perform some function.
pub mod devices;
/// Message structure for communication into and out of the
/// control system, such as the relay command envelope sent
/// to the device firmware.
pub mod messages;
/// Development utilities for working with timestamps and
/// duration conversions.
pub mod utils;
