/// Component that controls the irrigation relay for one zone.
pub mod irrigation {
    /// Component configuration, read from a yaml file.
    pub mod config;
    /// Builds relay command envelopes and publishes them on the bus.
    pub mod dispatch;
    /// Caller-facing control socket fronting the session controller.
    pub mod service;
    /// Session lifecycle: the single slot, the timed session task,
    /// cancellation and the relay-off guarantees.
    pub mod session;
}

/// Helpful prelude when working with components.
pub mod prelude {
    pub use crate::components::irrigation::config::*;
    pub use crate::components::irrigation::dispatch::*;
    pub use crate::components::irrigation::service::*;
    pub use crate::components::irrigation::session::*;
}
