//! KDL configuration parsing for Flotilla.
//!
//! Every setting has a compiled-in default matching the reference deployment;
//! a `flotilla.kdl` file overrides selectively.

pub mod error;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    AutoscalerConfig, EventsConfig, FleetConfig, FlotillaConfig, QueueConfig, ScalingStepConfig,
    WebSocketConfig, parse_config,
};
