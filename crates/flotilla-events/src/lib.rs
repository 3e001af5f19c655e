//! Event routing and container lifecycle monitoring.

pub mod monitor;
pub mod router;

pub use monitor::{CONTAINER_STATE_CHANGE, ContainerMonitor};
pub use router::{EventRouter, RouteOutcome, RouteTable};
