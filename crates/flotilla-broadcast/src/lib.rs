//! Observer connection registry and status fan-out.

pub mod broadcaster;
pub mod message;
pub mod registry;

pub use broadcaster::Broadcaster;
pub use message::StatusMessage;
pub use registry::ConnectionRegistry;
