//! API server for Flotilla.
//!
//! Provides the HTTP job API, the WebSocket status feed, and the in-process
//! transport gateway backing it.

pub mod error;
pub mod fleet;
pub mod gateway;
pub mod routes;
pub mod services;
pub mod state;
pub mod ws;

pub use state::AppState;
