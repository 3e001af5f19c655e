//! Application services behind the route handlers.

pub mod jobs;

pub use jobs::JobService;
