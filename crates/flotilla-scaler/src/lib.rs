//! Backlog-driven fleet autoscaling.
//!
//! Two independent decision paths evaluate the same backlog sample on the
//! same cadence: the scale-up path maps backlog to an exact capacity through
//! an ordered step table, and the scale-to-zero path parks the fleet when the
//! backlog is empty or the metric has no samples. Both are pure functions
//! composed by the controller; neither keeps alarm state.

pub mod controller;
pub mod decision;
pub mod steps;

pub use controller::AutoscalerController;
pub use decision::{scale_to_zero_target, scale_up_target};
pub use steps::{ScalingInterval, ScalingSteps};
