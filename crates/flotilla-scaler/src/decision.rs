//! The two scaling decision functions.
//!
//! Both evaluate the same backlog sample and fire on a single confirming
//! datapoint; the step table itself provides the hysteresis (a backlog of 9
//! keeps capacity at 1 rather than oscillating with 10+). The paths differ
//! only in how they read an absent sample.

use crate::steps::ScalingSteps;

/// Scale-up/maintain path: fires when the sampled backlog is at least 1,
/// assigning the exact capacity of the containing interval. Missing data is
/// not breaching and never triggers a scale-up.
pub fn scale_up_target(sample: Option<f64>, steps: &ScalingSteps) -> Option<u32> {
    let backlog = sample?;
    if backlog < 1.0 {
        return None;
    }
    steps.target_for(backlog)
}

/// Scale-to-zero path: fires when the sampled backlog is exactly zero, or
/// when the metric produced no samples at all (an empty queue emits nothing,
/// so missing data confirms the backlog is empty).
pub fn scale_to_zero_target(sample: Option<f64>) -> Option<u32> {
    match sample {
        None => Some(0),
        Some(backlog) if backlog <= 0.0 => Some(0),
        Some(_) => None,
    }
}
