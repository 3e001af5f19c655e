//! The backlog-to-capacity step table.

use flotilla_config::ScalingStepConfig;
use flotilla_core::{Error, Result};

/// One half-open interval `[lower, upper)` mapped to an exact capacity.
/// `upper = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingInterval {
    pub lower: f64,
    pub upper: Option<f64>,
    pub target: u32,
}

impl ScalingInterval {
    fn contains(&self, backlog: f64) -> bool {
        backlog >= self.lower && self.upper.map(|upper| backlog < upper).unwrap_or(true)
    }
}

/// Ordered, non-overlapping step table. Gaps between intervals are allowed
/// and mean "maintain current capacity" for backlogs that fall into them.
#[derive(Debug, Clone)]
pub struct ScalingSteps {
    steps: Vec<ScalingInterval>,
}

impl ScalingSteps {
    pub fn new(steps: Vec<ScalingInterval>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::InvalidInput("empty scaling step table".to_string()));
        }
        for step in &steps {
            if let Some(upper) = step.upper {
                if upper <= step.lower {
                    return Err(Error::InvalidInput(format!(
                        "scaling step upper {} must exceed lower {}",
                        upper, step.lower
                    )));
                }
            }
        }
        for pair in steps.windows(2) {
            let bounded = pair[0]
                .upper
                .map(|upper| upper <= pair[1].lower)
                .unwrap_or(false);
            if !bounded {
                return Err(Error::InvalidInput(format!(
                    "scaling steps overlap at lower bound {}",
                    pair[1].lower
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn from_config(steps: &[ScalingStepConfig]) -> Result<Self> {
        Self::new(
            steps
                .iter()
                .map(|s| ScalingInterval {
                    lower: s.lower,
                    upper: s.upper,
                    target: s.target,
                })
                .collect(),
        )
    }

    /// The exact capacity for the interval containing `backlog`, if any.
    pub fn target_for(&self, backlog: f64) -> Option<u32> {
        self.steps
            .iter()
            .find(|step| step.contains(backlog))
            .map(|step| step.target)
    }
}

impl Default for ScalingSteps {
    fn default() -> Self {
        Self {
            steps: vec![
                ScalingInterval { lower: 1.0, upper: Some(10.0), target: 1 },
                ScalingInterval { lower: 10.0, upper: Some(20.0), target: 2 },
                ScalingInterval { lower: 20.0, upper: Some(50.0), target: 5 },
                ScalingInterval { lower: 50.0, upper: Some(100.0), target: 10 },
                ScalingInterval { lower: 100.0, upper: Some(300.0), target: 50 },
                ScalingInterval { lower: 300.0, upper: None, target: 200 },
            ],
        }
    }
}
