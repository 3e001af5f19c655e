//! The autoscaler evaluation tick.

use std::sync::Arc;

use flotilla_core::Result;
use flotilla_core::fleet::FleetControl;
use flotilla_core::queue::WorkQueue;
use tracing::{debug, info, warn};

use crate::decision::{scale_to_zero_target, scale_up_target};
use crate::steps::ScalingSteps;

/// Drives worker-fleet size from the work queue's backlog.
///
/// The controller is a pure function of one scalar metric to one scalar
/// capacity: it never reads or writes job semantics. It is invoked on a
/// timer tick owned by the caller; overlapping evaluations are harmless
/// because each one samples and applies independently.
pub struct AutoscalerController {
    queue: Arc<dyn WorkQueue>,
    fleet: Arc<dyn FleetControl>,
    steps: ScalingSteps,
    max_capacity: u32,
}

impl AutoscalerController {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        fleet: Arc<dyn FleetControl>,
        steps: ScalingSteps,
        max_capacity: u32,
    ) -> Self {
        Self {
            queue,
            fleet,
            steps,
            max_capacity,
        }
    }

    /// One evaluation: sample the backlog, run both decision paths, apply
    /// the winning target clamped to `[0, max_capacity]`.
    ///
    /// Returns the capacity that was applied, or `None` when neither path
    /// fired (maintain). A failure to apply is logged and not retried; the
    /// next tick naturally re-issues the same target.
    pub async fn evaluate(&self) -> Result<Option<u32>> {
        let depth = self.queue.approx_depth().await?;
        let sample = depth.map(|d| d.backlog() as f64);

        let target =
            scale_up_target(sample, &self.steps).or_else(|| scale_to_zero_target(sample));

        let Some(target) = target else {
            debug!(backlog = ?sample, "No scaling decision, maintaining capacity");
            return Ok(None);
        };

        let target = target.min(self.max_capacity);
        info!(backlog = ?sample, target, "Applying desired capacity");

        if let Err(e) = self.fleet.set_desired_capacity(target).await {
            warn!(error = %e, target, "Failed to set desired capacity");
        }

        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flotilla_core::event::Envelope;
    use flotilla_core::queue::QueueDepth;
    use std::sync::Mutex;

    struct FixedDepthQueue {
        depth: Option<QueueDepth>,
    }

    #[async_trait]
    impl WorkQueue for FixedDepthQueue {
        async fn enqueue(&self, _envelope: &Envelope) -> Result<()> {
            unimplemented!()
        }

        async fn approx_depth(&self) -> Result<Option<QueueDepth>> {
            Ok(self.depth)
        }
    }

    #[derive(Default)]
    struct RecordingFleet {
        applied: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl FleetControl for RecordingFleet {
        async fn set_desired_capacity(&self, capacity: u32) -> Result<()> {
            self.applied.lock().unwrap().push(capacity);
            Ok(())
        }
    }

    struct FailingFleet;

    #[async_trait]
    impl FleetControl for FailingFleet {
        async fn set_desired_capacity(&self, _capacity: u32) -> Result<()> {
            Err(flotilla_core::Error::Fleet("throttled".to_string()))
        }
    }

    fn controller(
        depth: Option<QueueDepth>,
        fleet: Arc<dyn FleetControl>,
        max_capacity: u32,
    ) -> AutoscalerController {
        AutoscalerController::new(
            Arc::new(FixedDepthQueue { depth }),
            fleet,
            ScalingSteps::default(),
            max_capacity,
        )
    }

    #[tokio::test]
    async fn test_backlog_maps_to_exact_capacity() {
        let fleet = Arc::new(RecordingFleet::default());
        let c = controller(
            Some(QueueDepth { visible: 200, in_flight: 99 }),
            fleet.clone(),
            200,
        );
        assert_eq!(c.evaluate().await.unwrap(), Some(50));
        assert_eq!(*fleet.applied.lock().unwrap(), vec![50]);
    }

    #[tokio::test]
    async fn test_missing_samples_scale_to_zero() {
        let fleet = Arc::new(RecordingFleet::default());
        let c = controller(None, fleet.clone(), 200);
        assert_eq!(c.evaluate().await.unwrap(), Some(0));
        assert_eq!(*fleet.applied.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_empty_backlog_scales_to_zero() {
        let fleet = Arc::new(RecordingFleet::default());
        let c = controller(
            Some(QueueDepth { visible: 0, in_flight: 0 }),
            fleet.clone(),
            200,
        );
        assert_eq!(c.evaluate().await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_target_clamped_to_max_capacity() {
        let fleet = Arc::new(RecordingFleet::default());
        let c = controller(
            Some(QueueDepth { visible: 500, in_flight: 0 }),
            fleet.clone(),
            20,
        );
        assert_eq!(c.evaluate().await.unwrap(), Some(20));
    }

    #[tokio::test]
    async fn test_apply_failure_is_swallowed() {
        let c = controller(
            Some(QueueDepth { visible: 5, in_flight: 0 }),
            Arc::new(FailingFleet),
            200,
        );
        // The decision is still reported; the next tick re-issues it.
        assert_eq!(c.evaluate().await.unwrap(), Some(1));
    }
}
