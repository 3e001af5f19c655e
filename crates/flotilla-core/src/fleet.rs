//! Fleet control abstraction.

use async_trait::async_trait;

use crate::Result;

/// Sets the desired size of the named worker group.
///
/// The worker fleet has no self-scaling authority; desired capacity is driven
/// exclusively by the autoscaler controller through this trait.
#[async_trait]
pub trait FleetControl: Send + Sync {
    async fn set_desired_capacity(&self, capacity: u32) -> Result<()>;
}
