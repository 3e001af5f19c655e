//! Local stand-in for the managed fleet API.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use flotilla_core::fleet::FleetControl;
use tracing::info;

/// Records the desired capacity instead of driving a real worker group.
/// Used in local development, where no orchestration platform is attached.
#[derive(Default)]
pub struct DevFleet {
    desired: AtomicU32,
}

impl DevFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn desired(&self) -> u32 {
        self.desired.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FleetControl for DevFleet {
    async fn set_desired_capacity(&self, capacity: u32) -> flotilla_core::Result<()> {
        self.desired.store(capacity, Ordering::Relaxed);
        info!(capacity, "Desired worker capacity set");
        Ok(())
    }
}
