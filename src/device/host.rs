//! Host-memory implementation of [`Device`].

use num::Complex;
use tracing::debug;

use super::{buffer_bytes, AllocationTracker, CommandQueue, Device, DeviceBuffer, DeviceInfo, MemFlags};
use crate::element::Real;
use crate::error::{allocation_error, Result};

/// In-process device whose buffers live in host memory.
///
/// Allocation limits from [`DeviceInfo`] are enforced, so oversize problems
/// fail the same way they would on real hardware.
#[derive(Debug)]
pub struct HostDevice {
    info: DeviceInfo,
    queues: Vec<CommandQueue>,
    tracker: AllocationTracker,
}

impl HostDevice {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            queues: vec![CommandQueue::new(0)],
            tracker: AllocationTracker::new(),
        }
    }

    /// Bytes currently held by live buffers.
    pub fn live_bytes(&self) -> u64 {
        self.tracker.live_bytes()
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new(DeviceInfo::new("host"))
    }
}

impl Device for HostDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn available_global_mem_size(&self) -> u64 {
        self.info
            .global_mem_size
            .saturating_sub(self.tracker.live_bytes())
    }

    fn queues(&self) -> &[CommandQueue] {
        &self.queues
    }

    fn create_buffer<F: Real>(
        &self,
        host: &[Complex<F>],
        offset: usize,
        flags: MemFlags,
    ) -> Result<DeviceBuffer<F>> {
        let elements = offset.checked_add(host.len()).ok_or_else(|| {
            allocation_error(u64::MAX, self.info.max_mem_alloc_size, "buffer length overflows")
        })?;
        let bytes = buffer_bytes::<F>(elements);
        if bytes > self.info.max_mem_alloc_size {
            return Err(allocation_error(
                bytes,
                self.info.max_mem_alloc_size,
                "exceeds maximum single allocation",
            ));
        }
        let lease = self.tracker.reserve(bytes, self.info.global_mem_size)?;
        debug!(bytes, offset, ?flags, "created device buffer");
        Ok(DeviceBuffer::new(host, offset, flags, Some(lease)))
    }
}
