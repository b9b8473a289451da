//! Compute context consumed by the harness.
//!
//! The harness never looks a device up globally: a [`Device`] is passed in
//! explicitly, which keeps the orchestrator testable with fake contexts.
//! Buffers are scoped acquisitions; their bytes return to the device when the
//! last handle is dropped.

mod host;
mod queue;

pub use host::HostDevice;
pub use queue::{CommandQueue, Event};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use num::{Complex, Zero};

use crate::element::Real;
use crate::error::{allocation_error, device_error, validation_error, Result};

/// Static capabilities and limits reported by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    /// Total global memory in bytes.
    pub global_mem_size: u64,
    /// Largest single buffer in bytes.
    pub max_mem_alloc_size: u64,
    /// Native double-precision support.
    pub double_precision: bool,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            global_mem_size: 4 << 30,
            max_mem_alloc_size: 1 << 30,
            double_precision: true,
        }
    }

    pub fn with_global_mem_size(mut self, bytes: u64) -> Self {
        self.global_mem_size = bytes;
        self
    }

    pub fn with_max_mem_alloc_size(mut self, bytes: u64) -> Self {
        self.max_mem_alloc_size = bytes;
        self
    }

    pub fn with_double_precision(mut self, supported: bool) -> Self {
        self.double_precision = supported;
        self
    }
}

/// Access mode of a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemFlags {
    ReadOnly,
    ReadWrite,
}

/// Shared counter of live device bytes.
#[derive(Debug, Clone, Default)]
pub struct AllocationTracker {
    live: Arc<AtomicU64>,
}

impl AllocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently held by live buffers.
    pub fn live_bytes(&self) -> u64 {
        self.live.load(Ordering::SeqCst)
    }

    /// Reserves `bytes` if the total stays within `limit`.
    pub fn reserve(&self, bytes: u64, limit: u64) -> Result<AllocationLease> {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                live.checked_add(bytes).filter(|total| *total <= limit)
            })
            .map_err(|live| {
                allocation_error(
                    bytes,
                    limit.saturating_sub(live),
                    "not enough free global memory",
                )
            })?;
        Ok(AllocationLease {
            bytes,
            live: Arc::clone(&self.live),
        })
    }
}

/// Bytes reserved for one buffer; returned to the tracker on drop.
#[derive(Debug)]
pub struct AllocationLease {
    bytes: u64,
    live: Arc<AtomicU64>,
}

impl Drop for AllocationLease {
    fn drop(&mut self) {
        self.live.fetch_sub(self.bytes, Ordering::SeqCst);
    }
}

struct BufferInner<F: Real> {
    data: RwLock<Vec<Complex<F>>>,
    offset: usize,
    flags: MemFlags,
    _lease: Option<AllocationLease>,
}

/// Device-resident matrix storage.
///
/// The host data occupies `offset..offset + host_len`; the leading `offset`
/// elements are zero padding. Cloning yields another handle to the same
/// storage (commands in flight hold one), so the allocation is released when
/// the last handle drops.
pub struct DeviceBuffer<F: Real> {
    inner: Arc<BufferInner<F>>,
}

impl<F: Real> Clone for DeviceBuffer<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Real> fmt::Debug for DeviceBuffer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.len())
            .field("offset", &self.inner.offset)
            .field("flags", &self.inner.flags)
            .finish()
    }
}

impl<F: Real> DeviceBuffer<F> {
    /// Copies `host` into fresh storage placed after `offset` padding elements.
    pub fn new(
        host: &[Complex<F>],
        offset: usize,
        flags: MemFlags,
        lease: Option<AllocationLease>,
    ) -> Self {
        let mut data = vec![Complex::zero(); offset + host.len()];
        data[offset..].copy_from_slice(host);
        Self {
            inner: Arc::new(BufferInner {
                data: RwLock::new(data),
                offset,
                flags,
                _lease: lease,
            }),
        }
    }

    /// Total element count, padding included.
    pub fn len(&self) -> usize {
        self.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> usize {
        self.inner.offset
    }

    pub fn flags(&self) -> MemFlags {
        self.inner.flags
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Complex<F>>>> {
        self.inner
            .data
            .read()
            .map_err(|_| device_error(-5, "buffer lock poisoned"))
    }

    /// Write access for kernels; read-only buffers refuse it.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Complex<F>>>> {
        if self.inner.flags == MemFlags::ReadOnly {
            return Err(device_error(-30, "kernel write to a read-only buffer"));
        }
        self.inner
            .data
            .write()
            .map_err(|_| device_error(-5, "buffer lock poisoned"))
    }

    /// Whether both handles refer to the same storage.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Host-to-device copy of `src` starting at the buffer offset.
    pub fn write_from(&self, src: &[Complex<F>]) -> Result<()> {
        let mut data = self
            .inner
            .data
            .write()
            .map_err(|_| device_error(-5, "buffer lock poisoned"))?;
        let start = self.inner.offset;
        let end = start + src.len();
        if end > data.len() {
            return Err(validation_error(format!(
                "write of {} elements at offset {start} exceeds buffer of {}",
                src.len(),
                data.len()
            )));
        }
        data[start..end].copy_from_slice(src);
        Ok(())
    }

    /// Device-to-host copy of the data region (padding excluded).
    pub fn to_vec(&self) -> Result<Vec<Complex<F>>> {
        Ok(self.read()?[self.inner.offset..].to_vec())
    }
}

/// A compute device: capabilities, queues and buffer primitives.
pub trait Device {
    fn info(&self) -> &DeviceInfo;

    /// Global memory currently available for new buffers.
    fn available_global_mem_size(&self) -> u64 {
        self.info().global_mem_size
    }

    fn queues(&self) -> &[CommandQueue];

    /// Creates a buffer of `offset + host.len()` elements initialised from `host`.
    fn create_buffer<F: Real>(
        &self,
        host: &[Complex<F>],
        offset: usize,
        flags: MemFlags,
    ) -> Result<DeviceBuffer<F>>;

    /// Enqueues a host-to-device copy into `buffer`.
    fn enqueue_write_buffer<F: Real>(
        &self,
        queue: &CommandQueue,
        buffer: &DeviceBuffer<F>,
        data: &[Complex<F>],
    ) -> Result<Event> {
        let buffer = buffer.clone();
        let data = data.to_vec();
        queue.enqueue(move || buffer.write_from(&data))
    }
}

/// Size in bytes of a buffer holding `elements` values of `Complex<F>`.
pub fn buffer_bytes<F: Real>(elements: usize) -> u64 {
    (elements as u64).saturating_mul(std::mem::size_of::<Complex<F>>() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_places_data_after_offset() {
        let host = vec![Complex::new(1.0f32, 2.0), Complex::new(3.0, 4.0)];
        let buffer = DeviceBuffer::new(&host, 3, MemFlags::ReadOnly, None);
        assert_eq!(buffer.len(), 5);
        let data = buffer.read().unwrap();
        assert_eq!(data[0], Complex::zero());
        assert_eq!(&data[3..], host.as_slice());
        drop(data);
        assert_eq!(buffer.to_vec().unwrap(), host);
    }

    #[test]
    fn test_read_only_buffer_refuses_kernel_writes() {
        let buffer = DeviceBuffer::new(&[Complex::new(0.0f64, 0.0)], 0, MemFlags::ReadOnly, None);
        assert!(buffer.write().is_err());
        // host transfers are still allowed
        assert!(buffer.write_from(&[Complex::new(1.0, 0.0)]).is_ok());
    }

    #[test]
    fn test_lease_released_with_last_handle() {
        let tracker = AllocationTracker::new();
        let lease = tracker.reserve(64, 128).unwrap();
        let buffer = DeviceBuffer::new(&[Complex::new(0.0f32, 0.0)], 0, MemFlags::ReadWrite, Some(lease));
        let extra = buffer.clone();
        assert_eq!(tracker.live_bytes(), 64);
        drop(buffer);
        assert_eq!(tracker.live_bytes(), 64);
        drop(extra);
        assert_eq!(tracker.live_bytes(), 0);
    }

    #[test]
    fn test_reserve_respects_limit() {
        let tracker = AllocationTracker::new();
        let _held = tracker.reserve(100, 150).unwrap();
        let err = tracker.reserve(60, 150).unwrap_err();
        assert!(err.to_string().contains("limit 50 bytes"));
    }
}
