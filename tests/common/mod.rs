#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use her2kbench::device::{CommandQueue, Device, DeviceBuffer, DeviceInfo, Event, HostDevice, MemFlags};
use her2kbench::element::Real;
use her2kbench::error::{allocation_error, device_error, validation_error, Result};
use her2kbench::kernel::{Her2kArgs, Her2kKernel, HostHer2k};
use num::Complex;

/// How host-to-device writes misbehave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    /// The write is refused when enqueued.
    Enqueue,
    /// The write is enqueued but fails once the queue runs it.
    Execute,
}

/// Host device that counts buffer creations and can lie about its memory.
pub struct FakeDevice {
    inner: HostDevice,
    creates: AtomicUsize,
    available: Option<u64>,
    fail_on_create: Option<usize>,
    write_failure: Option<WriteFailure>,
}

impl FakeDevice {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            inner: HostDevice::new(info),
            creates: AtomicUsize::new(0),
            available: None,
            fail_on_create: None,
            write_failure: None,
        }
    }

    pub fn ample() -> Self {
        Self::new(DeviceInfo::new("fake"))
    }

    /// Reports `bytes` of free global memory regardless of usage.
    pub fn with_available(mut self, bytes: u64) -> Self {
        self.available = Some(bytes);
        self
    }

    /// Makes the `nth` (1-based) buffer creation fail.
    pub fn failing_on_create(mut self, nth: usize) -> Self {
        self.fail_on_create = Some(nth);
        self
    }

    /// Makes every host-to-device write fail.
    pub fn failing_writes(mut self, failure: WriteFailure) -> Self {
        self.write_failure = Some(failure);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn live_bytes(&self) -> u64 {
        self.inner.live_bytes()
    }

    /// Commands queued on any queue and not yet run.
    pub fn pending(&self) -> usize {
        self.inner.queues().iter().map(|q| q.pending()).sum()
    }
}

impl Device for FakeDevice {
    fn info(&self) -> &DeviceInfo {
        self.inner.info()
    }

    fn available_global_mem_size(&self) -> u64 {
        self.available
            .unwrap_or_else(|| self.inner.available_global_mem_size())
    }

    fn queues(&self) -> &[CommandQueue] {
        self.inner.queues()
    }

    fn create_buffer<F: Real>(
        &self,
        host: &[Complex<F>],
        offset: usize,
        flags: MemFlags,
    ) -> Result<DeviceBuffer<F>> {
        let call = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_create == Some(call) {
            return Err(allocation_error(0, 0, "injected allocation failure"));
        }
        self.inner.create_buffer(host, offset, flags)
    }

    fn enqueue_write_buffer<F: Real>(
        &self,
        queue: &CommandQueue,
        buffer: &DeviceBuffer<F>,
        data: &[Complex<F>],
    ) -> Result<Event> {
        match self.write_failure {
            Some(WriteFailure::Enqueue) => Err(device_error(-38, "invalid mem object")),
            Some(WriteFailure::Execute) => {
                let buffer = buffer.clone();
                queue.enqueue(move || {
                    drop(buffer);
                    Err(device_error(-14, "exec status error for events in wait list"))
                })
            }
            None => self.inner.enqueue_write_buffer(queue, buffer, data),
        }
    }
}

/// Kernel whose every launch costs a fixed amount of queue time.
pub struct FixedCostKernel {
    pub cost: Duration,
    launches: AtomicUsize,
}

impl FixedCostKernel {
    pub fn new(cost: Duration) -> Self {
        Self {
            cost,
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl Her2kKernel for FixedCostKernel {
    fn her2k<F: Real>(
        &self,
        _args: &Her2kArgs<'_, F>,
        queues: &[&CommandQueue],
        _wait_list: &[Event],
    ) -> Result<Event> {
        let queue = queues
            .first()
            .ok_or_else(|| validation_error("no queue"))?;
        self.launches.fetch_add(1, Ordering::SeqCst);
        let cost = self.cost;
        queue.enqueue(move || {
            thread::sleep(cost);
            Ok(())
        })
    }
}

/// Launches like [`HostHer2k`] except on the `fail_on`-th (1-based) call,
/// which is refused.
pub struct FailsOnCall {
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailsOnCall {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Her2kKernel for FailsOnCall {
    fn her2k<F: Real>(
        &self,
        args: &Her2kArgs<'_, F>,
        queues: &[&CommandQueue],
        wait_list: &[Event],
    ) -> Result<Event> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(device_error(-5, "out of resources"));
        }
        HostHer2k.her2k(args, queues, wait_list)
    }
}
