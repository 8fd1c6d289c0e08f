//! Behavioral model of the merge-sort accelerator.
//!
//! Stands in for the accelerator RTL when the firmware is not running on the
//! FPGA. The model owns a four-word register file and a device thread. When
//! the host writes the start command, the device thread reads the source
//! buffer, scratch buffer and count out of the register file, sorts directly
//! on host memory, and clears the command word. The host side talks to it
//! through [`ModelRegisters`], which implements the same [`RegisterBlock`]
//! capability as the real MMIO block, so the driver under test is the
//! production [`AcceleratorBridge`] code.
//!
//! The device sorts with its own top-down merge schedule rather than the
//! host's bottom-up passes, so comparing the two paths checks the sort result
//! as well as the register protocol. Both take the right-hand element on
//! equal keys.
//!
//! [`AcceleratorBridge`]: msort_core::AcceleratorBridge

use msort_common::regs::{CMD_IDLE, CMD_START, NUM_REGISTERS, Register};
use msort_core::RegisterBlock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How the model reacts to a start command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceBehavior {
    /// Sort and clear the command word.
    #[default]
    Normal,
    /// Accept the request but never complete it, until
    /// [`SortAccelModel::set_stalled`] releases the device.
    Stalled,
}

/// Construction parameters for [`SortAccelModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceConfig {
    pub behavior: DeviceBehavior,

    /// Time the device spends on each request before touching memory.
    ///
    /// Gives the host's status polling something to wait for, so tests can
    /// observe the `Running` state and exercise poll budgets.
    pub latency: Duration,
}

/// State shared between the register handles and the device thread.
struct Shared {
    regs: [AtomicU64; NUM_REGISTERS],
    stalled: AtomicBool,
    shutdown: AtomicBool,
    completed: AtomicU64,
    overruns: AtomicU64,
}

impl Shared {
    fn reg(&self, reg: Register) -> &AtomicU64 {
        &self.regs[reg.offset()]
    }
}

/// A running accelerator model.
///
/// Dropping the model stops the device thread. A request that is still
/// outstanding at that point is abandoned without touching memory again.
pub struct SortAccelModel {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SortAccelModel {
    /// Starts the device thread.
    ///
    /// # Safety
    ///
    /// Like the real accelerator, the model writes to whatever addresses are
    /// programmed into its source and destination registers. Every request
    /// started through [`Self::registers`] must name two live, writable
    /// buffers of at least `count` words that nothing else accesses until
    /// completion is observed. Driving the model only through
    /// `AcceleratorBridge::sort`, or through `try_sort` within its own safety
    /// contract, satisfies this.
    pub unsafe fn spawn(config: DeviceConfig) -> Self {
        let shared = Arc::new(Shared {
            regs: [const { AtomicU64::new(0) }; NUM_REGISTERS],
            stalled: AtomicBool::new(config.behavior == DeviceBehavior::Stalled),
            shutdown: AtomicBool::new(false),
            completed: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
        });

        let device = shared.clone();
        let latency = config.latency;
        let worker = thread::Builder::new()
            .name("msort-accel".into())
            .spawn(move || run_device(&device, latency))
            .ok();

        Self { shared, worker }
    }

    /// Returns a handle to the register block.
    ///
    /// Handles are cheap to clone and all refer to the same device. The
    /// device still accepts one request at a time: two owners programming it
    /// concurrently is a protocol violation, counted by [`Self::overruns`].
    pub fn registers(&self) -> ModelRegisters {
        ModelRegisters {
            shared: self.shared.clone(),
        }
    }

    /// Number of requests the device has completed.
    pub fn completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Acquire)
    }

    /// Number of register writes that arrived while a request was running.
    pub fn overruns(&self) -> u64 {
        self.shared.overruns.load(Ordering::Acquire)
    }

    /// Holds or releases the device. A released device picks up a pending
    /// request immediately.
    pub fn set_stalled(&self, stalled: bool) {
        self.shared.stalled.store(stalled, Ordering::Release);
    }

    /// Returns true if the device thread could be started.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for SortAccelModel {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Host-side handle to the model's register block.
#[derive(Clone)]
pub struct ModelRegisters {
    shared: Arc<Shared>,
}

impl RegisterBlock for ModelRegisters {
    fn write_register(&mut self, reg: Register, value: u64) {
        if self.shared.reg(Register::Command).load(Ordering::Acquire) != CMD_IDLE {
            self.shared.overruns.fetch_add(1, Ordering::AcqRel);
        }
        self.shared.reg(reg).store(value, Ordering::Release);
    }

    fn read_register(&mut self, reg: Register) -> u64 {
        self.shared.reg(reg).load(Ordering::Acquire)
    }
}

/// Device thread body: wait for a start command, sort, signal done.
fn run_device(shared: &Shared, latency: Duration) {
    while !shared.shutdown.load(Ordering::Acquire) {
        let pending = shared.reg(Register::Command).load(Ordering::Acquire) == CMD_START;
        if !pending || shared.stalled.load(Ordering::Acquire) {
            thread::yield_now();
            continue;
        }

        let src = shared.reg(Register::SrcAddr).load(Ordering::Acquire) as usize as *mut u64;
        let dst = shared.reg(Register::DstAddr).load(Ordering::Acquire) as usize as *mut u64;
        let n = shared.reg(Register::Count).load(Ordering::Acquire) as usize;

        if !latency.is_zero() {
            thread::sleep(latency);
        }

        if n > 0 {
            // SAFETY: `SortAccelModel::spawn` requires every started request
            // to name two live buffers of `n` words reserved for the device
            // until it clears the command word below.
            let (primary, scratch) = unsafe {
                (
                    std::slice::from_raw_parts_mut(src, n),
                    std::slice::from_raw_parts_mut(dst, n),
                )
            };
            sort_engine(primary, scratch);
        }

        shared.completed.fetch_add(1, Ordering::AcqRel);
        shared
            .reg(Register::Command)
            .store(CMD_IDLE, Ordering::Release);
    }
}

/// Top-down merge sort of `data`, with `scratch` (same length) as workspace.
///
/// Leaves the result in `data`.
fn sort_engine(data: &mut [u64], scratch: &mut [u64]) {
    let n = data.len();
    if n < 2 {
        return;
    }
    let mid = n / 2;
    {
        let (left, right) = data.split_at_mut(mid);
        let (left_tmp, right_tmp) = scratch.split_at_mut(mid);
        sort_engine(left, left_tmp);
        sort_engine(right, right_tmp);
    }

    scratch.copy_from_slice(data);
    let (left, right) = scratch.split_at(mid);
    let (mut i, mut j) = (0, 0);
    for slot in data.iter_mut() {
        // Left wins only when strictly smaller.
        if i < left.len() && (j == right.len() || left[i] < right[j]) {
            *slot = left[i];
            i += 1;
        } else {
            *slot = right[j];
            j += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msort_core::{AcceleratorBridge, BridgeState, SortError, software_sort};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn engine_agrees_with_software_passes() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in (0..130).chain([511, 512, 513, 3000]) {
            let input: Vec<u64> = (0..n).map(|_| rng.gen_range(0..50)).collect();

            let mut sw = input.clone();
            let mut sw_scratch = vec![0u64; n];
            software_sort(&mut sw, &mut sw_scratch, n);

            let mut hw = input.clone();
            let mut hw_scratch = vec![0u64; n];
            sort_engine(&mut hw, &mut hw_scratch);

            assert_eq!(hw, sw, "n = {}", n);
        }
    }

    #[test]
    fn sorts_through_the_bridge() {
        let model = unsafe { SortAccelModel::spawn(DeviceConfig::default()) };
        assert!(model.is_running());
        let mut bridge = AcceleratorBridge::new(model.registers());

        let mut a = vec![4u64, 3, 2, 1, 0];
        let mut b = vec![0u64; 5];
        bridge.sort(&mut a, &mut b, 5);

        assert_eq!(a, [0, 1, 2, 3, 4]);
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert_eq!(model.completed(), 1);
        assert_eq!(model.overruns(), 0);
    }

    #[test]
    fn empty_request_completes() {
        let model = unsafe { SortAccelModel::spawn(DeviceConfig::default()) };
        let mut bridge = AcceleratorBridge::new(model.registers());
        let mut a: Vec<u64> = Vec::new();
        let mut b: Vec<u64> = Vec::new();
        bridge.sort(&mut a, &mut b, 0);
        assert_eq!(model.completed(), 1);
    }

    #[test]
    fn stalled_device_is_reported_and_recovered() {
        let model = unsafe {
            SortAccelModel::spawn(DeviceConfig {
                behavior: DeviceBehavior::Stalled,
                latency: Duration::ZERO,
            })
        };
        let mut bridge = AcceleratorBridge::new(model.registers());
        let mut a = vec![2u64, 1];
        let mut b = vec![0u64; 2];

        // SAFETY: `a` and `b` outlive the bridge and are only read after
        // `wait_idle` succeeds.
        assert_eq!(
            unsafe { bridge.try_sort(&mut a, &mut b, 2, 16) },
            Err(SortError::Timeout { polls: 16 })
        );
        assert_eq!(bridge.state(), BridgeState::Running);
        assert_eq!(model.completed(), 0);

        model.set_stalled(false);
        assert!(bridge.wait_idle(u32::MAX).is_ok());
        assert_eq!(a, [1, 2]);
        assert_eq!(model.completed(), 1);
    }
}
