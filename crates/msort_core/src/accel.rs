//! Driver for the memory-mapped merge-sort accelerator.
//!
//! The accelerator reads and writes host memory on its own, outside the
//! host's cache-coherence domain. A request is therefore bracketed by two
//! full fences: one before the registers are programmed so the buffers are
//! in memory when the device starts reading, and one after completion is
//! observed so the host does not read stale lines of the sorted buffer.

use crate::SortError;
use msort_common::regs::{CMD_IDLE, CMD_START, Register};

/// Full memory barrier ordering host accesses against device accesses.
///
/// On RISC-V this is `fence iorw, iorw`, which also orders the MMIO register
/// accesses against ordinary memory. Elsewhere a sequentially consistent
/// fence is the strongest portable equivalent.
#[inline(always)]
pub fn full_fence() {
    #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
    unsafe {
        core::arch::asm!("fence iorw, iorw", options(nostack, preserves_flags));
    }
    #[cfg(not(any(target_arch = "riscv32", target_arch = "riscv64")))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

/// Capability to access the accelerator's register block.
///
/// The bridge performs every device interaction through this trait, which
/// makes the polling loop injectable: a mock or a simulated device decides
/// when the command word reads back as idle.
pub trait RegisterBlock {
    /// Writes `value` to `reg`.
    fn write_register(&mut self, reg: Register, value: u64);

    /// Reads the current value of `reg`.
    fn read_register(&mut self, reg: Register) -> u64;

    /// Barrier issued before the request is programmed.
    fn barrier_before(&mut self) {
        full_fence();
    }

    /// Barrier issued after completion has been observed.
    fn barrier_after(&mut self) {
        full_fence();
    }
}

impl<R: RegisterBlock + ?Sized> RegisterBlock for &mut R {
    fn write_register(&mut self, reg: Register, value: u64) {
        (**self).write_register(reg, value)
    }

    fn read_register(&mut self, reg: Register) -> u64 {
        (**self).read_register(reg)
    }

    fn barrier_before(&mut self) {
        (**self).barrier_before()
    }

    fn barrier_after(&mut self) {
        (**self).barrier_after()
    }
}

/// Volatile access to a register block mapped at a fixed physical address.
pub struct MmioRegisters {
    base: *mut u64,
}

// The block is a fixed device address, not memory owned by any thread.
// Exclusive use is enforced by whoever owns the `MmioRegisters` value.
unsafe impl Send for MmioRegisters {}

impl MmioRegisters {
    /// Creates a register handle for the block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the 8-byte aligned address of the accelerator's
    /// register block, mapped and accessible for volatile 64-bit reads and
    /// writes. At most one handle per device may be in use at a time, since
    /// the block has no request queue.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u64,
        }
    }
}

impl RegisterBlock for MmioRegisters {
    #[inline(always)]
    fn write_register(&mut self, reg: Register, value: u64) {
        // SAFETY: `new` requires `base` to point at the mapped block, and
        // every `Register` offset lies inside it.
        unsafe { self.base.add(reg.offset()).write_volatile(value) }
    }

    #[inline(always)]
    fn read_register(&mut self, reg: Register) -> u64 {
        // SAFETY: as for `write_register`.
        unsafe { self.base.add(reg.offset()).read_volatile() }
    }
}

/// Host-side view of the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No request outstanding.
    Idle,
    /// Registers are being programmed; the command word is not yet written.
    Configuring,
    /// The command word has been written and completion not yet observed.
    Running,
}

/// Runs merge sorts on the accelerator behind a [`RegisterBlock`].
///
/// Owning the bridge means owning the device: every request method takes
/// `&mut self`, and a new request first waits out one left running by
/// [`Self::try_sort`], so a single owner can never overlap two requests. Callers
/// that share a device across threads or cores must put the bridge behind a
/// lock that covers the whole request.
pub struct AcceleratorBridge<R> {
    regs: R,
    state: BridgeState,
}

impl<R: RegisterBlock> AcceleratorBridge<R> {
    /// Wraps a register block. The device is assumed idle.
    pub const fn new(regs: R) -> Self {
        Self {
            regs,
            state: BridgeState::Idle,
        }
    }

    /// Current request state as seen by the host.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The underlying register block.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutable access to the register block, bypassing the request protocol.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Sorts `primary[..n]` on the accelerator, using `scratch` as workspace.
    ///
    /// Produces exactly the result of [`crate::sort::merge_sort`]. Blocks
    /// until the device clears the command word, with no timeout: a device
    /// that never completes hangs the caller. Use [`Self::try_sort`] when a
    /// reported fault is needed instead.
    ///
    /// A request still outstanding from a timed-out [`Self::try_sort`] is
    /// waited out first, so the registers are never reprogrammed while the
    /// device is consuming them.
    ///
    /// # Panics
    ///
    /// Panics if either buffer is shorter than `n`. The device writes host
    /// memory directly, so this is checked before any register is touched.
    pub fn sort(&mut self, primary: &mut [u64], scratch: &mut [u64], n: usize) {
        assert!(
            n <= primary.len() && n <= scratch.len(),
            "accelerated sort: {} elements do not fit buffers of {} and {} words",
            n,
            primary.len(),
            scratch.len()
        );

        self.drain();
        self.start(primary, scratch, n);
        self.drain();
    }

    /// Sorts like [`Self::sort`] but gives up after `max_polls` status reads.
    ///
    /// Refuses to program the device while its command word is non-zero.
    /// On timeout the request stays outstanding: the device may still write
    /// `primary` and `scratch`, and the bridge remains
    /// [`BridgeState::Running`] until [`Self::wait_idle`] or a later
    /// [`Self::sort`] observes completion.
    ///
    /// # Returns
    ///
    /// The number of status reads it took to observe completion.
    ///
    /// # Safety
    ///
    /// If this returns [`SortError::Timeout`], the device still holds the
    /// addresses of `primary` and `scratch` although their borrows have
    /// ended. The caller must keep both buffers alive and must neither read
    /// nor write them until this bridge has observed completion, through
    /// [`Self::wait_idle`] returning `Ok` or a subsequent [`Self::sort`]
    /// returning. Every other outcome leaves nothing outstanding.
    pub unsafe fn try_sort(
        &mut self,
        primary: &mut [u64],
        scratch: &mut [u64],
        n: usize,
        max_polls: u32,
    ) -> Result<u32, SortError> {
        let available = primary.len().min(scratch.len());
        if n > available {
            return Err(SortError::CapacityTooSmall {
                required: n,
                available,
            });
        }
        if self.state != BridgeState::Idle
            || self.regs.read_register(Register::Command) != CMD_IDLE
        {
            return Err(SortError::DeviceBusy);
        }

        self.start(primary, scratch, n);
        self.wait_idle(max_polls)
    }

    /// Polls an outstanding request for up to `max_polls` status reads.
    ///
    /// Returns `Ok(0)` without touching the device when nothing is
    /// outstanding.
    pub fn wait_idle(&mut self, max_polls: u32) -> Result<u32, SortError> {
        if self.state == BridgeState::Idle {
            return Ok(0);
        }
        for polls in 1..=max_polls {
            if self.regs.read_register(Register::Command) == CMD_IDLE {
                self.complete();
                return Ok(polls);
            }
            core::hint::spin_loop();
        }
        Err(SortError::Timeout { polls: max_polls })
    }

    fn start(&mut self, primary: &mut [u64], scratch: &mut [u64], n: usize) {
        self.state = BridgeState::Configuring;
        self.regs.barrier_before();

        self.regs
            .write_register(Register::SrcAddr, primary.as_mut_ptr() as usize as u64);
        self.regs
            .write_register(Register::DstAddr, scratch.as_mut_ptr() as usize as u64);
        self.regs.write_register(Register::Count, n as u64);
        // The command write is the trigger and must come last.
        self.regs.write_register(Register::Command, CMD_START);

        self.state = BridgeState::Running;
    }

    /// Spins until any outstanding request has completed.
    fn drain(&mut self) {
        if self.state == BridgeState::Idle {
            return;
        }
        while self.regs.read_register(Register::Command) != CMD_IDLE {
            core::hint::spin_loop();
        }
        self.complete();
    }

    fn complete(&mut self) {
        self.regs.barrier_after();
        self.state = BridgeState::Idle;
    }
}

/// Sorts `primary[..n]` on the accelerator behind `regs`.
///
/// One-shot form of [`AcceleratorBridge::sort`] for callers that keep the
/// register block themselves.
pub fn accelerated_sort<R: RegisterBlock>(
    regs: &mut R,
    primary: &mut [u64],
    scratch: &mut [u64],
    n: usize,
) {
    AcceleratorBridge::new(regs).sort(primary, scratch, n);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::sort::merge_sort;
    use std::vec;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        BarrierBefore,
        Write(Register, u64),
        BarrierAfter,
    }

    /// Register file that completes after a fixed number of busy reads,
    /// running the software sort on the programmed addresses.
    struct MockDevice {
        regs: [u64; 4],
        events: Vec<Event>,
        busy_reads: u32,
        remaining: u32,
        status_reads: u32,
        stall_reads: u32,
    }

    impl MockDevice {
        fn new(busy_reads: u32) -> Self {
            Self {
                regs: [0; 4],
                events: Vec::new(),
                busy_reads,
                remaining: 0,
                status_reads: 0,
                stall_reads: 0,
            }
        }

        /// A device that ignores the next `reads` status reads, then works.
        fn stalled_for(reads: u32) -> Self {
            Self {
                stall_reads: reads,
                ..Self::new(0)
            }
        }

        fn stalled() -> Self {
            Self::stalled_for(u32::MAX)
        }

        fn run_request(&mut self) {
            let n = self.regs[Register::Count.offset()] as usize;
            let src = self.regs[Register::SrcAddr.offset()] as usize as *mut u64;
            let dst = self.regs[Register::DstAddr.offset()] as usize as *mut u64;
            // SAFETY: the bridge programmed these from live slices of at least
            // `n` elements that it keeps borrowed until completion is seen.
            let (a, b) = unsafe {
                (
                    core::slice::from_raw_parts_mut(src, n),
                    core::slice::from_raw_parts_mut(dst, n),
                )
            };
            merge_sort(a, b, n);
            self.regs[Register::Command.offset()] = CMD_IDLE;
        }
    }

    impl RegisterBlock for MockDevice {
        fn write_register(&mut self, reg: Register, value: u64) {
            self.events.push(Event::Write(reg, value));
            self.regs[reg.offset()] = value;
            if reg == Register::Command && value == CMD_START {
                self.remaining = self.busy_reads;
            }
        }

        fn read_register(&mut self, reg: Register) -> u64 {
            if reg == Register::Command {
                self.status_reads += 1;
                if self.regs[0] == CMD_START {
                    if self.stall_reads > 0 {
                        self.stall_reads -= 1;
                    } else if self.remaining == 0 {
                        self.run_request();
                    } else {
                        self.remaining -= 1;
                    }
                }
            }
            self.regs[reg.offset()]
        }

        fn barrier_before(&mut self) {
            self.events.push(Event::BarrierBefore);
        }

        fn barrier_after(&mut self) {
            self.events.push(Event::BarrierAfter);
        }
    }

    #[test]
    fn programs_registers_in_protocol_order() {
        let mut a = [3u64, 1, 2];
        let mut b = [0u64; 3];
        let src = a.as_mut_ptr() as usize as u64;
        let dst = b.as_mut_ptr() as usize as u64;

        let mut bridge = AcceleratorBridge::new(MockDevice::new(2));
        bridge.sort(&mut a, &mut b, 3);

        assert_eq!(
            bridge.registers().events,
            vec![
                Event::BarrierBefore,
                Event::Write(Register::SrcAddr, src),
                Event::Write(Register::DstAddr, dst),
                Event::Write(Register::Count, 3),
                Event::Write(Register::Command, CMD_START),
                Event::BarrierAfter,
            ]
        );
        assert_eq!(a, [1, 2, 3]);
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn polls_until_device_reports_done() {
        let mut a = [2u64, 1];
        let mut b = [0u64; 2];
        let mut bridge = AcceleratorBridge::new(MockDevice::new(5));
        bridge.sort(&mut a, &mut b, 2);
        assert_eq!(bridge.registers().status_reads, 6);
        assert_eq!(a, [1, 2]);
    }

    #[test]
    fn matches_software_sort() {
        for n in 0..70usize {
            let input: Vec<u64> = (0..n as u64).map(|i| (i * 7919) % 61).collect();

            let mut sw = input.clone();
            let mut sw_scratch = vec![0u64; n];
            merge_sort(&mut sw, &mut sw_scratch, n);

            let mut hw = input.clone();
            let mut hw_scratch = vec![0u64; n];
            let mut device = MockDevice::new(1);
            accelerated_sort(&mut device, &mut hw, &mut hw_scratch, n);

            assert_eq!(hw, sw, "n = {}", n);
        }
    }

    #[test]
    fn try_sort_reports_poll_count() {
        let mut a = [5u64, 4, 3, 2, 1];
        let mut b = [0u64; 5];
        let mut bridge = AcceleratorBridge::new(MockDevice::new(3));
        assert_eq!(unsafe { bridge.try_sort(&mut a, &mut b, 5, 10) }, Ok(4));
        assert_eq!(a, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn stalled_device_times_out_and_stays_running() {
        let mut a = [2u64, 1];
        let mut b = [0u64; 2];
        let mut bridge = AcceleratorBridge::new(MockDevice::stalled());

        assert_eq!(
            unsafe { bridge.try_sort(&mut a, &mut b, 2, 8) },
            Err(SortError::Timeout { polls: 8 })
        );
        assert_eq!(bridge.state(), BridgeState::Running);
        assert!(
            !bridge
                .registers()
                .events
                .contains(&Event::BarrierAfter)
        );

        // A second request must not overwrite the in-flight one.
        let mut c = [9u64, 8];
        let mut d = [0u64; 2];
        assert_eq!(
            unsafe { bridge.try_sort(&mut c, &mut d, 2, 8) },
            Err(SortError::DeviceBusy)
        );

        // The device finally finishes; wait_idle observes it.
        bridge.registers_mut().regs[0] = CMD_IDLE;
        assert_eq!(bridge.wait_idle(1), Ok(1));
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn sort_waits_out_a_timed_out_request() {
        let mut a = [2u64, 1];
        let mut b = [0u64; 2];
        let mut c = [9u64, 8, 7];
        let mut d = [0u64; 3];
        let a_ptr = a.as_mut_ptr() as usize as u64;
        let c_ptr = c.as_mut_ptr() as usize as u64;
        let mut bridge = AcceleratorBridge::new(MockDevice::stalled_for(10));

        assert_eq!(
            unsafe { bridge.try_sort(&mut a, &mut b, 2, 4) },
            Err(SortError::Timeout { polls: 4 })
        );
        bridge.sort(&mut c, &mut d, 3);

        assert_eq!(a, [1, 2]);
        assert_eq!(c, [7, 8, 9]);
        assert_eq!(bridge.state(), BridgeState::Idle);

        // The first request completes before any register is touched again.
        let events = &bridge.registers().events;
        assert_eq!(events.len(), 12);
        assert_eq!(events[1], Event::Write(Register::SrcAddr, a_ptr));
        assert_eq!(events[4], Event::Write(Register::Command, CMD_START));
        assert_eq!(events[5], Event::BarrierAfter);
        assert_eq!(events[6], Event::BarrierBefore);
        assert_eq!(events[7], Event::Write(Register::SrcAddr, c_ptr));
        assert_eq!(events[11], Event::BarrierAfter);
    }

    #[test]
    fn busy_device_is_not_reprogrammed() {
        let mut device = MockDevice::stalled();
        device.regs[0] = CMD_START;
        let mut bridge = AcceleratorBridge::new(device);
        let mut a = [1u64];
        let mut b = [0u64];
        assert_eq!(
            unsafe { bridge.try_sort(&mut a, &mut b, 1, 4) },
            Err(SortError::DeviceBusy)
        );
        assert!(bridge.registers().events.is_empty());
    }

    #[test]
    fn capacity_checked_before_programming() {
        let mut a = [1u64, 2, 3];
        let mut b = [0u64; 2];
        let mut bridge = AcceleratorBridge::new(MockDevice::new(0));
        assert_eq!(
            unsafe { bridge.try_sort(&mut a, &mut b, 3, 4) },
            Err(SortError::CapacityTooSmall {
                required: 3,
                available: 2
            })
        );
        assert!(bridge.registers().events.is_empty());
    }

    #[test]
    fn wait_idle_without_request_is_a_no_op() {
        let mut bridge = AcceleratorBridge::new(MockDevice::new(0));
        assert_eq!(bridge.wait_idle(3), Ok(0));
        assert_eq!(bridge.registers().status_reads, 0);
    }

    #[test]
    fn mmio_registers_use_word_offsets() {
        let mut block = [0u64; 4];
        let mut regs = unsafe { MmioRegisters::new(block.as_mut_ptr() as usize) };
        regs.write_register(Register::Count, 3000);
        regs.write_register(Register::SrcAddr, 0x8000_1000);
        assert_eq!(regs.read_register(Register::Count), 3000);
        assert_eq!(regs.read_register(Register::Command), CMD_IDLE);
        assert_eq!(block, [0, 0x8000_1000, 0, 3000]);
    }

    #[test]
    #[should_panic]
    fn sort_rejects_short_buffers() {
        let mut a = [1u64, 2];
        let mut b = [0u64; 1];
        AcceleratorBridge::new(MockDevice::new(0)).sort(&mut a, &mut b, 2);
    }
}
