//! Driver instance for the on-chip merge-sort accelerator.
//!
//! The accelerator's register block is a singleton with no request queue, so
//! the firmware owns exactly one [`AcceleratorBridge`] for it and keeps that
//! bridge behind a spinlock. The lock is held from the first register write
//! until completion has been observed.

use crate::smp::SpinLock;
use msort_common::mmio::ACCEL_BASE;
use msort_core::{AcceleratorBridge, MmioRegisters};

/// The system's only handle to the accelerator registers.
// SAFETY: ACCEL_BASE is the accelerator's register block on this SoC and no
// other `MmioRegisters` is created for it.
static ACCELERATOR: SpinLock<AcceleratorBridge<MmioRegisters>> =
    SpinLock::new(AcceleratorBridge::new(unsafe { MmioRegisters::new(ACCEL_BASE) }));

/// Sorts `primary[..n]` on the accelerator and blocks until it is done.
///
/// Serializes against every other user of the accelerator. There is no
/// timeout: a device that never completes hangs the calling hart.
pub fn sort(primary: &mut [u64], scratch: &mut [u64], n: usize) {
    ACCELERATOR.lock().sort(primary, scratch, n);
}
