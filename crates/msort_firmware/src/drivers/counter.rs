//! Cycle counter backed by the `mcycle` CSR.

use msort_core::counter::CycleCounter;

/// Reads the hart's machine cycle counter.
pub struct McycleCounter;

impl CycleCounter for McycleCounter {
    #[inline(always)]
    fn read_counter(&self) -> u64 {
        riscv::register::mcycle::read64()
    }
}
