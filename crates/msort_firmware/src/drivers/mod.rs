//! Hardware driver modules for firmware peripherals.
//!
//! Each driver wraps a memory-mapped device behind the portable interfaces
//! from `msort_core`, so the harness code is the same on every platform.

#[cfg(feature = "use_fpga_mmio")]
pub mod accelerator;
pub mod counter;
