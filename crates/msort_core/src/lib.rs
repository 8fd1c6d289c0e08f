//! Core merge-sort algorithms and the accelerator driver.
//!
//! This crate provides the software bottom-up merge sort over `u64` words and
//! a driver that runs the same sort on a memory-mapped accelerator. Both paths
//! leave the sorted data in the caller's primary buffer and must agree bit
//! for bit. All modules are `no_std` so they can be used from bare-metal
//! firmware as well as from host-side tools and the accelerator model.

#![no_std]

use core::fmt;

/// Accelerator driver speaking the four-register MMIO protocol.
///
/// Programs the source address, scratch address and element count, triggers
/// the device, and busy-polls the command word until the device reports
/// completion. Register access goes through the [`accel::RegisterBlock`]
/// capability so tests and simulations can substitute their own device.
pub mod accel;

/// Monotonic cycle counter abstraction used to time a sort.
///
/// The firmware backs it with the `mcycle` CSR and the host with a
/// wall-clock timer. The core only ever takes differences of two readings.
pub mod counter;

/// Merge engine: merges two adjacent sorted runs into a destination buffer.
///
/// Handles ragged and missing right runs through clipped cursor limits, so
/// the orchestrator never has to special-case the tail of the array.
pub mod merge;

/// Bottom-up merge sort orchestrator.
///
/// Doubles the run span each pass and ping-pongs between the primary and
/// scratch buffers, copying the result back into the primary buffer when
/// the final pass leaves it in scratch.
pub mod sort;

/// Verification helpers shared by the firmware and host harnesses.
///
/// Workload generation, adjacent-pair order checks and an allocation-free
/// multiset fingerprint for confirming that a sort preserved its input.
pub mod verify;

pub use accel::{AcceleratorBridge, BridgeState, MmioRegisters, RegisterBlock, accelerated_sort};
pub use sort::merge_sort as software_sort;

/// Error types returned by the checked accelerator entry points.
///
/// The infallible sort paths never produce these: a caller-contract
/// violation panics and an unresponsive device blocks forever. The checked
/// variants exist for callers that need a reported fault instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortError {
    /// A buffer is shorter than the requested element count.
    ///
    /// The accelerator writes host memory directly, so this is rejected
    /// before any register is programmed.
    CapacityTooSmall {
        /// Number of elements requested.
        required: usize,
        /// Length of the shorter of the two buffers.
        available: usize,
    },

    /// The command register was non-zero when a new request was about to
    /// be programmed.
    ///
    /// Either a previous request timed out and is still running, or another
    /// owner of the register block started a sort. Reprogramming the
    /// registers now would overwrite fields the device is still consuming.
    DeviceBusy,

    /// The device did not clear the command register within the poll budget.
    ///
    /// The request is still outstanding and the device may continue to write
    /// the buffers. The bridge stays in [`BridgeState::Running`] until a
    /// later [`AcceleratorBridge::wait_idle`] or [`AcceleratorBridge::sort`]
    /// observes completion.
    Timeout {
        /// Number of status reads performed before giving up.
        polls: u32,
    },
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::CapacityTooSmall {
                required,
                available,
            } => write!(
                f,
                "buffer holds {} words but {} were requested",
                available, required
            ),
            SortError::DeviceBusy => write!(f, "accelerator is busy with another request"),
            SortError::Timeout { polls } => {
                write!(f, "accelerator did not complete after {} polls", polls)
            }
        }
    }
}

impl core::error::Error for SortError {}
