//! Cycle counter abstraction.

/// Source of a monotonic tick count.
///
/// Implementations must not fail and must not have side effects visible to
/// the sort. The unit is implementation-defined (CPU cycles on the firmware,
/// nanoseconds on the host).
pub trait CycleCounter {
    /// Returns the current tick count.
    fn read_counter(&self) -> u64;
}

impl<C: CycleCounter + ?Sized> CycleCounter for &C {
    fn read_counter(&self) -> u64 {
        (**self).read_counter()
    }
}

/// Runs `f`, returning its result and the ticks elapsed around it.
///
/// Reads the counter once before and once after. The difference wraps so a
/// counter rollover between the two readings still yields the right delta.
pub fn measure<C: CycleCounter, R>(counter: &C, f: impl FnOnce() -> R) -> (R, u64) {
    let start = counter.read_counter();
    let result = f();
    let end = counter.read_counter();
    (result, end.wrapping_sub(start))
}
