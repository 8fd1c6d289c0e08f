//! On-target sort harness.
//!
//! Loads the descending reference workload into the primary buffer, sorts it
//! with the selected path while counting cycles, and checks the result. A
//! failed check is reported on the console and does not stop later runs.

use crate::console::println;
use crate::drivers::counter::McycleCounter;
use core::cell::UnsafeCell;
use msort_core::counter::measure;
use msort_core::software_sort;
use msort_core::verify::{DUMP_LIMIT, Fingerprint, fill_descending, violations};

/// Capacity of each sort buffer in words.
pub const CAPACITY: usize = 4096;

/// Number of words sorted per run.
pub const N: usize = 3000;

const _: () = assert!(N <= CAPACITY);

/// Which implementation a run uses.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SortPath {
    Software,
    #[cfg(feature = "use_fpga_mmio")]
    Accelerated,
}

struct Buffers {
    primary: [u64; CAPACITY],
    scratch: [u64; CAPACITY],
}

struct GlobalCell<T>(UnsafeCell<T>);
unsafe impl<T> Sync for GlobalCell<T> {}

impl<T> GlobalCell<T> {
    const fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }

    /// # Safety
    ///
    /// The caller must be the only user of the cell for the lifetime of the
    /// returned reference.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self) -> &mut T {
        unsafe { &mut *self.0.get() }
    }
}

// The accelerator reads and writes these by physical address, so they live
// in static RAM rather than on the stack.
static BUFFERS: GlobalCell<Buffers> = GlobalCell::new(Buffers {
    primary: [0; CAPACITY],
    scratch: [0; CAPACITY],
});

fn dump_array(a: &[u64], title: &str) {
    println!("{}", title);
    for (j, v) in a.iter().enumerate() {
        println!("{}: {}", j, v);
    }
}

/// Runs one sort of the reference workload and verifies it.
///
/// # Returns
///
/// True when the result is sorted and holds the same words as the input.
pub fn run(path: SortPath) -> bool {
    // SAFETY: only hart 0 runs the harness, one run at a time.
    let Buffers { primary, scratch } = unsafe { BUFFERS.get_mut() };

    fill_descending(primary, N);
    let before = Fingerprint::of(primary, N);

    if N < DUMP_LIMIT {
        dump_array(&primary[..N], "Unsorted array");
    }

    let ((), cycles) = measure(&McycleCounter, || match path {
        SortPath::Software => software_sort(&mut primary[..], &mut scratch[..], N),
        #[cfg(feature = "use_fpga_mmio")]
        SortPath::Accelerated => {
            crate::drivers::accelerator::sort(&mut primary[..], &mut scratch[..], N)
        }
    });

    if N < DUMP_LIMIT {
        dump_array(&primary[..N], "Sorted array");
    }

    let mut sorted = true;
    for v in violations(primary, N) {
        println!("ERROR: adjacent elements not in sorted order");
        println!(
            "    A [{}] = {}    A [{}] = {}",
            v.index,
            v.left,
            v.index + 1,
            v.right
        );
        sorted = false;
    }
    if Fingerprint::of(primary, N) != before {
        println!("ERROR: sorted output is not a permutation of the input");
        sorted = false;
    }
    if sorted {
        println!("Verified {} words sorted", N);
    }

    println!("    Sorting took {:8} cycles", cycles);
    sorted
}
