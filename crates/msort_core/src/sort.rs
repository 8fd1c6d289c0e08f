//! Bottom-up merge sort over a primary and a scratch buffer.

use crate::merge::{merge_pass, merge_runs};

/// Identifies which of the two caller buffers holds the current runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
    /// The caller's canonical buffer, where the result must end up.
    Primary,
    /// The caller-supplied scratch buffer.
    Scratch,
}

impl Buffer {
    /// Returns the other buffer.
    #[inline(always)]
    pub fn other(self) -> Self {
        match self {
            Buffer::Primary => Buffer::Scratch,
            Buffer::Scratch => Buffer::Primary,
        }
    }
}

/// Number of merge passes needed to sort `n` elements.
///
/// Each pass doubles the run length starting from 1, so this is
/// `ceil(log2(n))`, and zero for `n <= 1`.
pub fn pass_count(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Buffer holding the data after all merge passes, before any copy-back.
pub fn result_buffer(n: usize) -> Buffer {
    if pass_count(n) % 2 == 0 {
        Buffer::Primary
    } else {
        Buffer::Scratch
    }
}

/// Sorts `primary[..n]` in non-decreasing order using `scratch` as workspace.
///
/// Starts from `n` runs of length one and merges adjacent runs back and forth
/// between the two buffers, doubling the span each pass until it reaches `n`.
/// If the last pass wrote into `scratch`, a final full-width merge (the whole
/// array as the left run, an empty right run) copies it back, so the sorted
/// data is always in `primary` on return. Only `[0, n)` of either buffer is
/// read or written.
///
/// # Arguments
///
/// * `primary` - Buffer to sort; holds the result on return
/// * `scratch` - Workspace with capacity of at least `n`
/// * `n` - Number of elements to sort
///
/// # Panics
///
/// Panics if either buffer is shorter than `n`.
pub fn merge_sort(primary: &mut [u64], scratch: &mut [u64], n: usize) {
    assert!(
        n <= primary.len() && n <= scratch.len(),
        "merge_sort: {} elements do not fit buffers of {} and {} words",
        n,
        primary.len(),
        scratch.len()
    );

    let mut reading = Buffer::Primary;
    let mut span = 1;

    while span < n {
        match reading {
            Buffer::Primary => merge_pass(primary, scratch, span, n),
            Buffer::Scratch => merge_pass(scratch, primary, span, n),
        }
        reading = reading.other();
        span *= 2;
    }

    if reading == Buffer::Scratch {
        merge_runs(scratch, primary, 0, n, n);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use std::vec;
    use std::vec::Vec;

    fn sorted_copy(input: &[u64]) -> Vec<u64> {
        let mut v = input.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn pass_count_is_ceil_log2() {
        assert_eq!(pass_count(0), 0);
        assert_eq!(pass_count(1), 0);
        assert_eq!(pass_count(2), 1);
        assert_eq!(pass_count(3), 2);
        assert_eq!(pass_count(4), 2);
        assert_eq!(pass_count(5), 3);
        assert_eq!(pass_count(6), 3);
        assert_eq!(pass_count(3000), 12);
        assert_eq!(pass_count(4096), 12);
        assert_eq!(pass_count(4097), 13);
    }

    #[test]
    fn empty_and_single_are_untouched() {
        let mut a: [u64; 0] = [];
        let mut b: [u64; 0] = [];
        merge_sort(&mut a, &mut b, 0);

        let mut a = [42u64];
        let mut b = [7u64];
        merge_sort(&mut a, &mut b, 1);
        assert_eq!(a, [42]);
        // No pass and no copy-back, so scratch is never written.
        assert_eq!(b, [7]);
    }

    #[test]
    fn two_elements_take_one_merge_and_copy_back() {
        assert_eq!(result_buffer(2), Buffer::Scratch);
        let mut a = [9u64, 3];
        let mut b = [0u64; 2];
        merge_sort(&mut a, &mut b, 2);
        assert_eq!(a, [3, 9]);
        assert_eq!(b, [3, 9]);
    }

    #[test]
    fn ragged_five() {
        let mut a = [4u64, 3, 2, 1, 0];
        let mut b = [0u64; 5];
        merge_sort(&mut a, &mut b, 5);
        assert_eq!(a, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn six_element_schedule() {
        let n = 6;
        let a = [5u64, 4, 3, 2, 1, 0];
        let mut b = [0u64; 6];
        let mut c = [0u64; 6];

        merge_pass(&a, &mut b, 1, n);
        assert_eq!(b, [4, 5, 2, 3, 0, 1]);
        merge_pass(&b, &mut c, 2, n);
        assert_eq!(c, [2, 3, 4, 5, 0, 1]);
        merge_pass(&c, &mut b, 4, n);
        assert_eq!(b, [0, 1, 2, 3, 4, 5]);

        // Three passes leave the data in scratch, so the copy-back must run.
        assert_eq!(result_buffer(n), Buffer::Scratch);
        let mut a = a;
        let mut scratch = [0u64; 6];
        merge_sort(&mut a, &mut scratch, n);
        assert_eq!(a, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn even_pass_count_ends_in_primary() {
        assert_eq!(result_buffer(4), Buffer::Primary);
        let mut a = [3u64, 1, 2, 0];
        let mut b = [0u64; 4];
        merge_sort(&mut a, &mut b, 4);
        assert_eq!(a, [0, 1, 2, 3]);
    }

    #[test]
    fn only_prefix_is_sorted() {
        let mut a = [5u64, 1, 4, 100, 0];
        let mut b = [77u64; 5];
        merge_sort(&mut a, &mut b, 3);
        assert_eq!(a, [1, 4, 5, 100, 0]);
        assert_eq!(&b[3..], &[77, 77]);
    }

    #[test]
    fn already_sorted_is_unchanged() {
        for n in [2usize, 3, 7, 16, 33] {
            let input: Vec<u64> = (0..n as u64).collect();
            let mut a = input.clone();
            let mut b = vec![0u64; n];
            merge_sort(&mut a, &mut b, n);
            assert_eq!(a, input);
        }
    }

    #[test]
    fn random_permutations_and_duplicates() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for n in 0..300usize {
            let mut input: Vec<u64> = (0..n as u64).map(|v| v % 17).collect();
            input.shuffle(&mut rng);
            let mut a = input.clone();
            let mut b = vec![0u64; n];
            merge_sort(&mut a, &mut b, n);
            assert_eq!(a, sorted_copy(&input), "n = {}", n);
        }
    }

    #[test]
    fn extremes_sort_correctly() {
        let input = [u64::MAX, 0, u64::MAX - 1, 1, u64::MAX, 0, 42];
        let mut a = input;
        let mut b = [0u64; 7];
        merge_sort(&mut a, &mut b, 7);
        assert_eq!(a.to_vec(), sorted_copy(&input));
    }

    #[test]
    #[should_panic]
    fn short_scratch_panics() {
        let mut a = [3u64, 2, 1];
        let mut b = [0u64; 2];
        merge_sort(&mut a, &mut b, 3);
    }
}
