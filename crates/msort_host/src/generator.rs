//! Workload generator for sort benchmarks.
//!
//! Produces the arrays both sort paths are run on: the descending reference
//! workload, already-sorted input, or a seeded pseudo-random permutation.
//! Workloads can be written to word-list files so firmware and host runs
//! share identical inputs.

use anyhow::Result;
use clap::ValueEnum;
use msort_core::verify::fill_descending;
use msort_io::loader;

/// Initial ordering of a generated workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Order {
    /// `n-1, n-2, ..., 0`, the reference workload.
    Descending,
    /// `0, 1, ..., n-1`, already sorted.
    Ascending,
    /// A seeded shuffle of `0..n`.
    Random,
}

/// Builds a workload of `n` distinct words in the requested order.
pub fn workload(n: usize, order: Order, seed: u64) -> Vec<u64> {
    let mut words = vec![0u64; n];
    match order {
        Order::Descending => fill_descending(&mut words, n),
        Order::Ascending => {
            for (j, w) in words.iter_mut().enumerate() {
                *w = j as u64;
            }
        }
        Order::Random => {
            for (j, w) in words.iter_mut().enumerate() {
                *w = j as u64;
            }
            let mut rng = xorshift(seed);
            for i in (1..n).rev() {
                let j = (rng() % (i as u64 + 1)) as usize;
                words.swap(i, j);
            }
        }
    }
    words
}

/// Seeded xorshift64* generator. A zero seed is remapped, since xorshift
/// never leaves the all-zero state.
pub fn xorshift(seed: u64) -> impl FnMut() -> u64 {
    let mut state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
    move || {
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        state.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

/// Generates a workload and writes it to `out_path`.
///
/// # Arguments
///
/// * `out_path` - Output path for the word-list file
/// * `n` - Number of words
/// * `order` - Initial ordering
/// * `seed` - Seed for [`Order::Random`]
pub fn generate_workload(out_path: &str, n: usize, order: Order, seed: u64) -> Result<()> {
    println!("Generating {} words ({:?}, seed={})...", n, order, seed);
    let words = workload(n, order, seed);
    loader::save_words(out_path, &words)?;
    println!("Wrote {}.", out_path);
    Ok(())
}
