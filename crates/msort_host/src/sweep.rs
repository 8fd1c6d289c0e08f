use crate::generator::xorshift;
use anyhow::{Result, bail};
use msort_core::verify::is_sorted;
use msort_core::{AcceleratorBridge, software_sort};
use msort_hw::{DeviceConfig, SortAccelModel};
use rayon::prelude::*;
use std::sync::Mutex;
use std::time::Instant;

/// Sizes checked by a sweep up to `max_n`: every size below 64, then powers
/// of two and their neighbours, then `max_n` itself.
pub fn sweep_sizes(max_n: usize) -> Vec<usize> {
    let mut sizes: Vec<usize> = (0..=max_n.min(63)).collect();
    let mut p = 64;
    while p <= max_n {
        sizes.extend([p - 1, p, p + 1].into_iter().filter(|&s| s <= max_n));
        p *= 2;
    }
    sizes.push(max_n);
    sizes.sort_unstable();
    sizes.dedup();
    sizes
}

/// Checks software/accelerated equivalence over many sizes and inputs.
///
/// Software sorts run in parallel across the rayon pool. The accelerator
/// model is a single device, so its bridge sits behind a mutex held for the
/// whole request.
pub fn run_sweep(max_n: usize, trials: usize, seed: u64) -> Result<()> {
    let sizes = sweep_sizes(max_n);
    println!(
        "Sweeping {} sizes up to {} ({} trials each)...",
        sizes.len(),
        max_n,
        trials
    );

    // SAFETY: only driven through `AcceleratorBridge::sort` below.
    let model = unsafe { SortAccelModel::spawn(DeviceConfig::default()) };
    if !model.is_running() {
        bail!("Failed to start the accelerator model thread");
    }
    let bridge = Mutex::new(AcceleratorBridge::new(model.registers()));

    let cases: Vec<(usize, usize)> = sizes
        .iter()
        .flat_map(|&n| (0..trials).map(move |t| (n, t)))
        .collect();

    let start = Instant::now();
    let mismatches: Vec<(usize, usize)> = cases
        .par_iter()
        .filter(|&&(n, trial)| {
            let mut rng = xorshift(seed ^ ((n as u64) << 20) ^ trial as u64);
            // Narrow value range on odd trials so duplicate keys occur.
            let modulus = if trial % 2 == 1 { (n as u64 / 4).max(1) } else { u64::MAX };
            let input: Vec<u64> = (0..n).map(|_| rng() % modulus).collect();

            let mut sw = input.clone();
            let mut sw_scratch = vec![0u64; n];
            software_sort(&mut sw, &mut sw_scratch, n);

            let mut hw = input;
            let mut hw_scratch = vec![0u64; n];
            match bridge.lock() {
                Ok(mut guard) => guard.sort(&mut hw, &mut hw_scratch, n),
                Err(_) => return true,
            }

            sw != hw || !is_sorted(&sw, n)
        })
        .copied()
        .collect();

    let seconds = start.elapsed().as_secs_f64();
    println!("Results");
    println!("Time: {:.4} s", seconds);
    println!(
        "Checked: {}/{} cases equivalent",
        cases.len() - mismatches.len(),
        cases.len()
    );
    println!("Device requests: {}", model.completed());

    if !mismatches.is_empty() {
        for (n, trial) in mismatches.iter().take(10) {
            println!("ERROR: mismatch at n = {} (trial {})", n, trial);
        }
        bail!("{} of {} cases differ", mismatches.len(), cases.len());
    }
    Ok(())
}
