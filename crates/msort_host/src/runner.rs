//! Single-workload sort runs with verification and timing.
//!
//! Mirrors the firmware harness on the host: load the array, dump it when
//! small, time the sort, dump the result, and check it element by element.
//! The accelerated path runs the production driver against the device
//! model from `msort_hw`.

use crate::generator::{Order, workload};
use crate::stats::LatencyStats;
use anyhow::{Result, bail};
use clap::ValueEnum;
use msort_core::counter::{CycleCounter, measure};
use msort_core::verify::{DUMP_LIMIT, Fingerprint, violations};
use msort_core::{AcceleratorBridge, software_sort};
use msort_hw::{DeviceBehavior, DeviceConfig, ModelRegisters, SortAccelModel};
use msort_io::loader;
use std::time::{Duration, Instant};

/// Which sort implementation(s) a run exercises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortPath {
    Software,
    Accelerated,
    Both,
}

impl SortPath {
    fn runs_software(self) -> bool {
        self != SortPath::Accelerated
    }

    fn runs_accelerated(self) -> bool {
        self != SortPath::Software
    }
}

pub struct RunConfig {
    pub input: Option<String>,
    pub n: usize,
    pub order: Order,
    pub seed: u64,
    pub path: SortPath,
    pub repeat: usize,
    pub latency_us: u64,
}

/// Nanosecond tick source backed by a monotonic wall clock.
pub struct InstantCounter {
    origin: Instant,
}

impl InstantCounter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl CycleCounter for InstantCounter {
    fn read_counter(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Result of running one path over the workload.
struct PathReport {
    output: Vec<u64>,
    failed_runs: usize,
}

/// Runs the configured paths over one workload.
///
/// Verification failures are reported as they are found and do not stop the
/// remaining runs; the command fails at the end if any check failed.
pub fn run(cfg: &RunConfig) -> Result<()> {
    let input = match &cfg.input {
        Some(path) => {
            println!("Loading words from {}...", path);
            loader::load_words(path)?
        }
        None => workload(cfg.n, cfg.order, cfg.seed),
    };
    let repeat = cfg.repeat.max(1);
    let counter = InstantCounter::new();
    let mut failures = 0;

    let software = if cfg.path.runs_software() {
        println!("Running software mergesort");
        let report = run_path(None, &input, repeat, &counter);
        println!("Done");
        failures += report.failed_runs;
        Some(report.output)
    } else {
        None
    };

    let accelerated = if cfg.path.runs_accelerated() {
        // SAFETY: the model is only driven through `AcceleratorBridge::sort`,
        // which keeps both buffers borrowed until the device reports done.
        let model = unsafe {
            SortAccelModel::spawn(DeviceConfig {
                behavior: DeviceBehavior::Normal,
                latency: Duration::from_micros(cfg.latency_us),
            })
        };
        if !model.is_running() {
            bail!("Failed to start the accelerator model thread");
        }
        let mut bridge = AcceleratorBridge::new(model.registers());

        println!("Running hardware-accelerated mergesort");
        let report = run_path(Some(&mut bridge), &input, repeat, &counter);
        println!("Done");
        failures += report.failed_runs;
        Some(report.output)
    } else {
        None
    };

    if let (Some(sw), Some(hw)) = (&software, &accelerated) {
        if sw == hw {
            println!("Software and accelerated outputs match");
        } else {
            let first = sw.iter().zip(hw.iter()).position(|(a, b)| a != b);
            println!(
                "ERROR: software and accelerated outputs differ (first at index {:?})",
                first
            );
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} verification check(s) failed", failures);
    }
    Ok(())
}

fn dump_array(a: &[u64], title: &str) {
    println!("{}", title);
    for (j, v) in a.iter().enumerate() {
        println!("{}: {}", j, v);
    }
}

fn run_path(
    mut bridge: Option<&mut AcceleratorBridge<ModelRegisters>>,
    input: &[u64],
    repeat: usize,
    counter: &InstantCounter,
) -> PathReport {
    let n = input.len();
    let expected = Fingerprint::of(input, n);
    let mut a = vec![0u64; n];
    let mut b = vec![0u64; n];
    let mut stats = LatencyStats::new(10_000);
    let mut failed_runs = 0;

    for rep in 0..repeat {
        a.copy_from_slice(input);
        b.fill(0);

        if rep == 0 && n < DUMP_LIMIT {
            dump_array(&a, "Unsorted array");
        }

        let ((), elapsed) = measure(counter, || match bridge.as_mut() {
            Some(bridge) => bridge.sort(&mut a, &mut b, n),
            None => software_sort(&mut a, &mut b, n),
        });
        stats.update(elapsed);

        let last = rep + 1 == repeat;
        if last && n < DUMP_LIMIT {
            dump_array(&a, "Sorted array");
        }

        let mut sorted = true;
        for v in violations(&a, n) {
            if failed_runs == 0 {
                println!("ERROR: adjacent elements not in sorted order");
                println!(
                    "    A [{}] = {}    A [{}] = {}",
                    v.index,
                    v.left,
                    v.index + 1,
                    v.right
                );
            }
            sorted = false;
        }
        if Fingerprint::of(&a, n) != expected {
            println!("ERROR: sorted output is not a permutation of the input");
            sorted = false;
        }

        if !sorted {
            failed_runs += 1;
        } else if last && failed_runs == 0 {
            println!("Verified {} words sorted", n);
        }
        if repeat == 1 {
            println!("    Sorting took {:8} ns", elapsed);
        }
    }

    if repeat > 1 {
        stats.print_report("Sort time");
    }

    PathReport {
        output: a,
        failed_runs,
    }
}
