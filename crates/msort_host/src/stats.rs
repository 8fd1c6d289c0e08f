//! Sort timing statistics.
//!
//! Collects per-run durations for repeated sorts and prints a summary with a
//! coarse histogram, so software and accelerated runs can be compared at a
//! glance.

/// Number of histogram buckets; the last one collects everything above.
const BUCKETS: usize = 20;

/// Tracks sort durations with minimal overhead.
///
/// Accumulates measurements and computes min, max, average and a histogram
/// with fixed-width buckets chosen at construction.
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
    pub bucket_ns: u64,
    pub buckets: [u64; BUCKETS],
}

impl LatencyStats {
    /// Creates an empty tracker with histogram buckets `bucket_ns` wide.
    pub fn new(bucket_ns: u64) -> Self {
        Self {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
            bucket_ns: bucket_ns.max(1),
            buckets: [0; BUCKETS],
        }
    }

    /// Records one duration in nanoseconds.
    pub fn update(&mut self, nanos: u64) {
        self.min = self.min.min(nanos);
        self.max = self.max.max(nanos);
        self.sum = self.sum.saturating_add(nanos);
        self.count += 1;

        let idx = (nanos / self.bucket_ns).min(BUCKETS as u64 - 1) as usize;
        self.buckets[idx] += 1;
    }

    /// Average duration, or 0.0 if nothing was recorded.
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Prints the summary and the non-empty histogram buckets.
    ///
    /// Durations below one microsecond on average are shown in nanoseconds,
    /// everything else in microseconds.
    pub fn print_report(&self, title: &str) {
        println!("\n{} ({} runs)", title, self.count);
        if self.count == 0 {
            return;
        }

        let avg_ns = self.avg();
        if avg_ns < 1000.0 {
            println!("Min:   {:.2} ns", self.min as f64);
            println!("Avg:   {:.2} ns", avg_ns);
            println!("Max:   {:.2} ns", self.max as f64);
        } else {
            println!("Min:   {:.2} us", self.min as f64 / 1000.0);
            println!("Avg:   {:.2} us", avg_ns / 1000.0);
            println!("Max:   {:.2} us", self.max as f64 / 1000.0);
        }

        let width_us = self.bucket_ns as f64 / 1000.0;
        println!("Distribution ({:.1}us buckets):", width_us);
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let open = if i == BUCKETS - 1 { ">" } else { "" };
                let lower = i as f64 * width_us;
                let upper = (i + 1) as f64 * width_us;
                println!("[{:8.1}-{:8.1}{} us]: {}", lower, upper, open, count);
            }
        }
    }
}
