//! Harness helpers: workload generation and result checks.

/// Arrays shorter than this are dumped element by element by the harnesses.
pub const DUMP_LIMIT: usize = 32;

/// Fills `buf[..n]` with `n-1, n-2, ..., 0`, the reference workload.
pub fn fill_descending(buf: &mut [u64], n: usize) {
    for (j, slot) in buf[..n].iter_mut().enumerate() {
        *slot = (n - 1 - j) as u64;
    }
}

/// An adjacent pair found out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    /// Index of the left element of the pair.
    pub index: usize,
    pub left: u64,
    pub right: u64,
}

/// Iterates over every adjacent pair in `buf[..n]` with `buf[j] > buf[j+1]`.
pub fn violations(buf: &[u64], n: usize) -> impl Iterator<Item = Violation> + '_ {
    buf[..n]
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] > w[1])
        .map(|(index, w)| Violation {
            index,
            left: w[0],
            right: w[1],
        })
}

/// Returns true when `buf[..n]` is in non-decreasing order.
pub fn is_sorted(buf: &[u64], n: usize) -> bool {
    violations(buf, n).next().is_none()
}

/// Order-independent digest of a multiset of words.
///
/// Two arrays holding the same multiset always produce equal fingerprints.
/// The converse is only probabilistic, which is enough to catch a sort that
/// dropped or duplicated elements without allocating a reference copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fingerprint {
    pub len: usize,
    pub sum: u64,
    pub xor: u64,
    pub sum_sq: u64,
}

impl Fingerprint {
    /// Computes the fingerprint of `buf[..n]`.
    pub fn of(buf: &[u64], n: usize) -> Self {
        buf[..n].iter().fold(
            Self {
                len: n,
                ..Self::default()
            },
            |acc, &v| Self {
                len: acc.len,
                sum: acc.sum.wrapping_add(v),
                xor: acc.xor ^ v,
                sum_sq: acc.sum_sq.wrapping_add(v.wrapping_mul(v)),
            },
        )
    }
}
