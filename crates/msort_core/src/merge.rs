//! Merge engine for the bottom-up merge sort.

/// Merges `src[i0 .. i0+span)` and `src[i0+span .. i0+2*span)` into
/// `dst[i0 .. min(i0+2*span, n))`.
///
/// Both runs are clipped to `n`, so a short or missing right run at the tail
/// of the array needs no special handling: its cursor simply starts at (or
/// past) its limit. The left element is taken only when it is strictly less
/// than the right one, so equal keys are emitted from the right run first.
/// The accelerator RTL uses the same comparison and the two paths must agree.
///
/// # Arguments
///
/// * `src` - Buffer holding the two sorted runs
/// * `dst` - Destination buffer, distinct from `src`
/// * `i0` - Start offset of the left run, must be below `n`
/// * `span` - Nominal run length, at least 1
/// * `n` - Logical array length
///
/// # Panics
///
/// Panics if either buffer is shorter than `min(i0 + 2*span, n)`.
#[inline]
pub fn merge_runs(src: &[u64], dst: &mut [u64], i0: usize, span: usize, n: usize) {
    let mut left = i0;
    let mut right = i0.saturating_add(span);
    let left_lim = right.min(n);
    let right_lim = right.saturating_add(span).min(n);
    let mut out = i0;

    loop {
        if left < left_lim && right < right_lim {
            if src[left] < src[right] {
                dst[out] = src[left];
                left += 1;
            } else {
                dst[out] = src[right];
                right += 1;
            }
        } else if left < left_lim {
            dst[out] = src[left];
            left += 1;
        } else if right < right_lim {
            dst[out] = src[right];
            right += 1;
        } else {
            break;
        }
        out += 1;
    }
}

/// Runs one merge pass of width `span` over `src[..n]` into `dst[..n]`.
///
/// Merges every adjacent run pair starting at `0, 2*span, 4*span, ...`.
/// After the pass `dst[..n]` consists of sorted runs of length `2*span`
/// (the last one possibly shorter).
pub fn merge_pass(src: &[u64], dst: &mut [u64], span: usize, n: usize) {
    let stride = span.saturating_mul(2);
    let mut i0 = 0;
    while i0 < n {
        merge_runs(src, dst, i0, span, n);
        i0 = i0.saturating_add(stride);
    }
}
