use std::ops::Range;

/// Amount of workers to use for `points` samples. Never more than `available`, never fewer
/// than one, and every worker gets at least `min_points_per_worker` samples when there are
/// enough of them.
pub(crate) fn worker_count(available: usize, points: usize, min_points_per_worker: usize) -> usize {
    available.min(points / min_points_per_worker).max(1)
}

/// Static, contiguous partition of `[0, points)` into `workers` segments.
/// All segments have `points / workers` entries, except the last one, which also takes the remainder.
pub(crate) fn segments(points: usize, workers: usize) -> impl Iterator<Item = Range<usize>> {
    debug_assert!(workers > 0);
    let segment_size = points / workers;
    (0..workers).map(move |w| {
        let start = w * segment_size;
        let end = if w == workers - 1 { points } else { start + segment_size };
        start..end
    })
}

#[cfg(test)]
macro_rules! assert_approx_eq {
	($left: expr, $right: expr, $tol: expr) => ({
		match ($left, $right, $tol) {
			(left_val , right_val, tol_val) => {
				let delta = (left_val - right_val).abs();
				if !(delta < tol_val) {
					panic!(
						"assertion failed: `(left ≈ right)` \
						(left: `{}`, right: `{}`) \
						with ∆={:1.1e} (allowed ∆={:e})",
						left_val , right_val, delta, tol_val
					)
				}
			}
		}
	});
	($left: expr, $right: expr) => (assert_approx_eq!(($left), ($right), 1e-15))
}
