use super::model::AxisRange;

// ---------------------------------------------------------------------------
// Element-wise filters on numeric columns
// ---------------------------------------------------------------------------

/// Drop every value equal to exactly zero.
///
/// Histograms are unpaired distributions, so each array is filtered on its
/// own: removing a zero from one series never removes the same index from
/// another.
pub fn without_zeros(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|&v| v != 0.0).collect()
}

/// Indices of `x` whose value lies inside `window` (bounds inclusive).
pub fn indices_in_window(x: &[f64], window: &AxisRange) -> Vec<usize> {
    x.iter()
        .enumerate()
        .filter(|(_, &v)| window.contains(v))
        .map(|(i, _)| i)
        .collect()
}

/// Gather `values` at `indices`. Out-of-range indices are skipped.
pub fn take(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().filter_map(|&i| values.get(i).copied()).collect()
}

// ---------------------------------------------------------------------------
// Histogram binning
// ---------------------------------------------------------------------------

/// One histogram bar: `[start, end)`, except the last bin which also holds
/// its right edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Count `values` into `n_bins` equal-width bins spanning `range`.
///
/// Several series binned against the same `range` overlay cleanly. Values
/// outside `range` and non-finite values are ignored.
pub fn bin_counts(values: &[f64], range: &AxisRange, n_bins: usize) -> Vec<Bin> {
    if n_bins == 0 {
        return Vec::new();
    }
    let range = if range.span() > 0.0 {
        *range
    } else {
        range.padded(0.0)
    };
    let width = range.span() / n_bins as f64;

    let mut bins: Vec<Bin> = (0..n_bins)
        .map(|i| {
            let start = range.min + i as f64 * width;
            Bin {
                start,
                end: start + width,
                count: 0,
            }
        })
        .collect();

    for &v in values {
        if !v.is_finite() || !range.contains(v) {
            continue;
        }
        let idx = (((v - range.min) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_filter_is_per_array() {
        let y1 = [0.0, 1.0, 0.0, 2.0, 3.0];
        let y2 = [5.0, 0.0, 6.0, 7.0, 8.0];
        assert_eq!(without_zeros(&y1), vec![1.0, 2.0, 3.0]);
        assert_eq!(without_zeros(&y2), vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn negative_zero_counts_as_zero() {
        assert_eq!(without_zeros(&[-0.0, 0.5]), vec![0.5]);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let idx = indices_in_window(&x, &AxisRange::new(2.0, 4.0));
        assert_eq!(idx, vec![1, 2, 3]);
        assert_eq!(take(&[10.0, 20.0, 30.0, 40.0, 50.0], &idx), vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn bins_cover_range_and_keep_right_edge() {
        let bins = bin_counts(&[0.0, 0.5, 0.9, 2.0, 4.0], &AxisRange::new(0.0, 4.0), 4);
        assert_eq!(bins.len(), 4);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 0, 1, 1]);
        assert_eq!(bins[0].center(), 0.5);
        assert_eq!(bins[3].end, 4.0);
    }

    #[test]
    fn degenerate_range_still_bins() {
        let bins = bin_counts(&[2.0, 2.0], &AxisRange::new(2.0, 2.0), 2);
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 2);
    }
}
