use crate::error::EmptyInputError;

// ---------------------------------------------------------------------------
// Five-number summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (divides by `n`, not `n - 1`).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Result of summarizing one column: either numbers or the explicit
/// "nothing left to summarize" sentinel shown as "no data in range".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatsOutcome {
    Summary(SummaryStats),
    EmptyRange,
}

impl StatsOutcome {
    pub fn summary(&self) -> Option<&SummaryStats> {
        match self {
            StatsOutcome::Summary(s) => Some(s),
            StatsOutcome::EmptyRange => None,
        }
    }
}

/// Compute mean, median, population std-dev, min and max.
pub fn compute(values: &[f64]) -> Result<SummaryStats, EmptyInputError> {
    if values.is_empty() {
        return Err(EmptyInputError);
    }
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Ok(SummaryStats {
        mean,
        median,
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        count: values.len(),
    })
}

/// [`compute`], with empty input mapped to [`StatsOutcome::EmptyRange`].
pub fn summarize(values: &[f64]) -> StatsOutcome {
    match compute(values) {
        Ok(stats) => StatsOutcome::Summary(stats),
        Err(EmptyInputError) => StatsOutcome::EmptyRange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_to_five() {
        let s = compute(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert!((s.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.count, 5);
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        let s = compute(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(compute(&[]), Err(EmptyInputError));
        assert_eq!(summarize(&[]), StatsOutcome::EmptyRange);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let s = compute(&[7.5]).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.median, 7.5);
    }
}
