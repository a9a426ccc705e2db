//! Summary statistics over small numeric sequences.

use serde::Serialize;

/// Mean, extremes, and median of a non-empty sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Summarize `values`, or `None` when there is nothing to summarize.
pub fn summarize(values: &[f64]) -> Option<SeriesStats> {
    Some(SeriesStats {
        average: mean(values)?,
        min: values.iter().copied().reduce(f64::min)?,
        max: values.iter().copied().reduce(f64::max)?,
        median: median(values)?,
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value of a sorted copy; the mean of the two middles for even
/// lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn summarize_cpu_polls() {
        let stats = summarize(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.average, 20.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.median, 20.0);
    }

    #[test]
    fn summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn median_does_not_reorder_input() {
        let values = [5.0, 1.0, 3.0];
        assert_eq!(median(&values), Some(3.0));
        assert_eq!(values, [5.0, 1.0, 3.0]);
    }
}
