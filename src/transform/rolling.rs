//! Trailing rolling means over row order.

/// Trailing mean over the last `window` positions, ignoring missing values.
///
/// Position `i` averages the present values in `max(0, i + 1 - window)..=i`.
/// A window with no present values yields `None`. The sequence is taken in
/// the order given; nothing is sorted.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let (sum, n) = values[start..=i]
            .iter()
            .flatten()
            .fold((0.0_f64, 0usize), |(s, n), v| (s + v, n + 1));
        out.push(if n == 0 { None } else { Some(sum / n as f64) });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-12)
    }

    #[test]
    fn window_boundaries() {
        let values: Vec<Option<f64>> = (0..12).map(|i| Some(i as f64)).collect();
        let out = rolling_mean(&values, 7);

        assert_eq!(out.len(), values.len());
        assert!(close(out[0], 0.0));
        // mean(0..=6)
        assert!(close(out[6], 3.0));
        // mean(4..=10)
        assert!(close(out[10], 7.0));
    }

    #[test]
    fn missing_values_shrink_the_denominator() {
        let values = vec![Some(2.0), None, Some(4.0), None];
        let out = rolling_mean(&values, 7);
        assert!(close(out[0], 2.0));
        assert!(close(out[1], 2.0));
        assert!(close(out[2], 3.0));
        assert!(close(out[3], 3.0));
    }

    #[test]
    fn all_missing_window_is_none() {
        let values = vec![None, None, Some(1.0)];
        let out = rolling_mean(&values, 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!(close(out[2], 1.0));
    }

    #[test]
    fn zero_window_behaves_like_one() {
        let values = vec![Some(1.0), Some(5.0)];
        assert_eq!(rolling_mean(&values, 0), values);
    }
}
