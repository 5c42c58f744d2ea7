//! Small numeric helpers shared by the metrics modules

/// `numerator / denominator`, or 0 when the denominator is zero
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Proportion expressed as a percentage rounded to 2 decimals
///
/// Only for output structs; comparisons must use the unrounded proportion.
pub fn percent(proportion: f64) -> f64 {
    round2(proportion * 100.0)
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(15.0 / 110.0), 13.64);
        assert_eq!(percent(0.1), 10.0);
        assert_eq!(percent(1.0), 100.0);
    }

    #[test]
    fn test_round2_non_finite() {
        assert_eq!(round2(f64::NAN), 0.0);
        assert_eq!(round2(f64::INFINITY), 0.0);
        assert_eq!(round2(2.345678), 2.35);
    }
}
