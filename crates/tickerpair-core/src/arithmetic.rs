//! Guarded arithmetic shared by the metric derivation.
//!
//! `None` is the "unavailable" marker everywhere in this crate. These helpers
//! never panic and never produce NaN or infinite values.

/// A statement lookup result: one cell, or several cells sharing a fiscal-year label.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for CellValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Series(values)
    }
}

impl From<&[f64]> for CellValue {
    fn from(values: &[f64]) -> Self {
        Self::Series(values.to_vec())
    }
}

/// Collapse a cell to one number.
///
/// A one-element series unwraps to its element, a longer series is summed
/// (an empty one sums to zero), and a scalar passes through unchanged.
pub fn to_scalar(value: impl Into<CellValue>) -> f64 {
    match value.into() {
        CellValue::Scalar(value) => value,
        CellValue::Series(values) => match values.as_slice() {
            [single] => *single,
            many => many.iter().sum(),
        },
    }
}

/// `numerator / denominator`, or `None` when either side is unavailable,
/// the denominator is zero, or the quotient is not finite.
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    if denominator == 0.0 {
        return None;
    }
    let quotient = numerator / denominator;
    quotient.is_finite().then_some(quotient)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_unavailable() {
        assert_eq!(safe_divide(Some(42.0), Some(0.0)), None);
        assert_eq!(safe_divide(Some(-1.0), Some(-0.0)), None);
        assert_eq!(safe_divide(Some(0.0), Some(0.0)), None);
    }

    #[test]
    fn missing_operands_are_unavailable() {
        assert_eq!(safe_divide(None, Some(3.0)), None);
        assert_eq!(safe_divide(Some(3.0), None), None);
        assert_eq!(safe_divide(None, None), None);
    }

    #[test]
    fn non_finite_quotients_are_unavailable() {
        assert_eq!(safe_divide(Some(f64::NAN), Some(2.0)), None);
        assert_eq!(safe_divide(Some(1.0), Some(f64::NAN)), None);
        assert_eq!(safe_divide(Some(f64::MAX), Some(f64::MIN_POSITIVE)), None);
    }

    #[test]
    fn ordinary_division_passes_through() {
        assert_eq!(safe_divide(Some(9.0), Some(3.0)), Some(3.0));
        assert_eq!(safe_divide(Some(0.0), Some(5.0)), Some(0.0));
    }

    #[test]
    fn scalar_coercion() {
        assert_eq!(to_scalar(vec![5.0]), 5.0);
        assert_eq!(to_scalar(vec![2.0, 3.0, 4.0]), 9.0);
        assert_eq!(to_scalar(7.0), 7.0);
        assert_eq!(to_scalar(Vec::<f64>::new()), 0.0);
        assert_eq!(to_scalar(&[1.5, 2.5][..]), 4.0);
    }
}
