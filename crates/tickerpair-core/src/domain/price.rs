use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// One daily close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: UtcDateTime,
    pub close: f64,
}

impl PricePoint {
    pub fn new(ts: UtcDateTime, close: f64) -> Result<Self, ValidationError> {
        if !close.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "close" });
        }
        Ok(Self { ts, close })
    }
}

/// Close prices of one ticker, ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|point| point.ts);
        Self { symbol, points }
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Close of the last observation, the "end of year" price for a one-year series.
    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|point| point.close)
    }

    pub fn first_close(&self) -> Option<f64> {
        self.points.first().map(|point| point.close)
    }

    pub fn min_close(&self) -> Option<f64> {
        self.points.iter().map(|point| point.close).reduce(f64::min)
    }

    pub fn max_close(&self) -> Option<f64> {
        self.points.iter().map(|point| point.close).reduce(f64::max)
    }

    /// Observations with `start <= ts < end`.
    pub fn between(&self, start: UtcDateTime, end: UtcDateTime) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|point| point.ts >= start && point.ts < end)
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: &str, close: f64) -> PricePoint {
        let ts = UtcDateTime::parse(&format!("{day}T21:00:00Z")).expect("timestamp");
        PricePoint::new(ts, close).expect("finite close")
    }

    #[test]
    fn orders_points_and_reports_last_close() {
        let series = PriceSeries::new(
            Symbol::parse("TSLA").expect("valid"),
            vec![point("2023-12-29", 248.48), point("2023-01-03", 108.10)],
        );

        assert_eq!(series.first_close(), Some(108.10));
        assert_eq!(series.last_close(), Some(248.48));
        assert_eq!(series.min_close(), Some(108.10));
        assert_eq!(series.max_close(), Some(248.48));
    }

    #[test]
    fn rejects_non_finite_close() {
        let ts = UtcDateTime::parse("2023-01-03T21:00:00Z").expect("timestamp");
        assert!(matches!(
            PricePoint::new(ts, f64::NAN),
            Err(ValidationError::NonFiniteValue { field: "close" })
        ));
    }

    #[test]
    fn between_uses_exclusive_end() {
        let series = PriceSeries::new(
            Symbol::parse("MSFT").expect("valid"),
            vec![point("2022-12-30", 239.82), point("2023-01-03", 239.58)],
        );
        let start = UtcDateTime::start_of_year(2023).expect("year");
        let end = UtcDateTime::end_of_year(2023).expect("year");

        let slice = series.between(start, end);
        assert_eq!(slice.len(), 1);
        assert_eq!(slice.last_close(), Some(239.58));
    }
}
