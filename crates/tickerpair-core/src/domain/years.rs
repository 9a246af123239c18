use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Inclusive calendar-year range, `start <= end`, both within `MIN_YEAR..=MAX_YEAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, ValidationError> {
        for year in [start, end] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(ValidationError::YearOutOfRange {
                    year,
                    min: MIN_YEAR,
                    max: MAX_YEAR,
                });
            }
        }
        if start > end {
            return Err(ValidationError::InvertedYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(year: i32) -> Result<Self, ValidationError> {
        Self::new(year, year)
    }

    pub const fn start(self) -> i32 {
        self.start
    }

    pub const fn end(self) -> i32 {
        self.end
    }

    pub fn count(self) -> usize {
        (self.end - self.start + 1) as usize
    }

    /// Years in ascending order.
    pub fn years(self) -> RangeInclusive<i32> {
        self.start..=self.end
    }
}
