//! Turn index to calendar quarter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar quarter of a simulation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuarterDate {
    pub year: i32,
    /// 1..=4
    pub quarter: u8,
}

impl QuarterDate {
    /// `year = start_year + turn / 4`, `quarter = turn % 4 + 1`.
    pub fn from_turn(start_year: i32, turn: u32) -> Self {
        let years = i32::try_from(turn / 4).unwrap_or(i32::MAX);
        Self {
            year: start_year.saturating_add(years),
            quarter: (turn % 4) as u8 + 1,
        }
    }

    /// First day of the quarter, when representable.
    pub fn first_day(&self) -> Option<NaiveDate> {
        let month = u32::from(self.quarter - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

impl fmt::Display for QuarterDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Q{}", self.year, self.quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_to_quarter() {
        assert_eq!(QuarterDate::from_turn(2000, 0).to_string(), "2000, Q1");
        assert_eq!(QuarterDate::from_turn(2000, 7).to_string(), "2001, Q4");
        let q = QuarterDate::from_turn(2000, 13);
        assert_eq!((q.year, q.quarter), (2003, 2));
        assert_eq!(q.first_day(), NaiveDate::from_ymd_opt(2003, 4, 1));
    }
}
