//! Named calibration periods.
//!
//! Each period is a calendar sub-range over which calibration runs
//! independently. The table follows the Baguio intervention timeline
//! (community-quarantine levels, then alert levels).

use chrono::NaiveDate;

use crate::error::AppError;

/// A named calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub name: &'static str,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Number of calendar days covered, inclusive of both endpoints.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

const fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => date,
        None => panic!("invalid period date in table"),
    }
}

/// Intervention periods, in chronological order (plus the merged window).
pub const INTERVENTION_PERIODS: [Period; 10] = [
    Period {
        name: "merged_1",
        start: ymd(2020, 3, 2),
        end: ymd(2021, 3, 2),
    },
    Period {
        name: "ecq",
        start: ymd(2020, 3, 2),
        end: ymd(2020, 5, 15),
    },
    Period {
        name: "gcq",
        start: ymd(2020, 5, 16),
        end: ymd(2020, 5, 31),
    },
    Period {
        name: "mgcq",
        start: ymd(2020, 6, 1),
        end: ymd(2021, 1, 31),
    },
    Period {
        name: "gcq2",
        start: ymd(2021, 2, 1),
        end: ymd(2021, 10, 31),
    },
    Period {
        name: "al3",
        start: ymd(2021, 11, 1),
        end: ymd(2021, 12, 5),
    },
    Period {
        name: "al2_1",
        start: ymd(2021, 12, 6),
        end: ymd(2022, 1, 9),
    },
    Period {
        name: "al3_2",
        start: ymd(2022, 1, 10),
        end: ymd(2022, 2, 16),
    },
    Period {
        name: "al2_2",
        start: ymd(2022, 2, 17),
        end: ymd(2022, 3, 1),
    },
    Period {
        name: "al1",
        start: ymd(2022, 3, 2),
        end: ymd(2022, 3, 15),
    },
];

/// Look up a period by name. Unknown names are configuration errors.
pub fn lookup_period(name: &str) -> Result<Period, AppError> {
    INTERVENTION_PERIODS
        .iter()
        .find(|p| p.name == name)
        .copied()
        .ok_or_else(|| {
            let available: Vec<&str> = INTERVENTION_PERIODS.iter().map(|p| p.name).collect();
            AppError::new(
                2,
                format!(
                    "Unknown period '{name}'. Available periods: {}",
                    available.join(", ")
                ),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_period() {
        let p = lookup_period("ecq").unwrap();
        assert_eq!(p.start, ymd(2020, 3, 2));
        assert_eq!(p.end, ymd(2020, 5, 15));
    }

    #[test]
    fn lookup_rejects_unknown_period() {
        let err = lookup_period("nope").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn periods_are_well_ordered() {
        for p in INTERVENTION_PERIODS {
            assert!(p.start <= p.end, "{} has inverted bounds", p.name);
            assert!(p.len_days() >= 1);
        }
    }
}
