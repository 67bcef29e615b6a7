//! Reporting periods used to filter transaction lists.
//!
//! All ranges are UTC and half-open (`[from, to)`). Weeks start on Monday.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    All,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Custom {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl Period {
    /// The `[from, to)` range containing `now`, or `None` for [`Period::All`].
    pub fn range(
        &self,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let today = now.date_naive();
        let (start, end) = match *self {
            Self::All => return Ok(None),
            Self::Custom { from, to } => {
                if from >= to {
                    return Err(EngineError::InvalidDate(
                        "invalid range: from must be < to".to_string(),
                    ));
                }
                return Ok(Some((from, to)));
            }
            Self::Day => (today, today.succ_opt().ok_or_else(out_of_range)?),
            Self::Week => {
                let back = Days::new(u64::from(today.weekday().num_days_from_monday()));
                let start = today.checked_sub_days(back).ok_or_else(out_of_range)?;
                let end = start
                    .checked_add_days(Days::new(7))
                    .ok_or_else(out_of_range)?;
                (start, end)
            }
            Self::Month => month_span(today.year(), today.month(), 1)?,
            Self::Quarter => month_span(today.year(), (today.month0() / 3) * 3 + 1, 3)?,
            Self::Year => month_span(today.year(), 1, 12)?,
        };
        Ok(Some((midnight(start), midnight(end))))
    }
}

impl FromStr for Period {
    type Err = EngineError;

    /// Parses the named periods; custom ranges are built directly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(EngineError::InvalidDate(format!("unknown period: {other}"))),
        }
    }
}

fn out_of_range() -> EngineError {
    EngineError::InvalidDate("date out of range".to_string())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First day of `month` and first day `months` later.
fn month_span(year: i32, month: u32, months: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let index = month - 1 + months;
    let end = NaiveDate::from_ymd_opt(year + (index / 12) as i32, index % 12 + 1, 1)
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn named_periods_cover_now() {
        // Wednesday
        let now = Utc.with_ymd_and_hms(2024, 11, 13, 15, 30, 0).unwrap();

        assert_eq!(Period::All.range(now).unwrap(), None);
        assert_eq!(
            Period::Day.range(now).unwrap(),
            Some((utc(2024, 11, 13), utc(2024, 11, 14)))
        );
        assert_eq!(
            Period::Week.range(now).unwrap(),
            Some((utc(2024, 11, 11), utc(2024, 11, 18)))
        );
        assert_eq!(
            Period::Month.range(now).unwrap(),
            Some((utc(2024, 11, 1), utc(2024, 12, 1)))
        );
        assert_eq!(
            Period::Quarter.range(now).unwrap(),
            Some((utc(2024, 10, 1), utc(2025, 1, 1)))
        );
        assert_eq!(
            Period::Year.range(now).unwrap(),
            Some((utc(2024, 1, 1), utc(2025, 1, 1)))
        );
    }

    #[test]
    fn december_rolls_into_next_year() {
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            Period::Month.range(now).unwrap(),
            Some((utc(2023, 12, 1), utc(2024, 1, 1)))
        );
    }

    #[test]
    fn custom_range_must_be_ordered() {
        let from = utc(2024, 1, 1);
        let to = utc(2024, 2, 1);
        assert_eq!(
            Period::Custom { from, to }.range(to).unwrap(),
            Some((from, to))
        );
        assert!(Period::Custom { from: to, to: from }.range(to).is_err());
    }

    #[test]
    fn parses_names() {
        assert_eq!("Month".parse::<Period>().unwrap(), Period::Month);
        assert!("fortnight".parse::<Period>().is_err());
    }
}
