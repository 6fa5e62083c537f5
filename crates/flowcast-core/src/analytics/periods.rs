//! Period boundary resolution
//!
//! Computes the current and previous windows for MoM/WoW/QoQ/YoY comparisons.
//!
//! Two policies:
//! - **Equivalent**: the reference date sits in the still-open period. The
//!   current window runs from the period start to the reference date and the
//!   previous window covers the same day offset one period back, clamped to
//!   the previous period's length (Mar 31 compares against Feb 28/29).
//! - **Complete**: the reference date sits in a closed period. Both windows
//!   span full calendar periods.
//!
//! Weeks start on Sunday. Quarters start in January, April, July, October.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ComparisonType, DateRange};

/// Which comparison policy produced a set of bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    Equivalent,
    Complete,
}

/// Start/end dates for the current and previous comparison windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBounds {
    pub comparison: ComparisonType,
    pub mode: PeriodMode,
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
}

impl PeriodBounds {
    pub fn current(&self) -> DateRange {
        DateRange::new(self.current_start, self.current_end)
    }

    pub fn previous(&self) -> DateRange {
        DateRange::new(self.previous_start, self.previous_end)
    }
}

/// Resolve comparison windows, picking the policy from the reference date
///
/// The reference date defaults to `today`. When it falls in the period that
/// contains `today` (or later) the equivalent policy applies, otherwise the
/// complete policy.
pub fn resolve_periods(
    comparison: ComparisonType,
    reference: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<PeriodBounds> {
    let reference = reference.unwrap_or(today);
    if reference >= period_start(comparison, today) {
        resolve_equivalent(comparison, reference)
    } else {
        resolve_complete(comparison, reference)
    }
}

fn out_of_range(reference: NaiveDate) -> Error {
    Error::InvalidParameter(format!(
        "reference date {} is outside the supported calendar range",
        reference
    ))
}

/// Partial, day-aligned windows ending at the reference date
pub fn resolve_equivalent(comparison: ComparisonType, reference: NaiveDate) -> Result<PeriodBounds> {
    equivalent_bounds(comparison, reference).ok_or_else(|| out_of_range(reference))
}

fn equivalent_bounds(comparison: ComparisonType, reference: NaiveDate) -> Option<PeriodBounds> {
    let current_start = period_start(comparison, reference);

    let (previous_start, previous_end) = match comparison {
        ComparisonType::MoM => {
            let previous_start = shift_months(current_start, -1)?;
            let day = reference
                .day()
                .min(days_in_month(previous_start.year(), previous_start.month()));
            (previous_start, previous_start.with_day(day)?)
        }
        ComparisonType::WoW => (days_before(current_start, 7)?, days_before(reference, 7)?),
        ComparisonType::QoQ => {
            let previous_start = shift_months(current_start, -3)?;
            let previous_len = (current_start - previous_start).num_days();
            let offset = (reference - current_start).num_days().min(previous_len - 1);
            (previous_start, days_after(previous_start, offset)?)
        }
        ComparisonType::YoY => (
            shift_months(current_start, -12)?,
            same_day_previous_year(reference)?,
        ),
    };

    Some(PeriodBounds {
        comparison,
        mode: PeriodMode::Equivalent,
        current_start,
        current_end: reference,
        previous_start,
        previous_end,
    })
}

/// Full calendar windows: the period containing the reference date and the
/// one before it
pub fn resolve_complete(comparison: ComparisonType, reference: NaiveDate) -> Result<PeriodBounds> {
    complete_bounds(comparison, reference).ok_or_else(|| out_of_range(reference))
}

fn complete_bounds(comparison: ComparisonType, reference: NaiveDate) -> Option<PeriodBounds> {
    let current_start = period_start(comparison, reference);
    let months = match comparison {
        ComparisonType::MoM => 1,
        ComparisonType::QoQ => 3,
        ComparisonType::YoY => 12,
        ComparisonType::WoW => 0,
    };
    let (current_end, previous_start) = if months == 0 {
        (days_after(current_start, 6)?, days_before(current_start, 7)?)
    } else {
        (
            days_before(shift_months(current_start, months)?, 1)?,
            shift_months(current_start, -months)?,
        )
    };

    Some(PeriodBounds {
        comparison,
        mode: PeriodMode::Complete,
        current_start,
        current_end,
        previous_start,
        previous_end: days_before(current_start, 1)?,
    })
}

/// First day of the comparison period containing `date`
pub fn period_start(comparison: ComparisonType, date: NaiveDate) -> NaiveDate {
    match comparison {
        ComparisonType::MoM => month_start(date),
        ComparisonType::WoW => week_start(date),
        ComparisonType::QoQ => quarter_start(date),
        ComparisonType::YoY => year_start(date),
    }
}

pub fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| date.checked_sub_signed(d))
}

pub fn days_after(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}

/// Sunday on or before `date`, saturating at the earliest representable day
pub fn week_start(date: NaiveDate) -> NaiveDate {
    days_before(date, date.weekday().num_days_from_sunday() as i64).unwrap_or(NaiveDate::MIN)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("Day 1 always valid")
}

/// Zero-based quarter index
pub fn quarter_index(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3
}

pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), quarter_index(date) * 3 + 1, 1)
        .expect("Quarter start always valid")
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("Jan 1 always valid")
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Move a date by whole months, landing on the first of the month
///
/// `None` once the result leaves the representable calendar.
pub fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = (i64::from(date.year()) * 12 + i64::from(date.month0())).checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Same month/day one year earlier; Feb 29 becomes Feb 28
fn same_day_previous_year(date: NaiveDate) -> Option<NaiveDate> {
    let year = date.year() - 1;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(week_start(d("2024-01-10")), d("2024-01-07"));
        assert_eq!(week_start(d("2024-01-07")), d("2024-01-07"));
        assert_eq!(week_start(d("2024-01-06")), d("2023-12-31"));
    }

    #[test]
    fn test_quarter_helpers() {
        assert_eq!(quarter_index(d("2024-01-31")), 0);
        assert_eq!(quarter_index(d("2024-12-01")), 3);
        assert_eq!(quarter_start(d("2024-05-17")), d("2024-04-01"));
        assert_eq!(quarter_start(d("2024-10-01")), d("2024-10-01"));
    }

    #[test]
    fn test_shift_months_crosses_years() {
        assert_eq!(shift_months(d("2024-01-15"), -1), Some(d("2023-12-01")));
        assert_eq!(shift_months(d("2024-11-01"), 3), Some(d("2025-02-01")));
        assert_eq!(shift_months(d("2024-03-01"), -12), Some(d("2023-03-01")));
    }

    #[test]
    fn test_shift_months_leaves_calendar() {
        assert_eq!(shift_months(d("2024-05-01"), -4_000_000), None);
        assert_eq!(shift_months(NaiveDate::MAX, 1), None);
        assert_eq!(shift_months(d("2024-05-01"), i64::MAX), None);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_equivalent_mom_clamps_to_short_february() {
        let bounds = resolve_equivalent(ComparisonType::MoM, d("2023-03-31")).unwrap();
        assert_eq!(bounds.current_start, d("2023-03-01"));
        assert_eq!(bounds.current_end, d("2023-03-31"));
        assert_eq!(bounds.previous_start, d("2023-02-01"));
        assert_eq!(bounds.previous_end, d("2023-02-28"));
        assert_eq!(bounds.previous_end.day(), 31u32.min(28));

        let leap = resolve_equivalent(ComparisonType::MoM, d("2024-03-30")).unwrap();
        assert_eq!(leap.previous_end, d("2024-02-29"));
    }

    #[test]
    fn test_equivalent_mom_mid_month() {
        let bounds = resolve_equivalent(ComparisonType::MoM, d("2024-01-15")).unwrap();
        assert_eq!(bounds.previous_start, d("2023-12-01"));
        assert_eq!(bounds.previous_end, d("2023-12-15"));
    }

    #[test]
    fn test_equivalent_wow() {
        let bounds = resolve_equivalent(ComparisonType::WoW, d("2024-01-10")).unwrap();
        assert_eq!(bounds.current_start, d("2024-01-07"));
        assert_eq!(bounds.previous_start, d("2023-12-31"));
        assert_eq!(bounds.previous_end, d("2024-01-03"));
    }

    #[test]
    fn test_equivalent_qoq_clamps_day_of_quarter() {
        // Q3 is 92 days, Q2 is 91 days; last day of Q3 maps to last day of Q2
        let bounds = resolve_equivalent(ComparisonType::QoQ, d("2024-09-30")).unwrap();
        assert_eq!(bounds.current_start, d("2024-07-01"));
        assert_eq!(bounds.previous_start, d("2024-04-01"));
        assert_eq!(bounds.previous_end, d("2024-06-30"));

        let early = resolve_equivalent(ComparisonType::QoQ, d("2024-04-10")).unwrap();
        assert_eq!(early.previous_start, d("2024-01-01"));
        assert_eq!(early.previous_end, d("2024-01-10"));
    }

    #[test]
    fn test_equivalent_yoy_leap_day() {
        let bounds = resolve_equivalent(ComparisonType::YoY, d("2024-02-29")).unwrap();
        assert_eq!(bounds.current_start, d("2024-01-01"));
        assert_eq!(bounds.previous_start, d("2023-01-01"));
        assert_eq!(bounds.previous_end, d("2023-02-28"));
    }

    #[test]
    fn test_complete_periods() {
        let mom = resolve_complete(ComparisonType::MoM, d("2024-02-10")).unwrap();
        assert_eq!(mom.current_start, d("2024-02-01"));
        assert_eq!(mom.current_end, d("2024-02-29"));
        assert_eq!(mom.previous_start, d("2024-01-01"));
        assert_eq!(mom.previous_end, d("2024-01-31"));

        let wow = resolve_complete(ComparisonType::WoW, d("2024-01-10")).unwrap();
        assert_eq!(wow.current_end, d("2024-01-13"));
        assert_eq!(wow.previous_end, d("2024-01-06"));

        let qoq = resolve_complete(ComparisonType::QoQ, d("2024-02-10")).unwrap();
        assert_eq!(qoq.current_end, d("2024-03-31"));
        assert_eq!(qoq.previous_start, d("2023-10-01"));

        let yoy = resolve_complete(ComparisonType::YoY, d("2023-06-01")).unwrap();
        assert_eq!(yoy.current_end, d("2023-12-31"));
        assert_eq!(yoy.previous_start, d("2022-01-01"));
        assert_eq!(yoy.previous_end, d("2022-12-31"));
    }

    #[test]
    fn test_mode_selection() {
        let today = d("2024-05-20");

        let open = resolve_periods(ComparisonType::MoM, None, today).unwrap();
        assert_eq!(open.mode, PeriodMode::Equivalent);
        assert_eq!(open.current_end, today);

        let closed = resolve_periods(ComparisonType::MoM, Some(d("2024-04-15")), today).unwrap();
        assert_eq!(closed.mode, PeriodMode::Complete);
        assert_eq!(closed.current_start, d("2024-04-01"));
        assert_eq!(closed.current_end, d("2024-04-30"));

        // Earlier this month is still the open period
        let same_month = resolve_periods(ComparisonType::MoM, Some(d("2024-05-02")), today)
            .unwrap();
        assert_eq!(same_month.mode, PeriodMode::Equivalent);
        assert_eq!(same_month.current_end, d("2024-05-02"));
    }

    #[test]
    fn test_calendar_edges_are_invalid_parameters() {
        for comparison in [
            ComparisonType::MoM,
            ComparisonType::WoW,
            ComparisonType::QoQ,
            ComparisonType::YoY,
        ] {
            assert!(matches!(
                resolve_complete(comparison, NaiveDate::MAX),
                Err(Error::InvalidParameter(_))
            ));
            assert!(matches!(
                resolve_equivalent(comparison, NaiveDate::MIN),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert_eq!(week_start(NaiveDate::MIN), NaiveDate::MIN);
        assert_eq!(days_before(d("2024-05-01"), i64::MAX), None);
    }
}
