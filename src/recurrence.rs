use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

use crate::models::{MeetingSeries, MonthlyRule, Recurrence};

/// Date span generation works over, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationWindow {
    pub from: NaiveDate,
    pub until: NaiveDate,
}

impl GenerationWindow {
    pub fn new(from: NaiveDate, until: NaiveDate) -> Self {
        GenerationWindow { from, until }
    }

    pub fn days_ahead(from: NaiveDate, days: u64) -> Self {
        let until = from
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX);
        GenerationWindow { from, until }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.until
    }
}

/// A not-yet-persisted instance. Carries the series defaults as they were
/// at generation time; a later edit of the series defaults does not reach
/// back into already-materialized instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeetingDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub description: Option<String>,
}

/// Expand a series rule into drafts for every prescribed date inside the
/// window that is not already materialized. Re-running with the previous
/// run's dates in `existing_dates` yields nothing, so generation is safe
/// to repeat on every series edit.
pub fn generate(
    series: &MeetingSeries,
    window: GenerationWindow,
    existing_dates: &BTreeSet<NaiveDate>,
) -> Vec<MeetingDraft> {
    rule_dates(&series.recurrence, window)
        .into_iter()
        .filter(|date| !existing_dates.contains(date))
        .map(|date| MeetingDraft {
            date,
            time: series.default_time,
            location: series.default_location.clone(),
            description: series.description.clone(),
        })
        .collect()
}

/// Every date the rule prescribes inside the window, ascending. One-time
/// rules are window-exempt: their single date is materialized wherever it
/// falls, past dates included.
pub fn rule_dates(rule: &Recurrence, window: GenerationWindow) -> BTreeSet<NaiveDate> {
    match rule {
        Recurrence::OneTime { date } => BTreeSet::from([*date]),
        Recurrence::Weekly { weekdays } => window_days(window)
            .filter(|d| weekdays.contains(&d.weekday()))
            .collect(),
        Recurrence::Monthly { rule } => window_months(window)
            .filter_map(|(year, month)| monthly_occurrence(rule, year, month))
            .filter(|d| window.contains(*d))
            .collect(),
    }
}

fn window_days(window: GenerationWindow) -> impl Iterator<Item = NaiveDate> {
    window
        .from
        .iter_days()
        .take_while(move |d| *d <= window.until)
}

fn window_months(window: GenerationWindow) -> impl Iterator<Item = (i32, u32)> {
    let mut cursor = (window.from.year(), window.from.month());
    let end = (window.until.year(), window.until.month());
    std::iter::from_fn(move || {
        if cursor > end {
            return None;
        }
        let current = cursor;
        cursor = if cursor.1 == 12 {
            (cursor.0 + 1, 1)
        } else {
            (cursor.0, cursor.1 + 1)
        };
        Some(current)
    })
}

/// The rule's date within one month, if the month has it. Day-of-month
/// rules skip months that are too short (a day-31 rule yields nothing in
/// April, it does not roll over to the 30th); an ordinal occurrence that
/// does not exist yields nothing rather than falling back a week.
fn monthly_occurrence(rule: &MonthlyRule, year: i32, month: u32) -> Option<NaiveDate> {
    match rule {
        MonthlyRule::DayOfMonth { day } => NaiveDate::from_ymd_opt(year, month, *day),
        MonthlyRule::NthWeekday { ordinal, weekday } => match ordinal.occurrence() {
            Some(n) => nth_weekday_in_month(year, month, *weekday, n),
            None => last_weekday_in_month(year, month, *weekday),
        },
    }
}

fn nth_weekday_in_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset =
        (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    NaiveDate::from_ymd_opt(year, month, 1 + offset + 7 * (n - 1))
}

fn last_weekday_in_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(back as u64))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
