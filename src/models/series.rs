use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Attendee targeting for general series. Role targets are expanded into a
/// frozen snapshot at instance-generation time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum TargetGroup {
    AllMembers,
    Workers,
    Leaders,
}

/// Who a series belongs to. Group-owned series carry their owner id in the
/// variant, so "owner required unless general" holds by construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "seriesType", rename_all = "camelCase")]
pub enum SeriesKind {
    General { targets: BTreeSet<TargetGroup> },
    #[serde(rename_all = "camelCase")]
    SmallGroup { group_id: Uuid },
    #[serde(rename_all = "camelCase")]
    MinistryArea { area_id: Uuid },
}

impl SeriesKind {
    pub fn is_general(&self) -> bool {
        matches!(self, SeriesKind::General { .. })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

impl Ordinal {
    /// 1-based occurrence within the month; `None` means the last one.
    pub fn occurrence(&self) -> Option<u32> {
        match self {
            Ordinal::First => Some(1),
            Ordinal::Second => Some(2),
            Ordinal::Third => Some(3),
            Ordinal::Fourth => Some(4),
            Ordinal::Fifth => Some(5),
            Ordinal::Last => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MonthlyRule {
    /// Fixed day number 1-31; months without that day are skipped.
    DayOfMonth { day: u32 },
    /// E.g. "third Tuesday"; a fifth that does not exist is skipped.
    NthWeekday { ordinal: Ordinal, weekday: Weekday },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "frequency", rename_all = "camelCase")]
pub enum Recurrence {
    OneTime { date: NaiveDate },
    Weekly { weekdays: Vec<Weekday> },
    Monthly { rule: MonthlyRule },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSeries {
    pub id: Uuid,
    pub name: String,
    pub kind: SeriesKind,
    pub recurrence: Recurrence,
    pub default_time: NaiveTime,
    pub default_location: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
