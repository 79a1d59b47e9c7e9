use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A calendar date in `YYYY-MM-DD` form, validated on parse.
///
/// Parsing rejects both malformed shapes (`2024/01/01`, `24-1-1`) and
/// impossible dates (`2024-02-30`) with [`Error::Validation`], so anything
/// that reaches the database is a real date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanDate(pub NaiveDate);

impl PlanDate {
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }
}

impl FromStr for PlanDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let shape_ok = s.len() == 10
            && s.bytes().enumerate().all(|(i, b)| match i {
                4 | 7 => b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(Error::Validation(format!(
                "date must be YYYY-MM-DD, got '{s}'"
            )));
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| Error::Validation(format!("'{s}' is not a valid calendar date")))?;
        Ok(Self(date))
    }
}

impl fmt::Display for PlanDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A time of day in `HH:MM` form (00:00–23:59).
///
/// Stored and serialized as zero-padded text, so lexicographic ordering in
/// SQL equals chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlanTime {
    pub hour: u8,
    pub minute: u8,
}

impl FromStr for PlanTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let shape_ok = s.len() == 5
            && s.bytes().enumerate().all(|(i, b)| match i {
                2 => b == b':',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(Error::Validation(format!(
                "time must be HH:MM (e.g. 07:30), got '{s}'"
            )));
        }
        let hour: u8 = s[..2].parse().expect("digits checked above");
        let minute: u8 = s[3..].parse().expect("digits checked above");
        if hour > 23 || minute > 59 {
            return Err(Error::Validation(format!("'{s}' is out of range")));
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for PlanTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for PlanTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlanTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The plan for one calendar date. At most one exists per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub id: i64,
    pub plan_date: PlanDate,
}

/// One row of a day's timeline.
///
/// Either a habit instance item (`parent_item_id = None`, `source_step_id =
/// None`) or a child item for one expanded step. A child with no
/// `scheduled_time` of its own inherits its parent's at display time.
/// `done_at` is set once and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: i64,
    pub day_plan_id: i64,
    pub title: String,
    pub scheduled_time: Option<PlanTime>,
    pub sort_order: i64,
    pub source_habit_id: Option<i64>,
    pub source_step_id: Option<i64>,
    pub parent_item_id: Option<i64>,
    pub done_at: Option<DateTime<Utc>>,
}

/// A timeline row as returned by `show_plan`, with the derived ordering keys.
///
/// `effective_time` is the item's own scheduled time, else its parent's, else
/// `None`. `group_id` is `parent_item_id` when present, else the item's own
/// id; it keeps a habit instance and its children contiguous in the merged
/// ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineRow {
    #[serde(flatten)]
    pub item: PlanItem,
    pub effective_time: Option<PlanTime>,
    pub group_id: i64,
}

/// Result of `plan_init`. Re-initializing an existing date is a no-op, not an
/// error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PlanInitOutcome {
    Created { plan_id: i64 },
    AlreadyExists { plan_id: i64 },
}

impl PlanInitOutcome {
    pub fn plan_id(&self) -> i64 {
        match *self {
            Self::Created { plan_id } | Self::AlreadyExists { plan_id } => plan_id,
        }
    }
}

/// Result of `add_habit_to_plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAddOutcome {
    /// Id of the habit instance item; the expanded step items point at it.
    pub habit_item_id: i64,
    /// 1 (the habit instance) + the habit's top-level step count.
    pub items_added: usize,
}

/// Result of `mark_done`. Completing an already-done item is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum MarkDoneOutcome {
    Done { item: PlanItem },
    AlreadyDone { item: PlanItem },
}
