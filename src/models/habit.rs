use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable routine template.
///
/// Habits are created once and never edited or deleted; day plans copy from
/// them, so a habit instance on a past date stays as it was planned even if
/// the template later grows more steps.
///
/// `first_action` is the tiny opening move that makes the habit easy to start
/// ("put on shoes", "open the editor"). It is folded into the timeline title
/// when the habit is added to a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub first_action: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new habit. Names are not required to be unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHabitInput {
    pub name: String,
    pub first_action: String,
}
