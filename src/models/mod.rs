//! Domain models for Habitline.
//!
//! # Core Concepts
//!
//! ## Template Entities
//!
//! - [`Habit`]: A reusable routine template ("Morning", "Shutdown ritual").
//! - [`HabitStep`]: One step of a habit. Steps form a tree per habit via
//!   `parent_step_id`; sibling order is `(sort_order, id)`.
//!
//! ## Timeline Entities
//!
//! Created when a habit is instantiated into a specific day:
//!
//! - [`DayPlan`]: The plan for one calendar date (at most one per date).
//! - [`PlanItem`]: One row of a day's timeline. A habit instance item plus one
//!   child item per top-level step of the habit. Children inherit their
//!   effective scheduled time from the parent item.

mod habit;
mod plan;
mod step;

pub use habit::*;
pub use plan::*;
pub use step::*;
