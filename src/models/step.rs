use serde::{Deserialize, Serialize};

/// One step of a habit template.
///
/// Steps form a tree per habit: a root step has `parent_step_id = None`, and
/// a child's parent must belong to the same habit. Siblings are ordered by
/// `(sort_order, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitStep {
    pub id: i64,
    pub habit_id: i64,
    pub parent_step_id: Option<i64>,
    pub title: String,
    pub sort_order: i64,
}

/// Input for attaching a step to a habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStepInput {
    /// Parent step for nesting. `None` creates a root step.
    pub parent_step_id: Option<i64>,
    pub title: String,
    pub sort_order: i64,
}

/// A step with its nested children, used for tree responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTreeNode {
    #[serde(flatten)]
    pub step: HabitStep,
    pub children: Vec<StepTreeNode>,
}

/// One row of a depth-first step listing.
///
/// `depth` is 0 for root steps and `parent depth + 1` for children; the
/// renderer indents by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRow {
    #[serde(flatten)]
    pub step: HabitStep,
    pub depth: usize,
}
