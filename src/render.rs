//! Plain-text rendering for terminal output.
//!
//! The database layer returns structured records; everything here is
//! presentation only.

use crate::models::{Habit, StepRow, TimelineRow};

/// Render the habit list as an aligned table.
pub fn render_habits(habits: &[Habit]) -> String {
    if habits.is_empty() {
        return "No habits yet.\n".to_string();
    }

    let name_w = habits.iter().map(|h| h.name.len()).max().unwrap_or(4).max(4);
    let mut output = String::new();
    output.push_str(&format!("{:>4}  {:<name_w$}  {}\n", "id", "name", "first action"));
    for habit in habits {
        output.push_str(&format!(
            "{:>4}  {:<name_w$}  {}\n",
            habit.id, habit.name, habit.first_action
        ));
    }
    output
}

/// Render a flattened step listing, children indented two spaces per level.
pub fn render_steps(rows: &[StepRow]) -> String {
    if rows.is_empty() {
        return "No steps yet.\n".to_string();
    }

    let mut output = String::new();
    for row in rows {
        output.push_str(&format!(
            "{:>4}  {}{}\n",
            row.step.id,
            "  ".repeat(row.depth),
            row.step.title
        ));
    }
    output
}

/// Render a day's timeline: id, effective time, done marker, title.
pub fn render_timeline(rows: &[TimelineRow]) -> String {
    if rows.is_empty() {
        return "Nothing planned.\n".to_string();
    }

    let mut output = String::new();
    for row in rows {
        let time = row
            .effective_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let done = if row.item.done_at.is_some() { '✓' } else { ' ' };
        output.push_str(&format!(
            "{:>4}  {}  {}  {}\n",
            row.item.id, time, done, row.item.title
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HabitStep, PlanItem};
    use chrono::Utc;

    fn make_step_row(id: i64, title: &str, depth: usize) -> StepRow {
        StepRow {
            step: HabitStep {
                id,
                habit_id: 1,
                parent_step_id: None,
                title: title.to_string(),
                sort_order: 1,
            },
            depth,
        }
    }

    fn make_timeline_row(id: i64, title: &str, time: Option<&str>, done: bool) -> TimelineRow {
        TimelineRow {
            item: PlanItem {
                id,
                day_plan_id: 1,
                title: title.to_string(),
                scheduled_time: None,
                sort_order: id,
                source_habit_id: None,
                source_step_id: None,
                parent_item_id: None,
                done_at: done.then(Utc::now),
            },
            effective_time: time.map(|t| t.parse().unwrap()),
            group_id: 1,
        }
    }

    #[test]
    fn habits_table_aligns_names() {
        let habits = vec![
            Habit {
                id: 1,
                name: "Morning".to_string(),
                first_action: "Drink water".to_string(),
                created_at: Utc::now(),
            },
            Habit {
                id: 2,
                name: "Shutdown ritual".to_string(),
                first_action: "Close the laptop".to_string(),
                created_at: Utc::now(),
            },
        ];
        let output = render_habits(&habits);
        assert!(output.contains("   1  Morning          Drink water\n"));
        assert!(output.contains("   2  Shutdown ritual  Close the laptop\n"));
    }

    #[test]
    fn steps_indent_by_depth() {
        let rows = vec![
            make_step_row(1, "Stretch", 0),
            make_step_row(2, "Neck", 1),
            make_step_row(3, "Left side", 2),
        ];
        let output = render_steps(&rows);
        assert_eq!(output, "   1  Stretch\n   2    Neck\n   3      Left side\n");
    }

    #[test]
    fn timeline_shows_effective_time_and_done_marker() {
        let rows = vec![
            make_timeline_row(1, "[habit] Morning / first: Drink water", Some("07:00"), true),
            make_timeline_row(2, "  - Stretch", Some("07:00"), false),
            make_timeline_row(3, "Free note", None, false),
        ];
        let output = render_timeline(&rows);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "   1  07:00  ✓  [habit] Morning / first: Drink water");
        assert_eq!(lines[1], "   2  07:00       - Stretch");
        assert_eq!(lines[2], "   3  --:--     Free note");
    }

    #[test]
    fn empty_collections_render_placeholders() {
        assert_eq!(render_habits(&[]), "No habits yet.\n");
        assert_eq!(render_steps(&[]), "No steps yet.\n");
        assert_eq!(render_timeline(&[]), "Nothing planned.\n");
    }
}
