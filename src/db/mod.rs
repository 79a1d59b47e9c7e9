mod schema;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Setup("Database path has no parent directory".into()))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "habitline")
            .ok_or_else(|| Error::Setup("Could not determine data directory".into()))?;
        let db_path = dirs.data_dir().join("habitline.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn).map_err(|e| Error::Setup(format!("{e:#}")))
    }

    // ============================================================
    // Habit operations
    // ============================================================

    pub fn create_habit(&self, input: CreateHabitInput) -> Result<Habit> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO habits (name, first_action, created_at) VALUES (?, ?, ?)",
            (&input.name, &input.first_action, now.to_rfc3339()),
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, name = %input.name, "created habit");

        Ok(Habit {
            id,
            name: input.name,
            first_action: input.first_action,
            created_at: now,
        })
    }

    pub fn get_habit(&self, id: i64) -> Result<Option<Habit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, first_action, created_at FROM habits WHERE id = ?",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Habit {
                id: row.get(0)?,
                name: row.get(1)?,
                first_action: row.get(2)?,
                created_at: parse_datetime(row.get::<_, String>(3)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn list_habits(&self) -> Result<Vec<Habit>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, first_action, created_at FROM habits ORDER BY id",
        )?;

        let habits = stmt
            .query_map([], |row| {
                Ok(Habit {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    first_action: row.get(2)?,
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    // ============================================================
    // Step operations
    // ============================================================

    pub fn add_step(&self, habit_id: i64, input: CreateStepInput) -> Result<HabitStep> {
        self.get_habit(habit_id)?
            .ok_or_else(|| Error::NotFound(format!("habit {habit_id} does not exist")))?;

        if let Some(parent_id) = input.parent_step_id {
            let parent = self
                .get_step(parent_id)?
                .ok_or_else(|| Error::NotFound(format!("step {parent_id} does not exist")))?;
            if parent.habit_id != habit_id {
                return Err(Error::Validation(format!(
                    "parent step {parent_id} belongs to habit {}, not habit {habit_id}",
                    parent.habit_id
                )));
            }
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO habit_steps (habit_id, parent_step_id, title, sort_order)
             VALUES (?, ?, ?, ?)",
            (habit_id, input.parent_step_id, &input.title, input.sort_order),
        )?;

        Ok(HabitStep {
            id: conn.last_insert_rowid(),
            habit_id,
            parent_step_id: input.parent_step_id,
            title: input.title,
            sort_order: input.sort_order,
        })
    }

    pub fn get_step(&self, id: i64) -> Result<Option<HabitStep>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, parent_step_id, title, sort_order
             FROM habit_steps WHERE id = ?",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_step(row)?))
        } else {
            Ok(None)
        }
    }

    /// The full step tree of a habit, roots first, siblings in
    /// `(sort_order, id)` order at every level.
    pub fn get_step_tree(&self, habit_id: i64) -> Result<Vec<StepTreeNode>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, parent_step_id, title, sort_order
             FROM habit_steps WHERE habit_id = ? ORDER BY sort_order, id",
        )?;

        let steps = stmt
            .query_map([habit_id], map_step)?
            .collect::<Result<Vec<_>, _>>()?;

        // Group by parent; buckets keep the query's (sort_order, id) order.
        let mut children_map: HashMap<Option<i64>, Vec<HabitStep>> = HashMap::new();
        for step in steps {
            children_map
                .entry(step.parent_step_id)
                .or_default()
                .push(step);
        }

        fn build_subtree(
            parent_id: Option<i64>,
            children_map: &HashMap<Option<i64>, Vec<HabitStep>>,
        ) -> Vec<StepTreeNode> {
            children_map
                .get(&parent_id)
                .map(|steps| {
                    steps
                        .iter()
                        .map(|s| StepTreeNode {
                            step: s.clone(),
                            children: build_subtree(Some(s.id), children_map),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        Ok(build_subtree(None, &children_map))
    }

    /// Depth-first pre-order flattening of [`Self::get_step_tree`], each row
    /// tagged with its depth for indented display.
    pub fn list_steps(&self, habit_id: i64) -> Result<Vec<StepRow>> {
        let tree = self.get_step_tree(habit_id)?;

        let mut rows = Vec::new();
        let mut stack: Vec<(usize, StepTreeNode)> =
            tree.into_iter().rev().map(|node| (0, node)).collect();
        while let Some((depth, node)) = stack.pop() {
            rows.push(StepRow {
                step: node.step,
                depth,
            });
            for child in node.children.into_iter().rev() {
                stack.push((depth + 1, child));
            }
        }

        Ok(rows)
    }

    // ============================================================
    // Day plan operations
    // ============================================================

    pub fn plan_init(&self, date: PlanDate) -> Result<PlanInitOutcome> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT id FROM day_plans WHERE plan_date = ?")?;
        let mut rows = stmt.query([date.to_string()])?;

        if let Some(row) = rows.next()? {
            return Ok(PlanInitOutcome::AlreadyExists {
                plan_id: row.get(0)?,
            });
        }
        drop(rows);
        drop(stmt);

        conn.execute("INSERT INTO day_plans (plan_date) VALUES (?)", [date.to_string()])?;
        let plan_id = conn.last_insert_rowid();
        tracing::debug!(plan_id, %date, "created day plan");

        Ok(PlanInitOutcome::Created { plan_id })
    }

    /// The plan for a date, or `NotFound` when none exists. This is a
    /// precondition check, not a creation path; `plan_init` creates.
    pub fn get_plan(&self, date: PlanDate) -> Result<DayPlan> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT id, plan_date FROM day_plans WHERE plan_date = ?")?;

        let mut rows = stmt.query([date.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(DayPlan {
                id: row.get(0)?,
                plan_date: parse_date(row.get::<_, String>(1)?),
            })
        } else {
            Err(Error::NotFound(format!(
                "no plan exists for {date}; initialize it first"
            )))
        }
    }

    /// Instantiate a habit into a day's timeline: one habit instance item,
    /// then one child item per top-level step in `(sort_order, id)` order.
    ///
    /// The next sort_order is computed by reading the current maximum and is
    /// not atomic against a concurrent writer on the same date; single-writer
    /// use is assumed.
    pub fn add_habit_to_plan(
        &self,
        date: PlanDate,
        habit_id: i64,
        scheduled_time: Option<PlanTime>,
    ) -> Result<PlanAddOutcome> {
        let plan = self.get_plan(date)?;
        let habit = self
            .get_habit(habit_id)?
            .ok_or_else(|| Error::NotFound(format!("habit {habit_id} does not exist")))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        // One commit unit: an error on any insert rolls back the whole
        // expansion, so a partially expanded habit is never durable.
        let tx = conn.unchecked_transaction()?;

        let base_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) FROM plan_items WHERE day_plan_id = ?",
            [plan.id],
            |row| row.get::<_, i64>(0),
        )? + 1;

        tx.execute(
            "INSERT INTO plan_items (day_plan_id, title, scheduled_time, sort_order, source_habit_id, source_step_id, parent_item_id)
             VALUES (?, ?, ?, ?, ?, NULL, NULL)",
            (
                plan.id,
                format!("[habit] {} / first: {}", habit.name, habit.first_action),
                scheduled_time.map(|t| t.to_string()),
                base_order,
                habit_id,
            ),
        )?;
        let habit_item_id = tx.last_insert_rowid();

        let steps = {
            let mut stmt = tx.prepare(
                "SELECT id, title FROM habit_steps
                 WHERE habit_id = ? AND parent_step_id IS NULL ORDER BY sort_order, id",
            )?;
            let steps = stmt
                .query_map([habit_id], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            steps
        };

        let mut order = base_order + 1;
        for (step_id, step_title) in &steps {
            tx.execute(
                "INSERT INTO plan_items (day_plan_id, title, scheduled_time, sort_order, source_habit_id, source_step_id, parent_item_id)
                 VALUES (?, ?, NULL, ?, ?, ?, ?)",
                (
                    plan.id,
                    format!("  - {step_title}"),
                    order,
                    habit_id,
                    step_id,
                    habit_item_id,
                ),
            )?;
            order += 1;
        }

        tx.commit()?;
        tracing::debug!(%date, habit_id, items = 1 + steps.len(), "added habit to plan");

        Ok(PlanAddOutcome {
            habit_item_id,
            items_added: 1 + steps.len(),
        })
    }

    /// The merged timeline for a date.
    ///
    /// Rows are ordered so that groups with a concrete effective time come
    /// first (earliest first), unscheduled groups last, and every habit
    /// instance stays contiguous with its children in insertion order.
    pub fn show_plan(&self, date: PlanDate) -> Result<Vec<TimelineRow>> {
        let plan = self.get_plan(date)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT pi.id, pi.day_plan_id, pi.title, pi.scheduled_time, pi.sort_order,
                    pi.source_habit_id, pi.source_step_id, pi.parent_item_id, pi.done_at,
                    COALESCE(pi.scheduled_time, p.scheduled_time) AS effective_time,
                    COALESCE(pi.parent_item_id, pi.id) AS group_id
             FROM plan_items pi
             LEFT JOIN plan_items p ON p.id = pi.parent_item_id
             WHERE pi.day_plan_id = ?
             ORDER BY effective_time IS NULL, effective_time, group_id, pi.sort_order, pi.id",
        )?;

        let rows = stmt
            .query_map([plan.id], |row| {
                Ok(TimelineRow {
                    item: map_plan_item(row)?,
                    effective_time: row.get::<_, Option<String>>(9)?.and_then(parse_time),
                    group_id: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn get_plan_item(&self, id: i64) -> Result<Option<PlanItem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, day_plan_id, title, scheduled_time, sort_order,
                    source_habit_id, source_step_id, parent_item_id, done_at
             FROM plan_items WHERE id = ?",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_plan_item(row)?))
        } else {
            Ok(None)
        }
    }

    /// Mark a timeline item done. Completion is monotonic: a second call on
    /// the same item reports `AlreadyDone` and changes nothing.
    pub fn mark_done(&self, item_id: i64) -> Result<MarkDoneOutcome> {
        let item = self
            .get_plan_item(item_id)?
            .ok_or_else(|| Error::NotFound(format!("item {item_id} does not exist")))?;

        if item.done_at.is_some() {
            return Ok(MarkDoneOutcome::AlreadyDone { item });
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        conn.execute(
            "UPDATE plan_items SET done_at = ? WHERE id = ?",
            (now.to_rfc3339(), item_id),
        )?;

        Ok(MarkDoneOutcome::Done {
            item: PlanItem {
                done_at: Some(now),
                ..item
            },
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn map_step(row: &rusqlite::Row) -> rusqlite::Result<HabitStep> {
    Ok(HabitStep {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        parent_step_id: row.get(2)?,
        title: row.get(3)?,
        sort_order: row.get(4)?,
    })
}

fn map_plan_item(row: &rusqlite::Row) -> rusqlite::Result<PlanItem> {
    Ok(PlanItem {
        id: row.get(0)?,
        day_plan_id: row.get(1)?,
        title: row.get(2)?,
        scheduled_time: row.get::<_, Option<String>>(3)?.and_then(parse_time),
        sort_order: row.get(4)?,
        source_habit_id: row.get(5)?,
        source_step_id: row.get(6)?,
        parent_item_id: row.get(7)?,
        done_at: row.get::<_, Option<String>>(8)?.map(parse_datetime),
    })
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> PlanDate {
    s.parse().unwrap_or_else(|_| {
        tracing::warn!(value = %s, "stored plan_date is not a valid date, falling back to today");
        PlanDate::today()
    })
}

fn parse_time(s: String) -> Option<PlanTime> {
    s.parse().ok()
}
