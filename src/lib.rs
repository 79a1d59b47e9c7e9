//! Habitline: a personal habit and routine planner.
//!
//! Habit templates with hierarchical steps live independently of any date;
//! a habit is instantiated into a day's timeline by expanding it into plan
//! items, and timeline items are marked done one at a time. Everything is
//! stored in a single SQLite database behind [`db::Database`].

pub mod db;
pub mod error;
pub mod models;
pub mod render;

pub use error::{Error, Result};
