use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub type DBConnection = Arc<Mutex<Connection>>;

pub fn create_tables(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goals (title TEXT, purpose TEXT, due_date TEXT, total_points INTEGER, current_points INTEGER, created_at TEXT)",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS milestones (goal_id INTEGER, title TEXT, completed INTEGER, completed_at INTEGER, bonus_points INTEGER, created_at TEXT)",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS steps (goal_id INTEGER, milestone_id INTEGER, text TEXT, completed INTEGER, completed_at INTEGER, time_estimate INTEGER, notes TEXT, created_at TEXT)",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS tasks (title TEXT, time_estimate INTEGER, priority TEXT, completed INTEGER, completed_at INTEGER, tags TEXT, goal_id INTEGER, source_step_id INTEGER, source_milestone_id INTEGER, created_at TEXT)",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS habits (title TEXT, description TEXT, point_value REAL, created_at TEXT)",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS habit_goals (habit_id INTEGER, goal_id INTEGER)",
        params![],
    )?;
    connection.execute(
        "CREATE TABLE IF NOT EXISTS habit_completions (habit_id INTEGER, date TEXT, timestamp INTEGER)",
        params![],
    )?;

    Ok(())
}
