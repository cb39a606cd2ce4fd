use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};

use std::collections::HashMap;

use crate::goals::data::GoalID;
use crate::internal_error::InternalResult;

use super::data::*;

pub fn get_all_habits_from_db(db_connection: &Connection) -> InternalResult<Vec<Habit>> {
    let mut habit_statement = db_connection
        .prepare("SELECT rowid, title, description, point_value, created_at FROM habits ORDER BY rowid")?;

    let mut habits = vec![];
    let habit_rows = habit_statement.query_map(params![], |row| {
        Ok(Habit {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            point_value: row
                .get::<_, Option<f64>>(3)?
                .unwrap_or(DEFAULT_HABIT_POINT_VALUE),
            goal_ids: vec![],
            completions: vec![],
            created_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        })
    })?;
    for row_result in habit_rows {
        habits.push(row_result?);
    }

    let habit_index: HashMap<HabitID, usize> = habits
        .iter()
        .enumerate()
        .map(|(index, habit)| (habit.id, index))
        .collect();

    let mut goal_statement =
        db_connection.prepare("SELECT habit_id, goal_id FROM habit_goals")?;
    let goal_rows = goal_statement.query_map(params![], |row| {
        Ok((row.get::<_, HabitID>(0)?, row.get::<_, GoalID>(1)?))
    })?;
    for row_result in goal_rows {
        let (habit_id, goal_id) = row_result?;
        if let Some(&index) = habit_index.get(&habit_id) {
            habits[index].goal_ids.push(goal_id);
        }
    }

    let mut completion_statement =
        db_connection.prepare("SELECT habit_id, date, timestamp FROM habit_completions")?;
    let completion_rows = completion_statement.query_map(params![], |row| {
        Ok((
            row.get::<_, HabitID>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;
    for row_result in completion_rows {
        let (habit_id, date, timestamp) = row_result?;
        // Unparseable legacy dates are dropped rather than failing the load.
        let date = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => continue,
        };
        if let Some(&index) = habit_index.get(&habit_id) {
            habits[index]
                .completions
                .push(HabitCompletion { date, timestamp });
        }
    }

    Ok(habits)
}

pub fn add_habit_to_db(
    request: &AddHabitRequest,
    db_connection: &Connection,
) -> InternalResult<AddHabitResult> {
    db_connection.execute(
        "INSERT INTO habits (title, description, point_value, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            request.title,
            request.description,
            DEFAULT_HABIT_POINT_VALUE,
            Utc::now().to_rfc3339(),
        ],
    )?;
    let habit_id = db_connection.last_insert_rowid();

    for goal_id in request.goal_ids.iter() {
        db_connection.execute(
            "INSERT INTO habit_goals (habit_id, goal_id) VALUES (?1, ?2)",
            params![habit_id, goal_id],
        )?;
    }

    Ok(AddHabitResult { habit_id })
}

pub fn delete_habit_from_db(habit_id: HabitID, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute(
        "DELETE FROM habit_completions WHERE habit_id = (?1)",
        params![habit_id],
    )?;
    db_connection.execute(
        "DELETE FROM habit_goals WHERE habit_id = (?1)",
        params![habit_id],
    )?;
    db_connection.execute("DELETE FROM habits WHERE rowid = (?1)", params![habit_id])?;

    Ok(())
}

pub fn add_habit_completion_in_db(
    habit_id: HabitID,
    date: NaiveDate,
    timestamp: i64,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "INSERT INTO habit_completions (habit_id, date, timestamp) VALUES (?1, ?2, ?3)",
        params![habit_id, date.to_string(), timestamp],
    )?;

    Ok(())
}

pub fn delete_habit_completion_in_db(
    habit_id: HabitID,
    date: NaiveDate,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "DELETE FROM habit_completions WHERE habit_id = (?1) AND date = (?2)",
        params![habit_id, date.to_string()],
    )?;

    Ok(())
}
