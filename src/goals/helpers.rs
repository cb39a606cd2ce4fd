use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use std::collections::HashMap;

use crate::internal_error::InternalResult;

use super::data::*;

// Column layouts are fixed by the SELECTs below; loaders backfill NULLs from
// legacy rows instead of failing.

fn goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        title: row.get(1)?,
        purpose: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        due_date: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        total_points: row
            .get::<_, Option<i64>>(4)?
            .unwrap_or(DEFAULT_TOTAL_POINTS),
        current_points: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        milestones: vec![],
        created_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

fn milestone_from_row(row: &Row) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        title: row.get(2)?,
        completed: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
        completed_at: row.get(4)?,
        bonus_points: row
            .get::<_, Option<i64>>(5)?
            .unwrap_or(DEFAULT_MILESTONE_BONUS),
        steps: vec![],
        created_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

fn step_from_row(row: &Row) -> rusqlite::Result<Step> {
    Ok(Step {
        id: row.get(0)?,
        text: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        completed: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
        completed_at: row.get(5)?,
        time_estimate: row
            .get::<_, Option<i64>>(6)?
            .unwrap_or(DEFAULT_TIME_ESTIMATE),
        notes: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        created_at: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
    })
}

pub fn get_all_goals_from_db(db_connection: &Connection) -> InternalResult<Vec<Goal>> {
    let mut goal_statement = db_connection.prepare(
        "SELECT rowid, title, purpose, due_date, total_points, current_points, created_at FROM goals",
    )?;

    let mut goals = vec![];
    let goal_rows = goal_statement.query_map(params![], |row| goal_from_row(row))?;
    for row_result in goal_rows {
        goals.push(row_result?);
    }

    // Creation order comes from the explicit timestamp, not the id.
    goals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let goal_index: HashMap<GoalID, usize> = goals
        .iter()
        .enumerate()
        .map(|(index, goal)| (goal.id, index))
        .collect();

    let mut milestone_statement = db_connection.prepare(
        "SELECT rowid, goal_id, title, completed, completed_at, bonus_points, created_at FROM milestones ORDER BY rowid",
    )?;
    let milestone_rows = milestone_statement.query_map(params![], |row| {
        Ok((row.get::<_, GoalID>(1)?, milestone_from_row(row)?))
    })?;
    for row_result in milestone_rows {
        let (goal_id, milestone) = row_result?;
        if let Some(&index) = goal_index.get(&goal_id) {
            goals[index].milestones.push(milestone);
        }
    }

    let mut step_statement = db_connection.prepare(
        "SELECT rowid, goal_id, milestone_id, text, completed, completed_at, time_estimate, notes, created_at FROM steps ORDER BY rowid",
    )?;
    let step_rows = step_statement.query_map(params![], |row| {
        Ok((
            row.get::<_, GoalID>(1)?,
            row.get::<_, MilestoneID>(2)?,
            step_from_row(row)?,
        ))
    })?;
    for row_result in step_rows {
        let (goal_id, milestone_id, step) = row_result?;
        if let Some(&index) = goal_index.get(&goal_id) {
            if let Some(milestone) = goals[index].milestone_mut(milestone_id) {
                milestone.steps.push(step);
            }
        }
    }

    Ok(goals)
}

pub fn add_goal_to_db(
    request: &AddGoalRequest,
    db_connection: &Connection,
) -> InternalResult<AddGoalResult> {
    db_connection.execute(
        "INSERT INTO goals (title, purpose, due_date, total_points, current_points, created_at) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![
            request.title,
            request.purpose.clone().unwrap_or_default(),
            request.due_date.map(|d| d.to_string()),
            request.total_points.unwrap_or(DEFAULT_TOTAL_POINTS),
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(AddGoalResult {
        goal_id: db_connection.last_insert_rowid(),
    })
}

pub fn update_goal_in_db(
    request: &SetGoalRequest,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE goals SET title = (?1), purpose = (?2), due_date = (?3) WHERE rowid = (?4)",
        params![
            request.title,
            request.purpose.clone().unwrap_or_default(),
            request.due_date.map(|d| d.to_string()),
            request.goal_id,
        ],
    )?;

    Ok(())
}

pub fn set_goal_total_points_in_db(
    goal_id: GoalID,
    total_points: i64,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE goals SET total_points = (?1) WHERE rowid = (?2)",
        params![total_points, goal_id],
    )?;

    Ok(())
}

pub fn set_goal_current_points_in_db(
    goal_id: GoalID,
    current_points: i64,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE goals SET current_points = (?1) WHERE rowid = (?2)",
        params![current_points, goal_id],
    )?;

    Ok(())
}

/// Deletes the goal and everything owned by it. Tasks pointing at the goal
/// are detached to ad hoc rather than deleted, so they cannot resurrect
/// points if the rowid is ever reused.
pub fn delete_goal_from_db(goal_id: GoalID, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute("DELETE FROM steps WHERE goal_id = (?1)", params![goal_id])?;
    db_connection.execute(
        "DELETE FROM milestones WHERE goal_id = (?1)",
        params![goal_id],
    )?;
    db_connection.execute(
        "DELETE FROM habit_goals WHERE goal_id = (?1)",
        params![goal_id],
    )?;
    db_connection.execute(
        "UPDATE tasks SET goal_id = NULL, source_step_id = NULL, source_milestone_id = NULL WHERE goal_id = (?1)",
        params![goal_id],
    )?;
    db_connection.execute("DELETE FROM goals WHERE rowid = (?1)", params![goal_id])?;

    Ok(())
}

pub fn add_milestone_to_db(
    request: &AddMilestoneRequest,
    db_connection: &Connection,
) -> InternalResult<AddMilestoneResult> {
    db_connection.execute(
        "INSERT INTO milestones (goal_id, title, completed, completed_at, bonus_points, created_at) VALUES (?1, ?2, 0, NULL, ?3, ?4)",
        params![
            request.goal_id,
            request.title,
            request.bonus_points.unwrap_or(DEFAULT_MILESTONE_BONUS),
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(AddMilestoneResult {
        milestone_id: db_connection.last_insert_rowid(),
    })
}

pub fn update_milestone_in_db(
    request: &SetMilestoneRequest,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE milestones SET title = (?1) WHERE rowid = (?2)",
        params![request.title, request.milestone_id],
    )?;

    Ok(())
}

pub fn set_milestone_completion_in_db(
    milestone_id: MilestoneID,
    completed: bool,
    completed_at: Option<i64>,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE milestones SET completed = (?1), completed_at = (?2) WHERE rowid = (?3)",
        params![completed, completed_at, milestone_id],
    )?;

    Ok(())
}

pub fn delete_milestone_from_db(
    milestone_id: MilestoneID,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "DELETE FROM steps WHERE milestone_id = (?1)",
        params![milestone_id],
    )?;
    db_connection.execute(
        "DELETE FROM milestones WHERE rowid = (?1)",
        params![milestone_id],
    )?;

    Ok(())
}

pub fn add_step_to_db(
    request: &AddStepRequest,
    db_connection: &Connection,
) -> InternalResult<AddStepResult> {
    db_connection.execute(
        "INSERT INTO steps (goal_id, milestone_id, text, completed, completed_at, time_estimate, notes, created_at) VALUES (?1, ?2, ?3, 0, NULL, ?4, '', ?5)",
        params![
            request.goal_id,
            request.milestone_id,
            request.text.clone().unwrap_or_else(|| "New step".to_string()),
            request.time_estimate.unwrap_or(DEFAULT_TIME_ESTIMATE),
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(AddStepResult {
        step_id: db_connection.last_insert_rowid(),
    })
}

pub fn update_step_in_db(
    request: &SetStepRequest,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE steps SET text = (?1), time_estimate = (?2) WHERE rowid = (?3)",
        params![request.text, request.time_estimate, request.step_id],
    )?;

    Ok(())
}

pub fn set_step_notes_in_db(
    request: &SetStepNotesRequest,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE steps SET notes = (?1) WHERE rowid = (?2)",
        params![request.notes, request.step_id],
    )?;

    Ok(())
}

pub fn set_step_completion_in_db(
    step_id: StepID,
    completed: bool,
    completed_at: Option<i64>,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE steps SET completed = (?1), completed_at = (?2) WHERE rowid = (?3)",
        params![completed, completed_at, step_id],
    )?;

    Ok(())
}

pub fn delete_step_from_db(step_id: StepID, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute("DELETE FROM steps WHERE rowid = (?1)", params![step_id])?;

    Ok(())
}
