use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::goals::data::DEFAULT_TIME_ESTIMATE;
use crate::internal_error::InternalResult;

use super::data::*;

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: Option<String> = row.get(3)?;
    let tags: Option<String> = row.get(6)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        time_estimate: row
            .get::<_, Option<i64>>(2)?
            .unwrap_or(DEFAULT_TIME_ESTIMATE),
        priority: TaskPriority::parse(priority.as_deref().unwrap_or_default()),
        completed: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
        completed_at: row.get(5)?,
        // Tags are stored as a JSON array; anything unreadable becomes empty.
        tags: tags
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default(),
        goal_id: row.get(7)?,
        source_step_id: row.get(8)?,
        source_milestone_id: row.get(9)?,
        created_at: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
    })
}

pub fn get_all_tasks_from_db(db_connection: &Connection) -> InternalResult<Vec<Task>> {
    let mut task_statement = db_connection.prepare(
        "SELECT rowid, title, time_estimate, priority, completed, completed_at, tags, goal_id, source_step_id, source_milestone_id, created_at FROM tasks ORDER BY rowid",
    )?;

    let mut tasks = vec![];
    let task_rows = task_statement.query_map(params![], |row| task_from_row(row))?;
    for row_result in task_rows {
        tasks.push(row_result?);
    }

    Ok(tasks)
}

pub fn add_task_to_db(new_task: &NewTask, db_connection: &Connection) -> InternalResult<TaskID> {
    db_connection.execute(
        "INSERT INTO tasks (title, time_estimate, priority, completed, completed_at, tags, goal_id, source_step_id, source_milestone_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            new_task.title,
            new_task.time_estimate,
            new_task.priority.as_str(),
            new_task.completed,
            new_task.completed_at,
            serde_json::to_string(&new_task.tags)?,
            new_task.goal_id,
            new_task.source_step_id,
            new_task.source_milestone_id,
            new_task.created_at,
        ],
    )?;

    Ok(db_connection.last_insert_rowid())
}

pub fn set_task_completion_in_db(
    task_id: TaskID,
    completed: bool,
    completed_at: Option<i64>,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE tasks SET completed = (?1), completed_at = (?2) WHERE rowid = (?3)",
        params![completed, completed_at, task_id],
    )?;

    Ok(())
}

pub fn set_task_priority_in_db(
    task_id: TaskID,
    priority: TaskPriority,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE tasks SET priority = (?1) WHERE rowid = (?2)",
        params![priority.as_str(), task_id],
    )?;

    Ok(())
}

pub fn delete_task_from_db(task_id: TaskID, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute("DELETE FROM tasks WHERE rowid = (?1)", params![task_id])?;

    Ok(())
}

pub fn new_task_from_request(request: &AddTaskRequest) -> NewTask {
    NewTask {
        title: request.title.clone(),
        time_estimate: request.time_estimate.unwrap_or(DEFAULT_TIME_ESTIMATE),
        priority: request
            .priority
            .unwrap_or(TaskPriority::ImportantNotUrgent),
        completed: false,
        completed_at: None,
        tags: request.tags.clone().unwrap_or_default(),
        goal_id: request.goal_id,
        source_step_id: None,
        source_milestone_id: None,
        created_at: Utc::now().to_rfc3339(),
    }
}
