use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::helpers::*;
use crate::data::DBConnection;
use crate::points::data::ReconcileOutcome;
use crate::points::helpers::{load_planner_state, persist_outcome};

#[get("/get_tasks")]
pub fn get_tasks(db_connection: &State<DBConnection>) -> InternalResult<Json<Vec<Task>>> {
    let db_connection = db_connection.lock()?;
    get_all_tasks_from_db(&db_connection).map(Json)
}

#[post("/add_task", format = "json", data = "<request>")]
pub fn add_task(
    request: Json<AddTaskRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<AddTaskResult>> {
    if request.title.trim().is_empty() {
        return Err(InternalError::bad_request("Task title is required"));
    }

    let db_connection = db_connection.lock()?;
    let new_task = new_task_from_request(&request.into_inner());
    let task_id = add_task_to_db(&new_task, &db_connection)?;

    Ok(Json(AddTaskResult { task_id }))
}

#[post("/move_task", format = "json", data = "<request>")]
pub fn move_task(
    request: Json<MoveTaskRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<MoveTaskResult>> {
    let db_connection = db_connection.lock()?;

    let tasks = get_all_tasks_from_db(&db_connection)?;
    let task = tasks
        .iter()
        .find(|t| t.id == request.task_id)
        .ok_or_else(|| InternalError::not_found("No such task"))?;

    let priority = match request.direction {
        MoveDirection::Up => task.priority.move_up(),
        MoveDirection::Down => task.priority.move_down(),
    };

    // Boundary moves are no-ops.
    if priority != task.priority {
        set_task_priority_in_db(request.task_id, priority, &db_connection)?;
    }

    Ok(Json(MoveTaskResult {
        task_id: request.task_id,
        priority,
    }))
}

#[post("/delete_task", format = "json", data = "<request>")]
pub fn delete_task(
    request: Json<DeleteTaskRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    let mut state = load_planner_state(&db_connection)?;
    let task = state
        .task(request.task_id)
        .cloned()
        .ok_or_else(|| InternalError::not_found("No such task"))?;

    delete_task_from_db(request.task_id, &db_connection)?;
    state.tasks.retain(|t| t.id != request.task_id);

    // Removing a linked task can hand the point back to its source step, so
    // a recompute is required even when the task itself was incomplete.
    let points = match task.goal_id {
        Some(goal_id) => state.recompute_goal(goal_id, today).into_iter().collect(),
        None => vec![],
    };
    let outcome = ReconcileOutcome {
        events: vec![],
        points,
    };
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(outcome))
}
