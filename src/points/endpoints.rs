//! Routes for the operations that cross entity boundaries: completion
//! toggles, step-to-task conversion and milestone deletion. Each one loads a
//! full state snapshot, reconciles in memory, persists what changed and
//! returns the propagation events plus the recomputed totals.

use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{post, State};
use tracing::info;

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::helpers::{load_planner_state, persist_outcome};
use crate::data::DBConnection;
use crate::goals;
use crate::tasks;

#[post("/toggle_step", format = "json", data = "<request>")]
pub fn toggle_step(
    request: Json<ToggleStepRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();
    let now = Utc::now().timestamp();

    let mut state = load_planner_state(&db_connection)?;
    let outcome = state.toggle_step_completion(
        request.goal_id,
        request.milestone_id,
        request.step_id,
        request.completed,
        today,
        now,
    )?;

    let step = state
        .goal(request.goal_id)
        .and_then(|goal| goal.milestone(request.milestone_id))
        .and_then(|milestone| milestone.step(request.step_id))
        .ok_or_else(|| InternalError::not_found("No such step"))?;
    goals::helpers::set_step_completion_in_db(
        request.step_id,
        step.completed,
        step.completed_at,
        &db_connection,
    )?;
    persist_outcome(&state, &outcome, &db_connection)?;

    if !outcome.events.is_empty() {
        info!(step_id = request.step_id, "step toggle propagated to linked task");
    }

    Ok(Json(outcome))
}

#[post("/toggle_task", format = "json", data = "<request>")]
pub fn toggle_task(
    request: Json<ToggleTaskRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();
    let now = Utc::now().timestamp();

    let mut state = load_planner_state(&db_connection)?;
    let outcome =
        state.toggle_task_completion(request.task_id, request.completed, today, now)?;

    let task = state
        .task(request.task_id)
        .ok_or_else(|| InternalError::not_found("No such task"))?;
    tasks::helpers::set_task_completion_in_db(
        request.task_id,
        task.completed,
        task.completed_at,
        &db_connection,
    )?;
    persist_outcome(&state, &outcome, &db_connection)?;

    if !outcome.events.is_empty() {
        info!(task_id = request.task_id, "task toggle propagated to linked step");
    }

    Ok(Json(outcome))
}

#[post("/toggle_milestone", format = "json", data = "<request>")]
pub fn toggle_milestone(
    request: Json<ToggleMilestoneRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();
    let now = Utc::now().timestamp();

    let mut state = load_planner_state(&db_connection)?;
    let outcome = state.toggle_milestone_completion(
        request.goal_id,
        request.milestone_id,
        request.completed,
        today,
        now,
    )?;

    let milestone = state
        .goal(request.goal_id)
        .and_then(|goal| goal.milestone(request.milestone_id))
        .ok_or_else(|| InternalError::not_found("No such milestone"))?;
    goals::helpers::set_milestone_completion_in_db(
        request.milestone_id,
        milestone.completed,
        milestone.completed_at,
        &db_connection,
    )?;
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(outcome))
}

#[post("/delete_milestone", format = "json", data = "<request>")]
pub fn delete_milestone(
    request: Json<DeleteMilestoneRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    let mut state = load_planner_state(&db_connection)?;
    let outcome = state.delete_milestone(request.goal_id, request.milestone_id, today)?;

    goals::helpers::delete_milestone_from_db(request.milestone_id, &db_connection)?;
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(outcome))
}

#[post("/convert_step_to_task", format = "json", data = "<request>")]
pub fn convert_step_to_task(
    request: Json<ConvertStepRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ConvertStepResult>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    let mut state = load_planner_state(&db_connection)?;
    let draft = state.convert_step_to_task(
        request.goal_id,
        request.milestone_id,
        request.step_id,
        Utc::now().to_rfc3339(),
    )?;

    let task_id = tasks::helpers::add_task_to_db(&draft, &db_connection)?;
    state.tasks.push(draft.into_task(task_id));

    // The credit moves from the step to the task; the total stays put, but
    // recomputing keeps the stored value authoritative.
    let points = state
        .recompute_goal(request.goal_id, today)
        .into_iter()
        .collect();
    let outcome = ReconcileOutcome {
        events: vec![],
        points,
    };
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(ConvertStepResult {
        task_id,
        points: outcome.points,
    }))
}

#[post("/toggle_habit", format = "json", data = "<request>")]
pub fn toggle_habit(
    request: Json<ToggleHabitRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ToggleHabitResult>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();
    let now = Utc::now().timestamp();

    let mut state = load_planner_state(&db_connection)?;
    let (completed_today, points) = state.toggle_habit_today(request.habit_id, today, now)?;

    if completed_today {
        crate::habits::helpers::add_habit_completion_in_db(
            request.habit_id,
            today,
            now,
            &db_connection,
        )?;
    } else {
        crate::habits::helpers::delete_habit_completion_in_db(
            request.habit_id,
            today,
            &db_connection,
        )?;
    }

    let outcome = ReconcileOutcome {
        events: vec![],
        points: points.clone(),
    };
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(ToggleHabitResult {
        completed_today,
        points,
    }))
}
