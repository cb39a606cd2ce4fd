use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::helpers::*;
use crate::data::DBConnection;
use crate::points::data::ReconcileOutcome;
use crate::points::helpers::{load_planner_state, persist_outcome};

#[get("/get_goals")]
pub fn get_goals(db_connection: &State<DBConnection>) -> InternalResult<Json<Vec<Goal>>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    // A full load doubles as the recomputation point after external changes:
    // habit credit from a previous day drops out here.
    let mut state = load_planner_state(&db_connection)?;
    let points = state.recompute_all(today);
    let outcome = ReconcileOutcome {
        events: vec![],
        points,
    };
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(state.goals))
}

#[post("/add_goal", format = "json", data = "<request>")]
pub fn add_goal(
    request: Json<AddGoalRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<AddGoalResult>> {
    if request.title.trim().is_empty() {
        return Err(InternalError::bad_request("Goal title is required"));
    }

    let db_connection = db_connection.lock()?;
    add_goal_to_db(&request.into_inner(), &db_connection).map(Json)
}

#[post("/set_goal", format = "json", data = "<request>")]
pub fn set_goal(
    request: Json<SetGoalRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<()> {
    if request.title.trim().is_empty() {
        return Err(InternalError::bad_request("Goal title is required"));
    }

    let db_connection = db_connection.lock()?;
    update_goal_in_db(&request.into_inner(), &db_connection)
}

#[post("/set_goal_points", format = "json", data = "<request>")]
pub fn set_goal_points(
    request: Json<SetGoalPointsRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    let mut state = load_planner_state(&db_connection)?;
    let outcome = state.set_goal_total_points(request.goal_id, request.total_points, today)?;

    set_goal_total_points_in_db(request.goal_id, request.total_points, &db_connection)?;
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(outcome))
}

#[post("/delete_goal", format = "json", data = "<request>")]
pub fn delete_goal(
    request: Json<DeleteGoalRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<()> {
    let db_connection = db_connection.lock()?;
    delete_goal_from_db(request.goal_id, &db_connection)
}

#[post("/add_milestone", format = "json", data = "<request>")]
pub fn add_milestone(
    request: Json<AddMilestoneRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<AddMilestoneResult>> {
    if request.title.trim().is_empty() {
        return Err(InternalError::bad_request("Milestone title is required"));
    }

    let db_connection = db_connection.lock()?;
    add_milestone_to_db(&request.into_inner(), &db_connection).map(Json)
}

#[post("/set_milestone", format = "json", data = "<request>")]
pub fn set_milestone(
    request: Json<SetMilestoneRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<()> {
    if request.title.trim().is_empty() {
        return Err(InternalError::bad_request("Milestone title is required"));
    }

    let db_connection = db_connection.lock()?;
    update_milestone_in_db(&request.into_inner(), &db_connection)
}

#[post("/add_step", format = "json", data = "<request>")]
pub fn add_step(
    request: Json<AddStepRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<AddStepResult>> {
    let db_connection = db_connection.lock()?;
    add_step_to_db(&request.into_inner(), &db_connection).map(Json)
}

#[post("/set_step", format = "json", data = "<request>")]
pub fn set_step(
    request: Json<SetStepRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<()> {
    let db_connection = db_connection.lock()?;
    update_step_in_db(&request.into_inner(), &db_connection)
}

#[post("/set_step_notes", format = "json", data = "<request>")]
pub fn set_step_notes(
    request: Json<SetStepNotesRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<()> {
    let db_connection = db_connection.lock()?;
    set_step_notes_in_db(&request.into_inner(), &db_connection)
}

#[post("/delete_step", format = "json", data = "<request>")]
pub fn delete_step(
    request: Json<DeleteStepRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    delete_step_from_db(request.step_id, &db_connection)?;

    // A completed unlinked step carried a point; recompute over what is left.
    let mut state = load_planner_state(&db_connection)?;
    let points = state.recompute_goal(request.goal_id, today).into_iter().collect();
    let outcome = ReconcileOutcome {
        events: vec![],
        points,
    };
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(outcome))
}
