use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::helpers::*;
use crate::data::DBConnection;
use crate::points::data::ReconcileOutcome;
use crate::points::helpers::{load_planner_state, persist_outcome};

#[get("/get_habits")]
pub fn get_habits(db_connection: &State<DBConnection>) -> InternalResult<Json<Vec<Habit>>> {
    let db_connection = db_connection.lock()?;
    get_all_habits_from_db(&db_connection).map(Json)
}

#[post("/add_habit", format = "json", data = "<request>")]
pub fn add_habit(
    request: Json<AddHabitRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<AddHabitResult>> {
    if request.title.trim().is_empty() {
        return Err(InternalError::bad_request("Habit title is required"));
    }

    let db_connection = db_connection.lock()?;
    add_habit_to_db(&request.into_inner(), &db_connection).map(Json)
}

#[post("/delete_habit", format = "json", data = "<request>")]
pub fn delete_habit(
    request: Json<DeleteHabitRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ReconcileOutcome>> {
    let db_connection = db_connection.lock()?;
    let today = Utc::now().date_naive();

    let mut state = load_planner_state(&db_connection)?;
    let habit = state
        .habits
        .iter()
        .find(|h| h.id == request.habit_id)
        .cloned()
        .ok_or_else(|| InternalError::not_found("No such habit"))?;

    delete_habit_from_db(request.habit_id, &db_connection)?;
    state.habits.retain(|h| h.id != request.habit_id);

    // A habit completed today was feeding its goals; settle them now.
    let points = habit
        .goal_ids
        .iter()
        .filter_map(|goal_id| state.recompute_goal(*goal_id, today))
        .collect();
    let outcome = ReconcileOutcome {
        events: vec![],
        points,
    };
    persist_outcome(&state, &outcome, &db_connection)?;

    Ok(Json(outcome))
}
