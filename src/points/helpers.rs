use rusqlite::Connection;

use crate::goals;
use crate::habits;
use crate::internal_error::{InternalError, InternalResult};
use crate::tasks;

use super::data::{ReconcileOutcome, SyncEvent};
use super::reconcile::PlannerState;

/// Load the full planner state from the store. Reconciliation always works
/// against a complete snapshot so the calculator never sees a partial view.
pub fn load_planner_state(db_connection: &Connection) -> InternalResult<PlannerState> {
    Ok(PlannerState::new(
        goals::helpers::get_all_goals_from_db(db_connection)?,
        tasks::helpers::get_all_tasks_from_db(db_connection)?,
        habits::helpers::get_all_habits_from_db(db_connection)?,
    ))
}

/// Persist the rows a reconciliation outcome touched through propagation,
/// plus every recomputed goal total. The directly-toggled entity is written
/// by the endpoint that owns it.
pub fn persist_outcome(
    state: &PlannerState,
    outcome: &ReconcileOutcome,
    db_connection: &Connection,
) -> InternalResult<()> {
    for event in outcome.events.iter() {
        match event {
            SyncEvent::LinkedTaskUpdated { task_id, .. } => {
                let task = state
                    .task(*task_id)
                    .ok_or_else(|| InternalError::from("Synchronized task missing from state"))?;
                tasks::helpers::set_task_completion_in_db(
                    *task_id,
                    task.completed,
                    task.completed_at,
                    db_connection,
                )?;
            }
            SyncEvent::LinkedStepUpdated {
                goal_id,
                milestone_id,
                step_id,
                ..
            } => {
                let step = state
                    .goal(*goal_id)
                    .and_then(|goal| goal.milestone(*milestone_id))
                    .and_then(|milestone| milestone.step(*step_id))
                    .ok_or_else(|| InternalError::from("Synchronized step missing from state"))?;
                goals::helpers::set_step_completion_in_db(
                    *step_id,
                    step.completed,
                    step.completed_at,
                    db_connection,
                )?;
            }
        }
    }

    for goal_points in outcome.points.iter() {
        goals::helpers::set_goal_current_points_in_db(
            goal_points.goal_id,
            goal_points.current_points,
            db_connection,
        )?;
    }

    Ok(())
}
