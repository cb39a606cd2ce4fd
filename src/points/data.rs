use serde::{Deserialize, Serialize};

use crate::goals::data::{GoalID, MilestoneID, StepID};
use crate::habits::data::HabitID;
use crate::tasks::data::TaskID;

/// Emitted when a reconciliation operation propagated a change to the linked
/// counterpart of the entity the caller actually toggled. Direct mutations do
/// not produce events.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    LinkedTaskUpdated {
        task_id: TaskID,
        completed: bool,
    },
    LinkedStepUpdated {
        goal_id: GoalID,
        milestone_id: MilestoneID,
        step_id: StepID,
        completed: bool,
    },
}

/// Recomputed points for one goal, already clamped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GoalPoints {
    pub goal_id: GoalID,
    pub current_points: i64,
}

/// The result of one reconciliation operation: every propagation that
/// happened plus every goal whose points were recomputed.
#[derive(Serialize, Debug, Clone)]
pub struct ReconcileOutcome {
    pub events: Vec<SyncEvent>,
    pub points: Vec<GoalPoints>,
}

#[derive(Deserialize, Debug)]
pub struct ToggleStepRequest {
    pub goal_id: GoalID,
    pub milestone_id: MilestoneID,
    pub step_id: StepID,
    pub completed: bool,
}

#[derive(Deserialize, Debug)]
pub struct ToggleTaskRequest {
    pub task_id: TaskID,
    pub completed: bool,
}

#[derive(Deserialize, Debug)]
pub struct ToggleMilestoneRequest {
    pub goal_id: GoalID,
    pub milestone_id: MilestoneID,
    pub completed: bool,
}

#[derive(Deserialize, Debug)]
pub struct DeleteMilestoneRequest {
    pub goal_id: GoalID,
    pub milestone_id: MilestoneID,
}

#[derive(Deserialize, Debug)]
pub struct ConvertStepRequest {
    pub goal_id: GoalID,
    pub milestone_id: MilestoneID,
    pub step_id: StepID,
}

#[derive(Serialize, Debug)]
pub struct ConvertStepResult {
    pub task_id: TaskID,
    pub points: Vec<GoalPoints>,
}

#[derive(Deserialize, Debug)]
pub struct ToggleHabitRequest {
    pub habit_id: HabitID,
}

#[derive(Serialize, Debug)]
pub struct ToggleHabitResult {
    pub completed_today: bool,
    pub points: Vec<GoalPoints>,
}
