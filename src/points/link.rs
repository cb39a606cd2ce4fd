//! Resolves the step/task back-reference so completed work is never counted
//! twice: a step whose materialized task exists is credited through the task.

use crate::goals::data::{GoalID, MilestoneID, StepID};
use crate::tasks::data::Task;

fn links_step(task: &Task, goal_id: GoalID, milestone_id: MilestoneID, step_id: StepID) -> bool {
    task.source_step_id == Some(step_id)
        && task.source_milestone_id == Some(milestone_id)
        && task.goal_id == Some(goal_id)
}

pub fn is_step_linked(
    goal_id: GoalID,
    milestone_id: MilestoneID,
    step_id: StepID,
    tasks: &[Task],
) -> bool {
    tasks
        .iter()
        .any(|task| links_step(task, goal_id, milestone_id, step_id))
}

/// The canonical linked task for synchronization. Duplicate back-references
/// are a data anomaly; the lowest task id wins so the choice is stable.
pub fn find_linked_task<'a>(
    goal_id: GoalID,
    milestone_id: MilestoneID,
    step_id: StepID,
    tasks: &'a [Task],
) -> Option<&'a Task> {
    tasks
        .iter()
        .filter(|task| links_step(task, goal_id, milestone_id, step_id))
        .min_by_key(|task| task.id)
}
