use serde::{Deserialize, Serialize};

use crate::goals::data::{GoalID, MilestoneID, StepID};

pub type TaskID = i64;

/// Urgency/importance matrix position, ordered from most to least pressing.
/// Priority moves shift exactly one position and clamp at the ends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    UrgentImportant,
    UrgentNotImportant,
    ImportantNotUrgent,
    Neither,
}

impl TaskPriority {
    pub fn move_up(self) -> TaskPriority {
        match self {
            TaskPriority::UrgentImportant => TaskPriority::UrgentImportant,
            TaskPriority::UrgentNotImportant => TaskPriority::UrgentImportant,
            TaskPriority::ImportantNotUrgent => TaskPriority::UrgentNotImportant,
            TaskPriority::Neither => TaskPriority::ImportantNotUrgent,
        }
    }

    pub fn move_down(self) -> TaskPriority {
        match self {
            TaskPriority::UrgentImportant => TaskPriority::UrgentNotImportant,
            TaskPriority::UrgentNotImportant => TaskPriority::ImportantNotUrgent,
            TaskPriority::ImportantNotUrgent => TaskPriority::Neither,
            TaskPriority::Neither => TaskPriority::Neither,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::UrgentImportant => "urgent-important",
            TaskPriority::UrgentNotImportant => "urgent-not-important",
            TaskPriority::ImportantNotUrgent => "important-not-urgent",
            TaskPriority::Neither => "neither",
        }
    }

    /// Lenient parse for stored values; unknown strings fall back to the
    /// default priority new tasks get.
    pub fn parse(s: &str) -> TaskPriority {
        match s {
            "urgent-important" => TaskPriority::UrgentImportant,
            "urgent-not-important" => TaskPriority::UrgentNotImportant,
            "important-not-urgent" => TaskPriority::ImportantNotUrgent,
            "neither" => TaskPriority::Neither,
            _ => TaskPriority::ImportantNotUrgent,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// A standalone actionable item. `goal_id` of `None` means ad hoc: the task
/// belongs to no goal and contributes no points. `source_step_id` and
/// `source_milestone_id` are set iff the task was materialized from a step.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub id: TaskID,
    pub title: String,
    pub time_estimate: i64,
    pub priority: TaskPriority,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub tags: Vec<String>,
    pub goal_id: Option<GoalID>,
    pub source_step_id: Option<StepID>,
    pub source_milestone_id: Option<MilestoneID>,
    pub created_at: String,
}

/// A task that has not been inserted yet and so has no id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub time_estimate: i64,
    pub priority: TaskPriority,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub tags: Vec<String>,
    pub goal_id: Option<GoalID>,
    pub source_step_id: Option<StepID>,
    pub source_milestone_id: Option<MilestoneID>,
    pub created_at: String,
}

impl NewTask {
    pub fn into_task(self, id: TaskID) -> Task {
        Task {
            id,
            title: self.title,
            time_estimate: self.time_estimate,
            priority: self.priority,
            completed: self.completed,
            completed_at: self.completed_at,
            tags: self.tags,
            goal_id: self.goal_id,
            source_step_id: self.source_step_id,
            source_milestone_id: self.source_milestone_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AddTaskRequest {
    pub title: String,
    pub time_estimate: Option<i64>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<Vec<String>>,
    pub goal_id: Option<GoalID>,
}

#[derive(Serialize, Debug)]
pub struct AddTaskResult {
    pub task_id: TaskID,
}

#[derive(Deserialize, Debug)]
pub struct MoveTaskRequest {
    pub task_id: TaskID,
    pub direction: MoveDirection,
}

#[derive(Serialize, Debug)]
pub struct MoveTaskResult {
    pub task_id: TaskID,
    pub priority: TaskPriority,
}

#[derive(Deserialize, Debug)]
pub struct DeleteTaskRequest {
    pub task_id: TaskID,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_up_clamps_at_highest_priority() {
        assert_eq!(
            TaskPriority::UrgentImportant.move_up(),
            TaskPriority::UrgentImportant
        );
        assert_eq!(
            TaskPriority::Neither.move_up(),
            TaskPriority::ImportantNotUrgent
        );
    }

    #[test]
    fn move_down_clamps_at_lowest_priority() {
        assert_eq!(TaskPriority::Neither.move_down(), TaskPriority::Neither);
        assert_eq!(
            TaskPriority::UrgentImportant.move_down(),
            TaskPriority::UrgentNotImportant
        );
    }

    #[test]
    fn priority_round_trips_through_storage_strings() {
        for priority in [
            TaskPriority::UrgentImportant,
            TaskPriority::UrgentNotImportant,
            TaskPriority::ImportantNotUrgent,
            TaskPriority::Neither,
        ]
        .iter()
        {
            assert_eq!(TaskPriority::parse(priority.as_str()), *priority);
        }
    }

    #[test]
    fn unknown_priority_string_falls_back_to_default() {
        assert_eq!(
            TaskPriority::parse("somewhat-urgent"),
            TaskPriority::ImportantNotUrgent
        );
    }
}
