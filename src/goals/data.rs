use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type GoalID = i64;
pub type MilestoneID = i64;
pub type StepID = i64;

pub const DEFAULT_TOTAL_POINTS: i64 = 50;
pub const DEFAULT_MILESTONE_BONUS: i64 = 50;
pub const DEFAULT_TIME_ESTIMATE: i64 = 30;

/// A small actionable unit owned by exactly one milestone.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Step {
    pub id: StepID,
    pub text: String,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub time_estimate: i64,
    pub notes: String,
    pub created_at: String,
}

/// A checkpoint within a goal, worth `bonus_points` exactly once while completed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Milestone {
    pub id: MilestoneID,
    pub title: String,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub bonus_points: i64,
    pub steps: Vec<Step>,
    pub created_at: String,
}

/// A tracked objective with a points budget. `current_points` is derived:
/// it is recomputed from tasks, steps, milestones and habits, never authored
/// directly, and always clamped into `[0, total_points]`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Goal {
    pub id: GoalID,
    pub title: String,
    pub purpose: String,
    pub due_date: Option<NaiveDate>,
    pub total_points: i64,
    pub current_points: i64,
    pub milestones: Vec<Milestone>,
    pub created_at: String,
}

impl Goal {
    pub fn milestone(&self, milestone_id: MilestoneID) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == milestone_id)
    }

    pub fn milestone_mut(&mut self, milestone_id: MilestoneID) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == milestone_id)
    }
}

impl Milestone {
    pub fn step(&self, step_id: StepID) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn step_mut(&mut self, step_id: StepID) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }
}

#[derive(Deserialize, Debug)]
pub struct AddGoalRequest {
    pub title: String,
    pub purpose: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub total_points: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct AddGoalResult {
    pub goal_id: GoalID,
}

#[derive(Deserialize, Debug)]
pub struct SetGoalRequest {
    pub goal_id: GoalID,
    pub title: String,
    pub purpose: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
pub struct SetGoalPointsRequest {
    pub goal_id: GoalID,
    pub total_points: i64,
}

#[derive(Deserialize, Debug)]
pub struct DeleteGoalRequest {
    pub goal_id: GoalID,
}

#[derive(Deserialize, Debug)]
pub struct AddMilestoneRequest {
    pub goal_id: GoalID,
    pub title: String,
    pub bonus_points: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct AddMilestoneResult {
    pub milestone_id: MilestoneID,
}

#[derive(Deserialize, Debug)]
pub struct SetMilestoneRequest {
    pub milestone_id: MilestoneID,
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct AddStepRequest {
    pub goal_id: GoalID,
    pub milestone_id: MilestoneID,
    pub text: Option<String>,
    pub time_estimate: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct AddStepResult {
    pub step_id: StepID,
}

#[derive(Deserialize, Debug)]
pub struct SetStepRequest {
    pub step_id: StepID,
    pub text: String,
    pub time_estimate: i64,
}

#[derive(Deserialize, Debug)]
pub struct SetStepNotesRequest {
    pub step_id: StepID,
    pub notes: String,
}

#[derive(Deserialize, Debug)]
pub struct DeleteStepRequest {
    pub goal_id: GoalID,
    pub step_id: StepID,
}
