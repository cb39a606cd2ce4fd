use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct ClarifyGoalRequest {
    pub goal: String,
}

#[derive(Serialize, Debug)]
pub struct ClarifyGoalResponse {
    pub clarified_goal: String,
}

#[derive(Deserialize, Debug)]
pub struct GenerateMilestonesRequest {
    pub goal: String,
    pub purpose: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct GenerateMilestonesResponse {
    pub milestones: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeneratedStep {
    pub text: String,
    pub time_estimate: i64,
}

#[derive(Deserialize, Debug)]
pub struct GenerateStepsRequest {
    pub goal_title: String,
    pub milestone_title: String,
    pub purpose: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Serialize, Debug)]
pub struct GenerateStepsResponse {
    pub steps: Vec<GeneratedStep>,
}

/// Prior step context for next-step generation; order is the display order.
#[derive(Deserialize, Debug)]
pub struct StepContext {
    pub text: String,
    pub completed: bool,
}

#[derive(Deserialize, Debug)]
pub struct NextStepRequest {
    pub goal: String,
    pub milestone: Option<String>,
    pub purpose: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub steps: Vec<StepContext>,
}

#[derive(Serialize, Debug)]
pub struct NextStepResponse {
    pub next_step: String,
    pub time_estimate: i64,
}
