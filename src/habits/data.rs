use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::goals::data::GoalID;

pub type HabitID = i64;

pub const DEFAULT_HABIT_POINT_VALUE: f64 = 0.25;

/// One completion record per calendar day.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HabitCompletion {
    pub date: NaiveDate,
    pub timestamp: i64,
}

/// A recurring daily action. Completing it on the current day contributes
/// `point_value` to every goal in `goal_ids`, for that day only.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Habit {
    pub id: HabitID,
    pub title: String,
    pub description: Option<String>,
    pub goal_ids: Vec<GoalID>,
    pub completions: Vec<HabitCompletion>,
    pub point_value: f64,
    pub created_at: String,
}

impl Habit {
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        self.completions.iter().any(|c| c.date == day)
    }
}

#[derive(Deserialize, Debug)]
pub struct AddHabitRequest {
    pub title: String,
    pub description: Option<String>,
    pub goal_ids: Vec<GoalID>,
}

#[derive(Serialize, Debug)]
pub struct AddHabitResult {
    pub habit_id: HabitID,
}

#[derive(Deserialize, Debug)]
pub struct DeleteHabitRequest {
    pub habit_id: HabitID,
}
