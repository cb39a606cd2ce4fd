//! Reconciliation over the goal/task/habit collections.
//!
//! Every mutation of a completion flag funnels through [`PlannerState`] so
//! that a change to one side of a step/task link always reaches the other
//! side before points are recomputed, and the recomputation runs exactly
//! once per logical operation. The `synchronizing` flag marks the window in
//! which a propagation is still in flight; point recomputation refuses to
//! run inside it, so an observer can never read totals derived from a
//! half-applied link update.

use chrono::NaiveDate;

use super::calc;
use super::data::{GoalPoints, ReconcileOutcome, SyncEvent};
use super::link;
use crate::goals::data::{Goal, GoalID, MilestoneID, StepID};
use crate::habits::data::{Habit, HabitCompletion, HabitID};
use crate::internal_error::{InternalError, InternalResult};
use crate::tasks::data::{NewTask, Task, TaskID, TaskPriority};

pub struct PlannerState {
    pub goals: Vec<Goal>,
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    synchronizing: bool,
}

impl PlannerState {
    pub fn new(goals: Vec<Goal>, tasks: Vec<Task>, habits: Vec<Habit>) -> PlannerState {
        PlannerState {
            goals,
            tasks,
            habits,
            synchronizing: false,
        }
    }

    pub fn goal(&self, goal_id: GoalID) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub fn task(&self, task_id: TaskID) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Recompute one goal's points and store the clamped result. Returns
    /// `None` while a propagation is in flight or the goal does not exist.
    pub fn recompute_goal(&mut self, goal_id: GoalID, today: NaiveDate) -> Option<GoalPoints> {
        if self.synchronizing {
            return None;
        }

        let tasks = &self.tasks;
        let habits = &self.habits;
        let goal = self.goals.iter_mut().find(|g| g.id == goal_id)?;

        let current_points = calc::goal_points(goal, tasks, habits, today);
        goal.current_points = current_points;

        Some(GoalPoints {
            goal_id,
            current_points,
        })
    }

    /// Recompute every goal; used after bulk loads from the store.
    pub fn recompute_all(&mut self, today: NaiveDate) -> Vec<GoalPoints> {
        let goal_ids: Vec<GoalID> = self.goals.iter().map(|g| g.id).collect();

        goal_ids
            .into_iter()
            .filter_map(|goal_id| self.recompute_goal(goal_id, today))
            .collect()
    }

    /// Toggle a step's completion. When a task was materialized from the
    /// step, the change is driven through the task path so both sides end in
    /// agreement with a single recomputation; otherwise the step is set
    /// directly and nothing else is touched.
    pub fn toggle_step_completion(
        &mut self,
        goal_id: GoalID,
        milestone_id: MilestoneID,
        step_id: StepID,
        completed: bool,
        today: NaiveDate,
        now: i64,
    ) -> InternalResult<ReconcileOutcome> {
        self.require_step(goal_id, milestone_id, step_id)?;

        let linked_task_id = link::find_linked_task(goal_id, milestone_id, step_id, &self.tasks)
            .map(|task| task.id);

        if let Some(task_id) = linked_task_id {
            let mut outcome = self.toggle_task_completion(task_id, completed, today, now)?;
            outcome
                .events
                .push(SyncEvent::LinkedTaskUpdated { task_id, completed });
            return Ok(outcome);
        }

        self.synchronizing = true;
        self.set_step_completed(goal_id, milestone_id, step_id, completed, now);
        self.synchronizing = false;

        Ok(ReconcileOutcome {
            events: vec![],
            points: self.recompute_goal(goal_id, today).into_iter().collect(),
        })
    }

    /// Toggle a task's completion and bring its source step, if any, into
    /// agreement. Points for the task's goal are recomputed once, after both
    /// mutations have been applied.
    pub fn toggle_task_completion(
        &mut self,
        task_id: TaskID,
        completed: bool,
        today: NaiveDate,
        now: i64,
    ) -> InternalResult<ReconcileOutcome> {
        let (goal_id, source_step_id, source_milestone_id) = {
            let task = self
                .tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| InternalError::not_found("No such task"))?;

            task.completed = completed;
            task.completed_at = if completed { Some(now) } else { None };

            (task.goal_id, task.source_step_id, task.source_milestone_id)
        };

        let mut events = vec![];
        if let (Some(goal_id), Some(milestone_id), Some(step_id)) =
            (goal_id, source_milestone_id, source_step_id)
        {
            self.synchronizing = true;
            if self.set_step_completed(goal_id, milestone_id, step_id, completed, now) {
                events.push(SyncEvent::LinkedStepUpdated {
                    goal_id,
                    milestone_id,
                    step_id,
                    completed,
                });
            }
            self.synchronizing = false;
        }

        let points = match goal_id {
            Some(goal_id) => self.recompute_goal(goal_id, today).into_iter().collect(),
            None => vec![],
        };

        Ok(ReconcileOutcome { events, points })
    }

    /// Toggle a milestone. Steps are untouched in both directions: closing a
    /// milestone early or reopening it says nothing about its steps.
    pub fn toggle_milestone_completion(
        &mut self,
        goal_id: GoalID,
        milestone_id: MilestoneID,
        completed: bool,
        today: NaiveDate,
        now: i64,
    ) -> InternalResult<ReconcileOutcome> {
        let goal = self
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| InternalError::not_found("No such goal"))?;
        let milestone = goal
            .milestone_mut(milestone_id)
            .ok_or_else(|| InternalError::not_found("No such milestone"))?;

        milestone.completed = completed;
        milestone.completed_at = if completed { Some(now) } else { None };

        Ok(ReconcileOutcome {
            events: vec![],
            points: self.recompute_goal(goal_id, today).into_iter().collect(),
        })
    }

    /// Remove a milestone and recompute over the survivors. A completed
    /// milestone's bonus disappears with it through the recomputation; the
    /// bonus is never hand-subtracted, so the two adjustments cannot drift.
    pub fn delete_milestone(
        &mut self,
        goal_id: GoalID,
        milestone_id: MilestoneID,
        today: NaiveDate,
    ) -> InternalResult<ReconcileOutcome> {
        let goal = self
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| InternalError::not_found("No such goal"))?;

        let before = goal.milestones.len();
        goal.milestones.retain(|m| m.id != milestone_id);
        if goal.milestones.len() == before {
            return Err(InternalError::not_found("No such milestone"));
        }

        Ok(ReconcileOutcome {
            events: vec![],
            points: self.recompute_goal(goal_id, today).into_iter().collect(),
        })
    }

    /// Build a task from a step, preserving the step's completion state at
    /// conversion time. The step itself is not mutated; the caller inserts
    /// the returned task into the collection. A step may have at most one
    /// live linked task, so a second conversion is rejected.
    pub fn convert_step_to_task(
        &self,
        goal_id: GoalID,
        milestone_id: MilestoneID,
        step_id: StepID,
        created_at: String,
    ) -> InternalResult<NewTask> {
        let step = self.require_step(goal_id, milestone_id, step_id)?;

        if link::is_step_linked(goal_id, milestone_id, step_id, &self.tasks) {
            return Err(InternalError::bad_request("Step already has a linked task"));
        }

        Ok(NewTask {
            title: step.text.clone(),
            time_estimate: step.time_estimate,
            priority: TaskPriority::ImportantNotUrgent,
            completed: step.completed,
            completed_at: step.completed_at,
            tags: vec![],
            goal_id: Some(goal_id),
            source_step_id: Some(step_id),
            source_milestone_id: Some(milestone_id),
            created_at,
        })
    }

    /// Flip today's completion record for a habit and recompute every goal
    /// the habit feeds. Returns whether the habit is now completed today.
    pub fn toggle_habit_today(
        &mut self,
        habit_id: HabitID,
        today: NaiveDate,
        now: i64,
    ) -> InternalResult<(bool, Vec<GoalPoints>)> {
        let (completed_today, goal_ids) = {
            let habit = self
                .habits
                .iter_mut()
                .find(|h| h.id == habit_id)
                .ok_or_else(|| InternalError::not_found("No such habit"))?;

            let was_completed = habit.completed_on(today);
            if was_completed {
                habit.completions.retain(|c| c.date != today);
            } else {
                habit.completions.push(HabitCompletion {
                    date: today,
                    timestamp: now,
                });
            }

            (!was_completed, habit.goal_ids.clone())
        };

        let points = goal_ids
            .into_iter()
            .filter_map(|goal_id| self.recompute_goal(goal_id, today))
            .collect();

        Ok((completed_today, points))
    }

    /// Change a goal's points budget; the current points re-clamp through
    /// the recomputation.
    pub fn set_goal_total_points(
        &mut self,
        goal_id: GoalID,
        total_points: i64,
        today: NaiveDate,
    ) -> InternalResult<ReconcileOutcome> {
        if total_points < 1 {
            return Err(InternalError::bad_request("Total points must be positive"));
        }

        let goal = self
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| InternalError::not_found("No such goal"))?;
        goal.total_points = total_points;

        Ok(ReconcileOutcome {
            events: vec![],
            points: self.recompute_goal(goal_id, today).into_iter().collect(),
        })
    }

    fn require_step(
        &self,
        goal_id: GoalID,
        milestone_id: MilestoneID,
        step_id: StepID,
    ) -> InternalResult<&crate::goals::data::Step> {
        self.goal(goal_id)
            .ok_or_else(|| InternalError::not_found("No such goal"))?
            .milestone(milestone_id)
            .ok_or_else(|| InternalError::not_found("No such milestone"))?
            .step(step_id)
            .ok_or_else(|| InternalError::not_found("No such step"))
    }

    fn set_step_completed(
        &mut self,
        goal_id: GoalID,
        milestone_id: MilestoneID,
        step_id: StepID,
        completed: bool,
        now: i64,
    ) -> bool {
        if let Some(goal) = self.goals.iter_mut().find(|g| g.id == goal_id) {
            if let Some(milestone) = goal.milestone_mut(milestone_id) {
                if let Some(step) = milestone.step_mut(step_id) {
                    step.completed = completed;
                    step.completed_at = if completed { Some(now) } else { None };
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::data::{Milestone, Step};

    const TODAY: &str = "2026-08-06";
    const NOW: i64 = 1_775_000_000;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn step(id: i64) -> Step {
        Step {
            id,
            text: format!("step {}", id),
            completed: false,
            completed_at: None,
            time_estimate: 30,
            notes: String::new(),
            created_at: String::new(),
        }
    }

    fn milestone(id: i64, bonus_points: i64, steps: Vec<Step>) -> Milestone {
        Milestone {
            id,
            title: format!("milestone {}", id),
            completed: false,
            completed_at: None,
            bonus_points,
            steps,
            created_at: String::new(),
        }
    }

    fn goal(id: i64, total_points: i64, milestones: Vec<Milestone>) -> Goal {
        Goal {
            id,
            title: format!("goal {}", id),
            purpose: String::new(),
            due_date: None,
            total_points,
            current_points: 0,
            milestones,
            created_at: String::new(),
        }
    }

    fn habit(id: i64, goal_ids: Vec<i64>) -> Habit {
        Habit {
            id,
            title: format!("habit {}", id),
            description: None,
            goal_ids,
            completions: vec![],
            point_value: 0.25,
            created_at: String::new(),
        }
    }

    /// Goal 1 with milestone 3 holding step 9; no tasks or habits.
    fn scenario_state() -> PlannerState {
        PlannerState::new(
            vec![goal(1, 50, vec![milestone(3, 50, vec![step(9)])])],
            vec![],
            vec![],
        )
    }

    fn convert_and_insert(state: &mut PlannerState, task_id: i64) {
        let draft = state
            .convert_step_to_task(1, 3, 9, String::new())
            .expect("conversion");
        state.tasks.push(draft.into_task(task_id));
    }

    #[test]
    fn unlinked_step_toggle_touches_nothing_else() {
        let mut state = scenario_state();

        let outcome = state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();

        assert!(outcome.events.is_empty());
        assert_eq!(outcome.points, vec![GoalPoints { goal_id: 1, current_points: 1 }]);
        assert!(state.goal(1).unwrap().milestone(3).unwrap().step(9).unwrap().completed);
        assert!(state.tasks.is_empty());
    }

    #[test]
    fn scenario_a_milestone_bonus_clamps_at_total() {
        let mut state = scenario_state();

        state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();
        assert_eq!(state.goal(1).unwrap().current_points, 1);

        let outcome = state
            .toggle_milestone_completion(1, 3, true, day(TODAY), NOW)
            .unwrap();

        // 51 raw, clamped to the 50-point budget.
        assert_eq!(outcome.points[0].current_points, 50);
    }

    #[test]
    fn scenario_b_linked_pair_counts_once() {
        let mut state = scenario_state();
        convert_and_insert(&mut state, 100);

        let outcome = state
            .toggle_task_completion(100, true, day(TODAY), NOW)
            .unwrap();

        let step_completed = state
            .goal(1)
            .unwrap()
            .milestone(3)
            .unwrap()
            .step(9)
            .unwrap()
            .completed;
        assert!(step_completed);
        assert_eq!(outcome.points, vec![GoalPoints { goal_id: 1, current_points: 1 }]);
        assert_eq!(
            outcome.events,
            vec![SyncEvent::LinkedStepUpdated {
                goal_id: 1,
                milestone_id: 3,
                step_id: 9,
                completed: true,
            }]
        );
    }

    #[test]
    fn linked_step_toggle_drives_the_task_path() {
        let mut state = scenario_state();
        convert_and_insert(&mut state, 100);

        let outcome = state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();

        let task = state.task(100).unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(NOW));
        assert!(state.goal(1).unwrap().milestone(3).unwrap().step(9).unwrap().completed);

        // One recomputation for the pair, and both propagation events so the
        // caller can surface "linked task updated".
        assert_eq!(outcome.points.len(), 1);
        assert_eq!(outcome.points[0].current_points, 1);
        assert!(outcome
            .events
            .contains(&SyncEvent::LinkedTaskUpdated { task_id: 100, completed: true }));
        assert!(outcome.events.contains(&SyncEvent::LinkedStepUpdated {
            goal_id: 1,
            milestone_id: 3,
            step_id: 9,
            completed: true,
        }));
    }

    #[test]
    fn propagation_is_symmetric_on_uncompletion() {
        let mut state = scenario_state();
        convert_and_insert(&mut state, 100);

        state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();
        let outcome = state
            .toggle_task_completion(100, false, day(TODAY), NOW)
            .unwrap();

        let step = state
            .goal(1)
            .unwrap()
            .milestone(3)
            .unwrap()
            .step(9)
            .unwrap()
            .clone();
        assert!(!step.completed);
        assert_eq!(step.completed_at, None);
        assert_eq!(outcome.points[0].current_points, 0);
    }

    #[test]
    fn adhoc_task_toggle_recomputes_no_goal() {
        let mut state = scenario_state();
        state.tasks.push(Task {
            id: 7,
            title: "errand".into(),
            time_estimate: 15,
            priority: TaskPriority::Neither,
            completed: false,
            completed_at: None,
            tags: vec![],
            goal_id: None,
            source_step_id: None,
            source_milestone_id: None,
            created_at: String::new(),
        });

        let outcome = state.toggle_task_completion(7, true, day(TODAY), NOW).unwrap();

        assert!(outcome.events.is_empty());
        assert!(outcome.points.is_empty());
        assert_eq!(state.goal(1).unwrap().current_points, 0);
    }

    #[test]
    fn milestone_toggle_does_not_cascade_to_steps() {
        let mut state = scenario_state();

        state
            .toggle_milestone_completion(1, 3, true, day(TODAY), NOW)
            .unwrap();

        let milestone = state.goal(1).unwrap().milestone(3).unwrap().clone();
        assert!(milestone.completed);
        assert!(!milestone.steps[0].completed);
    }

    #[test]
    fn milestone_bonus_is_idempotent_over_toggle_cycles() {
        let mut state = scenario_state();
        state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();
        let baseline = state.goal(1).unwrap().current_points;

        for _ in 0..10 {
            state
                .toggle_milestone_completion(1, 3, true, day(TODAY), NOW)
                .unwrap();
            state
                .toggle_milestone_completion(1, 3, false, day(TODAY), NOW)
                .unwrap();
        }

        assert_eq!(state.goal(1).unwrap().current_points, baseline);
    }

    #[test]
    fn scenario_d_deleting_completed_milestone_reverses_its_bonus() {
        let mut state = scenario_state();
        state
            .toggle_milestone_completion(1, 3, true, day(TODAY), NOW)
            .unwrap();
        assert_eq!(state.goal(1).unwrap().current_points, 50);

        let outcome = state.delete_milestone(1, 3, day(TODAY)).unwrap();

        assert_eq!(outcome.points, vec![GoalPoints { goal_id: 1, current_points: 0 }]);
        assert!(state.goal(1).unwrap().milestones.is_empty());
    }

    #[test]
    fn second_conversion_is_rejected() {
        let mut state = scenario_state();
        convert_and_insert(&mut state, 100);

        assert!(state.convert_step_to_task(1, 3, 9, String::new()).is_err());
        assert_eq!(state.tasks.len(), 1);
    }

    #[test]
    fn conversion_preserves_completed_state() {
        let mut state = scenario_state();
        state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();

        let draft = state.convert_step_to_task(1, 3, 9, String::new()).unwrap();

        assert!(draft.completed);
        assert_eq!(draft.completed_at, Some(NOW));
        assert_eq!(draft.title, "step 9");
        assert_eq!(draft.priority, TaskPriority::ImportantNotUrgent);

        // Converting a completed step moves the credit without changing it.
        state.tasks.push(draft.into_task(100));
        let points = state.recompute_goal(1, day(TODAY)).unwrap();
        assert_eq!(points.current_points, 1);
    }

    #[test]
    fn habit_day_scoping() {
        let mut state = scenario_state();
        state.habits.push(habit(20, vec![1]));
        state.habits.push(habit(21, vec![1]));
        state.habits[0].completions.push(HabitCompletion {
            date: day("2026-08-05"),
            timestamp: NOW - 86_400,
        });

        // Yesterday's completion contributes nothing today.
        assert_eq!(state.recompute_goal(1, day(TODAY)).unwrap().current_points, 0);

        let (completed, _) = state.toggle_habit_today(20, day(TODAY), NOW).unwrap();
        assert!(completed);
        let (completed, points) = state.toggle_habit_today(21, day(TODAY), NOW).unwrap();
        assert!(completed);
        assert_eq!(points[0].current_points, 1); // 0.5 rounds half-up

        // Unmarking removes exactly the habit's contribution.
        let (completed, points) = state.toggle_habit_today(21, day(TODAY), NOW).unwrap();
        assert!(!completed);
        assert_eq!(points[0].current_points, 0);
    }

    #[test]
    fn habit_toggle_recomputes_every_linked_goal() {
        let mut state = scenario_state();
        state.goals.push(goal(2, 50, vec![]));
        state.habits.push(habit(20, vec![1, 2]));

        let (_, points) = state.toggle_habit_today(20, day(TODAY), NOW).unwrap();

        let mut touched: Vec<i64> = points.iter().map(|p| p.goal_id).collect();
        touched.sort_unstable();
        assert_eq!(touched, vec![1, 2]);
    }

    #[test]
    fn shrinking_total_points_reclamps_current() {
        let mut state = scenario_state();
        state
            .toggle_milestone_completion(1, 3, true, day(TODAY), NOW)
            .unwrap();
        assert_eq!(state.goal(1).unwrap().current_points, 50);

        let outcome = state.set_goal_total_points(1, 20, day(TODAY)).unwrap();
        assert_eq!(outcome.points[0].current_points, 20);

        assert!(state.set_goal_total_points(1, 0, day(TODAY)).is_err());
    }

    #[test]
    fn recompute_is_suppressed_while_synchronizing() {
        let mut state = scenario_state();
        state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();

        state.synchronizing = true;
        assert!(state.recompute_goal(1, day(TODAY)).is_none());
        assert!(state.recompute_all(day(TODAY)).is_empty());

        state.synchronizing = false;
        assert_eq!(state.recompute_goal(1, day(TODAY)).unwrap().current_points, 1);
    }

    #[test]
    fn duplicate_links_sync_through_the_canonical_task() {
        // Two tasks referencing the same step (a data anomaly); the lowest
        // id drives synchronization, and the point total stays at 1.
        let mut state = scenario_state();
        convert_and_insert(&mut state, 100);
        let mut duplicate = state.tasks[0].clone();
        duplicate.id = 200;
        state.tasks.push(duplicate);

        let outcome = state
            .toggle_step_completion(1, 3, 9, true, day(TODAY), NOW)
            .unwrap();

        assert!(outcome
            .events
            .contains(&SyncEvent::LinkedTaskUpdated { task_id: 100, completed: true }));
        assert!(state.task(100).unwrap().completed);
        assert!(!state.task(200).unwrap().completed);

        // Both tasks would count if completed, but the step stays excluded.
        assert_eq!(state.goal(1).unwrap().current_points, 1);
    }
}
