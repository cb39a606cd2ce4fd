//! Pure progress calculator: a goal's current points derived from its
//! tasks, unlinked steps, milestone bonuses and today's habit completions.
//!
//! Contributions are summed as floats and rounded once at the end, so
//! several fractional habit credits accumulate before rounding rather than
//! each rounding to zero on its own.

use chrono::NaiveDate;

use super::link;
use crate::goals::data::Goal;
use crate::habits::data::Habit;
use crate::tasks::data::Task;

pub fn clamp_points(points: i64, total_points: i64) -> i64 {
    points.max(0).min(total_points)
}

/// Compute a goal's current points for the given day.
///
/// Each completed task linked to the goal is worth 1 point. Each completed
/// step is worth 1 point unless a task was materialized from it, in which
/// case the task alone carries the credit. Completed milestones add their
/// bonus. Habits count only when completed on `today`.
pub fn goal_points(goal: &Goal, tasks: &[Task], habits: &[Habit], today: NaiveDate) -> i64 {
    let task_points = tasks
        .iter()
        .filter(|task| task.goal_id == Some(goal.id) && task.completed)
        .count() as f64;

    let mut step_points = 0.0;
    for milestone in goal.milestones.iter() {
        for step in milestone.steps.iter() {
            if step.completed && !link::is_step_linked(goal.id, milestone.id, step.id, tasks) {
                step_points += 1.0;
            }
        }
    }

    let milestone_bonus: i64 = goal
        .milestones
        .iter()
        .filter(|milestone| milestone.completed)
        .map(|milestone| milestone.bonus_points)
        .sum();

    let habit_points: f64 = habits
        .iter()
        .filter(|habit| habit.goal_ids.contains(&goal.id) && habit.completed_on(today))
        .map(|habit| habit.point_value)
        .sum();

    let raw = task_points + step_points + milestone_bonus as f64 + habit_points;

    clamp_points(raw.round() as i64, goal.total_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::data::{Milestone, Step};
    use crate::habits::data::HabitCompletion;
    use crate::tasks::data::TaskPriority;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn step(id: i64, completed: bool) -> Step {
        Step {
            id,
            text: format!("step {}", id),
            completed,
            completed_at: if completed { Some(1000) } else { None },
            time_estimate: 30,
            notes: String::new(),
            created_at: String::new(),
        }
    }

    fn milestone(id: i64, completed: bool, bonus_points: i64, steps: Vec<Step>) -> Milestone {
        Milestone {
            id,
            title: format!("milestone {}", id),
            completed,
            completed_at: if completed { Some(1000) } else { None },
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

    fn task(id: i64, goal_id: Option<i64>, completed: bool) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            time_estimate: 30,
            priority: TaskPriority::ImportantNotUrgent,
            completed,
            completed_at: if completed { Some(1000) } else { None },
            tags: vec![],
            goal_id,
            source_step_id: None,
            source_milestone_id: None,
            created_at: String::new(),
        }
    }

    fn habit(id: i64, goal_ids: Vec<i64>, point_value: f64, days: Vec<&str>) -> Habit {
        Habit {
            id,
            title: format!("habit {}", id),
            description: None,
            goal_ids,
            completions: days
                .into_iter()
                .map(|d| HabitCompletion {
                    date: day(d),
                    timestamp: 1000,
                })
                .collect(),
            point_value,
            created_at: String::new(),
        }
    }

    #[test]
    fn completed_tasks_count_one_point_each() {
        let g = goal(1, 50, vec![]);
        let tasks = vec![task(1, Some(1), true), task(2, Some(1), true), task(3, Some(1), false)];

        assert_eq!(goal_points(&g, &tasks, &[], day("2026-08-06")), 2);
    }

    #[test]
    fn adhoc_tasks_contribute_nothing() {
        let g = goal(1, 50, vec![]);
        let tasks = vec![task(1, None, true), task(2, Some(9), true)];

        assert_eq!(goal_points(&g, &tasks, &[], day("2026-08-06")), 0);
    }

    #[test]
    fn linked_step_is_not_double_counted() {
        let g = goal(1, 50, vec![milestone(3, false, 50, vec![step(9, true)])]);
        let mut linked = task(5, Some(1), true);
        linked.source_step_id = Some(9);
        linked.source_milestone_id = Some(3);

        // Step and task both completed; only the task carries the point.
        assert_eq!(goal_points(&g, &[linked], &[], day("2026-08-06")), 1);
    }

    #[test]
    fn unlinked_completed_step_counts_once() {
        let g = goal(1, 50, vec![milestone(3, false, 50, vec![step(9, true), step(10, false)])]);

        assert_eq!(goal_points(&g, &[], &[], day("2026-08-06")), 1);
    }

    #[test]
    fn milestone_bonus_applies_while_completed() {
        let g = goal(1, 200, vec![milestone(3, true, 50, vec![]), milestone(4, false, 50, vec![])]);

        assert_eq!(goal_points(&g, &[], &[], day("2026-08-06")), 50);
    }

    #[test]
    fn result_clamps_to_total_points() {
        // Scenario A: one unlinked completed step plus a completed milestone
        // worth the whole budget lands at 51 raw and clamps to 50.
        let g = goal(
            1,
            50,
            vec![milestone(3, true, 50, vec![step(9, true)])],
        );

        assert_eq!(goal_points(&g, &[], &[], day("2026-08-06")), 50);
    }

    #[test]
    fn habit_counts_only_on_its_completion_day() {
        let g = goal(1, 50, vec![]);
        let habits = vec![habit(2, vec![1], 0.25, vec!["2026-08-05"])];

        assert_eq!(goal_points(&g, &[], &habits, day("2026-08-05")), 0); // 0.25 rounds down
        assert_eq!(goal_points(&g, &[], &habits, day("2026-08-06")), 0); // stale day
    }

    #[test]
    fn habit_contributions_sum_before_rounding() {
        // Scenario C: two habits at 0.25 round to 1 only because the raw sum
        // (0.5) is rounded once, half-up.
        let g = goal(1, 50, vec![]);
        let habits = vec![
            habit(2, vec![1], 0.25, vec!["2026-08-06"]),
            habit(3, vec![1], 0.25, vec!["2026-08-06"]),
        ];

        assert_eq!(goal_points(&g, &[], &habits, day("2026-08-06")), 1);
    }

    #[test]
    fn habit_feeds_every_associated_goal() {
        let a = goal(1, 50, vec![]);
        let b = goal(2, 50, vec![]);
        let habits = vec![
            habit(5, vec![1, 2], 0.25, vec!["2026-08-06"]),
            habit(6, vec![1, 2], 0.25, vec!["2026-08-06"]),
        ];

        assert_eq!(goal_points(&a, &[], &habits, day("2026-08-06")), 1);
        assert_eq!(goal_points(&b, &[], &habits, day("2026-08-06")), 1);
    }

    #[test]
    fn fractional_habits_round_with_integer_sources() {
        let g = goal(1, 50, vec![]);
        let tasks = vec![task(1, Some(1), true)];
        let habits = vec![habit(2, vec![1], 0.25, vec!["2026-08-06"])];

        // 1.25 rounds to 1; a second habit would push it to 1.5 -> 2.
        assert_eq!(goal_points(&g, &tasks, &habits, day("2026-08-06")), 1);

        let habits = vec![
            habit(2, vec![1], 0.25, vec!["2026-08-06"]),
            habit(3, vec![1], 0.25, vec!["2026-08-06"]),
        ];
        assert_eq!(goal_points(&g, &tasks, &habits, day("2026-08-06")), 2);
    }

    #[test]
    fn points_never_go_negative() {
        assert_eq!(clamp_points(-10, 50), 0);
        assert_eq!(clamp_points(70, 50), 50);
        assert_eq!(clamp_points(20, 50), 20);
    }
}
