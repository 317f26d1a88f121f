//! Aggregates built from a user's training log: weekly volume, streaks,
//! goal progress and the dashboard summary.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};

use crate::cache::TtlCache;
use crate::error::Result;
use crate::models::personal_record::compute_records;
use crate::models::{
    Exercise, Goal, GoalKind, GoalMetrics, GoalProgress, PersonalRecord, WeightUnit, Workout,
    WorkoutSetWithExercise,
};
use crate::repositories::{ExerciseRepository, GoalRepository, WorkoutRepository};

pub const VOLUME_WEEKS: usize = 8;
pub const RECENT_WORKOUTS: i64 = 5;

/// Dashboard summaries keyed by user id.
pub type DashboardCache = TtlCache<String, DashboardSummary>;

/// The server's local calendar date. Every page measures days, weeks and
/// months against it.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekVolume {
    pub week_start: NaiveDate,
    pub volume_kg: f64,
    /// Bar height relative to the heaviest week in the series.
    pub percent_of_max: u8,
}

impl WeekVolume {
    /// ISO week label such as "2024-W09".
    pub fn label(&self) -> String {
        let week = self.week_start.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
    }
}

/// First day covered by a series of `weeks` weeks ending with the week of `today`.
pub fn series_start(today: NaiveDate, weeks: usize) -> NaiveDate {
    week_start(today) - Duration::weeks(weeks.saturating_sub(1) as i64)
}

/// Sum daily volume into `weeks` consecutive ISO weeks ending with the
/// current one. Weeks without training are present with zero volume.
pub fn weekly_volume_series(
    today: NaiveDate,
    daily: &[(NaiveDate, f64)],
    weeks: usize,
) -> Vec<WeekVolume> {
    let first = series_start(today, weeks);
    let mut totals = vec![0.0_f64; weeks];

    for (day, volume) in daily {
        if *day < first {
            continue;
        }
        let index = ((*day - first).num_days() / 7) as usize;
        if let Some(total) = totals.get_mut(index) {
            *total += volume;
        }
    }

    let max = totals.iter().copied().fold(0.0_f64, f64::max);
    totals
        .into_iter()
        .enumerate()
        .map(|(i, volume_kg)| WeekVolume {
            week_start: first + Duration::weeks(i as i64),
            volume_kg,
            percent_of_max: if max > 0.0 {
                (volume_kg / max * 100.0).round().clamp(0.0, 100.0) as u8
            } else {
                0
            },
        })
        .collect()
}

/// Consecutive training days ending today, or yesterday when today has no
/// workout yet.
pub fn current_streak(today: NaiveDate, dates: &[NaiveDate]) -> u32 {
    let days: BTreeSet<NaiveDate> = dates.iter().copied().filter(|d| *d <= today).collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

pub fn longest_streak(dates: &[NaiveDate]) -> u32 {
    let days: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

/// Goal metrics derived from this week's workout count, this month's volume
/// and the user's full set history.
pub fn goal_metrics(
    workouts_this_week: i64,
    volume_this_month: f64,
    history: &[WorkoutSetWithExercise],
) -> GoalMetrics {
    let mut best_weight_by_exercise: HashMap<String, f64> = HashMap::new();
    for set in history {
        let best = best_weight_by_exercise
            .entry(set.exercise_id.clone())
            .or_insert(0.0);
        *best = best.max(set.weight_kg);
    }

    GoalMetrics {
        workouts_this_week,
        volume_this_month,
        best_weight_by_exercise,
    }
}

pub fn goal_title(goal: &Goal, exercises: &[Exercise], unit: WeightUnit) -> String {
    match goal.kind {
        GoalKind::WeeklyWorkouts => format!("{} workouts this week", goal.target_value.round()),
        GoalKind::MonthlyVolume => format!("{} volume this month", unit.format(goal.target_value)),
        GoalKind::ExerciseWeight => {
            let name = goal
                .exercise_id
                .as_deref()
                .and_then(|id| exercises.iter().find(|e| e.id == id))
                .map(|e| e.name.as_str())
                .unwrap_or("Deleted exercise");
            format!("{} at {}", name, unit.format(goal.target_value))
        }
    }
}

pub fn build_goal_progress(
    goals: Vec<Goal>,
    exercises: &[Exercise],
    metrics: &GoalMetrics,
    unit: WeightUnit,
) -> Vec<GoalProgress> {
    goals
        .into_iter()
        .map(|goal| {
            let title = goal_title(&goal, exercises, unit);
            GoalProgress::compute(goal, title, metrics)
        })
        .collect()
}

/// Stamp `achieved_at` on goals that reached 100% for the first time.
pub async fn record_achievements(
    goal_repo: &GoalRepository,
    progress: &mut [GoalProgress],
    now: DateTime<Utc>,
) -> Result<()> {
    for entry in progress
        .iter_mut()
        .filter(|p| p.is_complete() && p.goal.achieved_at.is_none())
    {
        if goal_repo.mark_achieved(&entry.goal.id, now).await? {
            tracing::info!(goal_id = %entry.goal.id, "Goal achieved");
        }
        entry.goal.achieved_at = Some(now);
    }
    Ok(())
}

/// Every goal of the user with current progress, achievements recorded.
///
/// `today` bounds the week and month; `now` only stamps `achieved_at`.
pub async fn load_goal_progress(
    workout_repo: &WorkoutRepository,
    goal_repo: &GoalRepository,
    exercise_repo: &ExerciseRepository,
    user_id: &str,
    unit: WeightUnit,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<GoalProgress>> {
    let (goals, exercises, history, week_count, month_volume) = tokio::try_join!(
        goal_repo.find_by_user(user_id),
        exercise_repo.find_by_user(user_id),
        workout_repo.set_history(user_id),
        workout_repo.count_workouts_since(user_id, week_start(today)),
        workout_repo.volume_since(user_id, month_start(today)),
    )?;

    let metrics = goal_metrics(week_count, month_volume, &history);
    let mut progress = build_goal_progress(goals, &exercises, &metrics, unit);
    record_achievements(goal_repo, &mut progress, now).await?;
    Ok(progress)
}

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub workouts_last_7_days: i64,
    pub workouts_last_30_days: i64,
    pub volume_last_7_days: f64,
    pub recent_workouts: Vec<Workout>,
    pub current_streak: u32,
    pub personal_records: Vec<PersonalRecord>,
    pub active_goals: Vec<GoalProgress>,
}

impl DashboardSummary {
    pub async fn load(
        workout_repo: &WorkoutRepository,
        goal_repo: &GoalRepository,
        exercise_repo: &ExerciseRepository,
        user_id: &str,
        unit: WeightUnit,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let (last_7, last_30, volume_7, recent, dates, history, goals, exercises, week_count, month_volume) = tokio::try_join!(
            workout_repo.count_workouts_since(user_id, today - Duration::days(6)),
            workout_repo.count_workouts_since(user_id, today - Duration::days(29)),
            workout_repo.volume_since(user_id, today - Duration::days(6)),
            workout_repo.find_by_user_paginated(user_id, RECENT_WORKOUTS, 0),
            workout_repo.workout_dates(user_id),
            workout_repo.set_history(user_id),
            goal_repo.find_by_user(user_id),
            exercise_repo.find_by_user(user_id),
            workout_repo.count_workouts_since(user_id, week_start(today)),
            workout_repo.volume_since(user_id, month_start(today)),
        )?;

        let metrics = goal_metrics(week_count, month_volume, &history);
        let open_goals = goals
            .into_iter()
            .filter(|g| g.achieved_at.is_none())
            .collect();
        let mut active_goals = build_goal_progress(open_goals, &exercises, &metrics, unit);
        record_achievements(goal_repo, &mut active_goals, now).await?;

        Ok(Self {
            workouts_last_7_days: last_7,
            workouts_last_30_days: last_30,
            volume_last_7_days: volume_7,
            recent_workouts: recent,
            current_streak: current_streak(today, &dates),
            personal_records: compute_records(&history),
            active_goals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{create_test_user, setup_test_db};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_and_month_start() {
        // 2024-03-07 is a Thursday.
        assert_eq!(week_start(date(2024, 3, 7)), date(2024, 3, 4));
        assert_eq!(week_start(date(2024, 3, 4)), date(2024, 3, 4));
        assert_eq!(week_start(date(2024, 3, 10)), date(2024, 3, 4));
        assert_eq!(month_start(date(2024, 3, 7)), date(2024, 3, 1));
    }

    #[test]
    fn test_weekly_volume_has_eight_points_ending_this_week() {
        let today = date(2024, 3, 7);
        let daily = vec![
            (date(2024, 1, 1), 9999.0),
            (date(2024, 1, 15), 1000.0),
            (date(2024, 3, 5), 500.0),
            (date(2024, 3, 6), 1500.0),
        ];

        let series = weekly_volume_series(today, &daily, VOLUME_WEEKS);

        assert_eq!(series.len(), 8);
        assert_eq!(series[0].week_start, date(2024, 1, 15));
        assert_eq!(series[0].volume_kg, 1000.0);
        assert_eq!(series[7].week_start, date(2024, 3, 4));
        assert_eq!(series[7].volume_kg, 2000.0);
        assert_eq!(series[7].percent_of_max, 100);
        assert_eq!(series[0].percent_of_max, 50);
        assert_eq!(series[3].volume_kg, 0.0);
        assert_eq!(series[7].label(), "2024-W10");
    }

    #[test]
    fn test_weekly_volume_empty_log() {
        let series = weekly_volume_series(date(2024, 3, 7), &[], VOLUME_WEEKS);
        assert!(series.iter().all(|w| w.volume_kg == 0.0 && w.percent_of_max == 0));
    }

    #[test]
    fn test_current_streak_includes_today() {
        let today = date(2024, 3, 7);
        let dates = vec![date(2024, 3, 7), date(2024, 3, 6), date(2024, 3, 5), date(2024, 3, 3)];
        assert_eq!(current_streak(today, &dates), 3);
    }

    #[test]
    fn test_current_streak_may_end_yesterday() {
        let today = date(2024, 3, 7);
        let dates = vec![date(2024, 3, 6), date(2024, 3, 5)];
        assert_eq!(current_streak(today, &dates), 2);
    }

    #[test]
    fn test_current_streak_broken() {
        let today = date(2024, 3, 7);
        assert_eq!(current_streak(today, &[date(2024, 3, 5)]), 0);
        assert_eq!(current_streak(today, &[]), 0);
    }

    #[test]
    fn test_longest_streak() {
        let dates = vec![
            date(2024, 2, 27),
            date(2024, 2, 28),
            date(2024, 2, 29),
            date(2024, 3, 1),
            date(2024, 3, 5),
            date(2024, 3, 6),
        ];
        assert_eq!(longest_streak(&dates), 4);
        assert_eq!(longest_streak(&[]), 0);
    }

    #[tokio::test]
    async fn test_dashboard_summary_and_goal_achievement() {
        let pool = setup_test_db();
        create_test_user(&pool, "u1");
        let workouts = WorkoutRepository::new(pool.clone());
        let goals = GoalRepository::new(pool.clone());
        let exercises = ExerciseRepository::new(pool.clone());

        let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let bench = exercises.create("u1", "Bench Press", "chest").await.unwrap();
        let today = workouts
            .create_workout("u1", "Push", date(2024, 3, 7), None, false)
            .await
            .unwrap();
        workouts
            .create_workout("u1", "Old", date(2024, 2, 20), None, false)
            .await
            .unwrap();
        workouts
            .create_set(&today.id, &bench.id, 1, 5, 100.0, None)
            .await
            .unwrap();
        let goal = goals
            .create("u1", GoalKind::ExerciseWeight, Some(&bench.id), 100.0, None)
            .await
            .unwrap();

        let summary = DashboardSummary::load(
            &workouts,
            &goals,
            &exercises,
            "u1",
            WeightUnit::Kg,
            date(2024, 3, 7),
            now,
        )
        .await
        .unwrap();

        assert_eq!(summary.workouts_last_7_days, 1);
        assert_eq!(summary.workouts_last_30_days, 2);
        assert_eq!(summary.volume_last_7_days, 500.0);
        assert_eq!(summary.recent_workouts.len(), 2);
        assert_eq!(summary.current_streak, 1);
        assert_eq!(summary.personal_records.len(), 1);
        assert_eq!(summary.active_goals.len(), 1);
        assert_eq!(summary.active_goals[0].percent, 100);
        assert_eq!(summary.active_goals[0].title, "Bench Press at 100 kg");

        let stored = goals.find_by_id(&goal.id).await.unwrap().unwrap();
        assert_eq!(stored.achieved_at, Some(now));
    }

    #[tokio::test]
    async fn test_summary_uses_local_date_not_utc_date() {
        let pool = setup_test_db();
        create_test_user(&pool, "u1");
        let workouts = WorkoutRepository::new(pool.clone());
        let goals = GoalRepository::new(pool.clone());
        let exercises = ExerciseRepository::new(pool.clone());

        // Monday 2024-03-11 locally while UTC is still Sunday evening.
        let today = date(2024, 3, 11);
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        workouts
            .create_workout("u1", "Sunday", date(2024, 3, 10), None, false)
            .await
            .unwrap();
        workouts
            .create_workout("u1", "Monday", today, None, false)
            .await
            .unwrap();
        goals
            .create("u1", GoalKind::WeeklyWorkouts, None, 2.0, None)
            .await
            .unwrap();

        let summary = DashboardSummary::load(&workouts, &goals, &exercises, "u1", WeightUnit::Kg, today, now)
            .await
            .unwrap();
        assert_eq!(summary.current_streak, 2);
        assert_eq!(summary.active_goals.len(), 1);
        assert_eq!(summary.active_goals[0].percent, 50);

        let progress = load_goal_progress(&workouts, &goals, &exercises, "u1", WeightUnit::Kg, today, now)
            .await
            .unwrap();
        assert_eq!(progress[0].percent, 50);
        assert!(progress[0].goal.achieved_at.is_none());
    }
}
