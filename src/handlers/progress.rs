use askama::Template;
use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::NaiveDate;

use super::render;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::personal_record::{compute_records, estimated_one_rep_max, record_for_exercise};
use crate::models::{Exercise, PersonalRecord, WeightUnit};
use crate::progress::{
    current_streak, local_today, longest_streak, series_start, weekly_volume_series, WeekVolume, VOLUME_WEEKS,
};
use crate::repositories::{ExerciseRepository, SettingsRepository, WorkoutRepository};

const EXERCISE_HISTORY_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct ProgressState {
    pub workout_repo: WorkoutRepository,
    pub exercise_repo: ExerciseRepository,
    pub settings_repo: SettingsRepository,
}

pub struct RecordRow {
    pub exercise_id: String,
    pub exercise_name: String,
    pub workout_id: String,
    pub performed_on: NaiveDate,
    pub reps: i64,
    pub weight_label: String,
    pub estimate_label: String,
}

impl RecordRow {
    fn new(record: &PersonalRecord, unit: WeightUnit) -> Self {
        Self {
            exercise_id: record.exercise_id.clone(),
            exercise_name: record.exercise_name.clone(),
            workout_id: record.workout_id.clone(),
            performed_on: record.performed_on,
            reps: record.reps,
            weight_label: unit.format(record.weight_kg),
            estimate_label: unit.format(record.estimated_one_rep_max),
        }
    }
}

pub struct HistoryRow {
    pub workout_id: String,
    pub performed_on: NaiveDate,
    pub set_number: i64,
    pub reps: i64,
    pub weight_label: String,
    pub estimate_label: String,
    pub is_pr: bool,
}

#[derive(Template)]
#[template(path = "progress/index.html")]
struct ProgressTemplate {
    user: AuthUser,
    weeks: Vec<WeekVolume>,
    unit: WeightUnit,
    total_workouts: i64,
    current_streak: u32,
    longest_streak: u32,
    exercises: Vec<Exercise>,
}

#[derive(Template)]
#[template(path = "progress/exercise.html")]
struct ExerciseProgressTemplate {
    user: AuthUser,
    exercise: Exercise,
    record: Option<RecordRow>,
    history: Vec<HistoryRow>,
}

#[derive(Template)]
#[template(path = "progress/records.html")]
struct RecordsTemplate {
    user: AuthUser,
    records: Vec<RecordRow>,
}

pub async fn index(State(state): State<ProgressState>, auth_user: AuthUser) -> Result<Response> {
    let today = local_today();
    let (daily, total_workouts, dates, exercises, settings) = tokio::try_join!(
        state
            .workout_repo
            .daily_volume_since(&auth_user.id, series_start(today, VOLUME_WEEKS)),
        state.workout_repo.count_by_user(&auth_user.id),
        state.workout_repo.workout_dates(&auth_user.id),
        state.exercise_repo.find_by_user(&auth_user.id),
        state.settings_repo.get(&auth_user.id),
    )?;

    render(&ProgressTemplate {
        user: auth_user,
        weeks: weekly_volume_series(today, &daily, VOLUME_WEEKS),
        unit: settings.weight_unit,
        total_workouts,
        current_streak: current_streak(today, &dates),
        longest_streak: longest_streak(&dates),
        exercises,
    })
}

pub async fn exercise(
    State(state): State<ProgressState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let exercise = state
        .exercise_repo
        .find_owned(&id, &auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exercise not found".to_string()))?;

    let (recent, history, settings) = tokio::try_join!(
        state
            .workout_repo
            .exercise_history(&auth_user.id, &id, EXERCISE_HISTORY_LIMIT),
        state.workout_repo.set_history(&auth_user.id),
        state.settings_repo.get(&auth_user.id),
    )?;
    let unit = settings.weight_unit;

    // The record comes from the full history, not just the rows shown.
    let record = record_for_exercise(&history, &id);
    let record_set_id = record.as_ref().map(|r| r.set_id.clone());

    let history = recent
        .into_iter()
        .map(|set| HistoryRow {
            is_pr: record_set_id.as_deref() == Some(set.id.as_str()),
            workout_id: set.workout_id,
            performed_on: set.performed_on,
            set_number: set.set_number,
            reps: set.reps,
            weight_label: unit.format(set.weight_kg),
            estimate_label: unit.format(estimated_one_rep_max(set.weight_kg, set.reps)),
        })
        .collect();

    render(&ExerciseProgressTemplate {
        user: auth_user,
        exercise,
        record: record.as_ref().map(|r| RecordRow::new(r, unit)),
        history,
    })
}

pub async fn records(State(state): State<ProgressState>, auth_user: AuthUser) -> Result<Response> {
    let (history, settings) = tokio::try_join!(
        state.workout_repo.set_history(&auth_user.id),
        state.settings_repo.get(&auth_user.id),
    )?;

    let records = compute_records(&history)
        .iter()
        .map(|r| RecordRow::new(r, settings.weight_unit))
        .collect();

    render(&RecordsTemplate {
        user: auth_user,
        records,
    })
}
