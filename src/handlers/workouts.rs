use std::collections::HashSet;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;

use super::{render, total_pages, PageQuery, PAGE_SIZE};
use crate::cache::Debouncer;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::personal_record::{compute_records, record_set_ids};
use crate::models::timer::format_clock;
use crate::models::workout::deserialize_optional_i64;
use crate::models::workout_set::validate_set;
use crate::models::{
    Exercise, ProgressPhoto, SetForm, TimerAction, TimerSnapshot, TimerState, WeightUnit, Workout,
    WorkoutForm, WorkoutSet, WorkoutSetWithExercise, WorkoutTimer,
};
use crate::progress::{local_today, DashboardCache};
use crate::repositories::{ExerciseRepository, PhotoRepository, SettingsRepository, WorkoutRepository};

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
    pub exercise_repo: ExerciseRepository,
    pub settings_repo: SettingsRepository,
    pub photo_repo: PhotoRepository,
    pub dashboard_cache: DashboardCache,
    pub debouncer: Debouncer,
}

/// One logged set, formatted for display.
pub struct SetRow {
    pub id: String,
    pub set_number: i64,
    pub reps: i64,
    pub weight_label: String,
    pub rest_label: String,
    pub is_pr: bool,
}

/// Sets of one exercise within a workout.
pub struct ExerciseGroup {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: Vec<SetRow>,
}

/// Group sets by exercise, keeping the order exercises were first logged.
pub fn group_sets(
    sets: &[WorkoutSetWithExercise],
    unit: WeightUnit,
    pr_ids: &HashSet<String>,
) -> Vec<ExerciseGroup> {
    let mut groups: Vec<ExerciseGroup> = Vec::new();
    for set in sets {
        let row = SetRow {
            id: set.id.clone(),
            set_number: set.set_number,
            reps: set.reps,
            weight_label: unit.format(set.weight_kg),
            rest_label: set.rest_seconds.map(format_clock).unwrap_or_default(),
            is_pr: pr_ids.contains(&set.id),
        };
        match groups.iter_mut().find(|g| g.exercise_id == set.exercise_id) {
            Some(group) => group.sets.push(row),
            None => groups.push(ExerciseGroup {
                exercise_id: set.exercise_id.clone(),
                exercise_name: set.exercise_name.clone(),
                sets: vec![row],
            }),
        }
    }
    groups
}

pub fn total_volume(sets: &[WorkoutSetWithExercise]) -> f64 {
    sets.iter().map(|s| s.reps as f64 * s.weight_kg).sum()
}

/// Weight in the user's unit as a form input value, one decimal at most.
pub fn weight_input_value(unit: WeightUnit, weight_kg: f64) -> String {
    let value = (unit.from_kg(weight_kg) * 10.0).round() / 10.0;
    format!("{}", value)
}

/// Timer buttons offered in a given state: `(action, label)`.
pub fn timer_actions(state: TimerState) -> Vec<(&'static str, &'static str)> {
    match state {
        TimerState::Idle => vec![("start", "Start")],
        TimerState::Running => vec![("pause", "Pause"), ("rest", "Rest"), ("finish", "Finish")],
        TimerState::Paused => vec![("resume", "Resume"), ("finish", "Finish")],
        TimerState::Resting => vec![("skip_rest", "Skip rest"), ("pause", "Pause"), ("finish", "Finish")],
        TimerState::Done => vec![],
    }
}

/// Form values echoed back into the workout form.
#[derive(Default)]
pub struct WorkoutFields {
    pub name: String,
    pub performed_on: String,
    pub notes: String,
    pub duration_minutes: String,
}

impl WorkoutFields {
    fn from_form(form: &WorkoutForm) -> Self {
        Self {
            name: form.name.clone(),
            performed_on: form.performed_on.to_string(),
            notes: form.notes.clone().unwrap_or_default(),
            duration_minutes: form.duration_minutes.map(|m| m.to_string()).unwrap_or_default(),
        }
    }

    fn from_workout(workout: &Workout) -> Self {
        Self {
            name: workout.name.clone(),
            performed_on: workout.performed_on.to_string(),
            notes: workout.notes.clone().unwrap_or_default(),
            duration_minutes: workout
                .duration_minutes()
                .map(|m| m.to_string())
                .unwrap_or_default(),
        }
    }
}

// Templates
#[derive(Template)]
#[template(path = "workouts/list.html")]
struct WorkoutsListTemplate {
    user: AuthUser,
    workouts: Vec<Workout>,
    page: i64,
    total_pages: i64,
}

#[derive(Template)]
#[template(path = "workouts/new.html")]
struct NewWorkoutTemplate {
    user: AuthUser,
    fields: WorkoutFields,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "workouts/show.html")]
struct ShowWorkoutTemplate {
    user: AuthUser,
    workout: Workout,
    groups: Vec<ExerciseGroup>,
    exercises: Vec<Exercise>,
    photos: Vec<ProgressPhoto>,
    timer: TimerSnapshot,
    actions: Vec<(&'static str, &'static str)>,
    unit_label: &'static str,
    default_rest_seconds: i64,
    volume_label: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "workouts/edit.html")]
struct EditWorkoutTemplate {
    user: AuthUser,
    workout: Workout,
    fields: WorkoutFields,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "workouts/edit_set.html")]
struct EditSetTemplate {
    user: AuthUser,
    workout: Workout,
    set: WorkoutSet,
    exercise_name: String,
    weight_value: String,
    rest_value: String,
    unit_label: &'static str,
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct TimerForm {
    pub action: String,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub rest_seconds: Option<i64>,
}

pub(crate) async fn owned_workout(
    workout_repo: &WorkoutRepository,
    id: &str,
    user_id: &str,
) -> Result<Workout> {
    workout_repo
        .find_owned(id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))
}

/// Apply a timer action to an owned workout and persist the result.
pub(crate) async fn run_timer_action(
    workout_repo: &WorkoutRepository,
    workout: &Workout,
    action: TimerAction,
) -> Result<WorkoutTimer> {
    let timer = workout.timer.clone().apply(action, Utc::now())?;
    workout_repo
        .save_timer(&workout.id, &workout.user_id, &timer)
        .await?;
    tracing::debug!(workout_id = %workout.id, action = action.name(), state = %timer.state, "Timer updated");
    Ok(timer)
}

fn workout_url(id: &str) -> String {
    format!("/workouts/{}", id)
}

async fn render_show(
    state: &WorkoutsState,
    auth_user: AuthUser,
    workout: Workout,
    error: Option<String>,
) -> Result<Response> {
    let (sets, history, exercises, photos, settings) = tokio::try_join!(
        state.workout_repo.find_sets_by_workout(&workout.id),
        state.workout_repo.set_history(&auth_user.id),
        state.exercise_repo.find_by_user(&auth_user.id),
        state.photo_repo.find_by_workout(&workout.id),
        state.settings_repo.get(&auth_user.id),
    )?;

    let unit = settings.weight_unit;
    let pr_ids = record_set_ids(&compute_records(&history));
    let timer = workout.timer.snapshot(Utc::now());

    render(&ShowWorkoutTemplate {
        user: auth_user,
        groups: group_sets(&sets, unit, &pr_ids),
        volume_label: unit.format(total_volume(&sets)),
        exercises,
        photos,
        actions: timer_actions(timer.state),
        timer,
        unit_label: unit.as_str(),
        default_rest_seconds: settings.default_rest_seconds,
        workout,
        error,
    })
}

// Handlers
pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (workouts, total) = tokio::try_join!(
        state
            .workout_repo
            .find_by_user_paginated(&auth_user.id, PAGE_SIZE, query.offset()),
        state.workout_repo.count_by_user(&auth_user.id),
    )?;

    render(&WorkoutsListTemplate {
        user: auth_user,
        workouts,
        page: query.page(),
        total_pages: total_pages(total),
    })
}

pub async fn new_page(auth_user: AuthUser) -> Result<Response> {
    let fields = WorkoutFields {
        performed_on: local_today().to_string(),
        ..Default::default()
    };

    render(&NewWorkoutTemplate {
        user: auth_user,
        fields,
        error: None,
    })
}

pub async fn create(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    if let Err(message) = form.validate() {
        return render(&NewWorkoutTemplate {
            user: auth_user,
            fields: WorkoutFields::from_form(&form),
            error: Some(message.to_string()),
        });
    }

    let settings = state.settings_repo.get(&auth_user.id).await?;
    let workout = state
        .workout_repo
        .create_workout(
            &auth_user.id,
            form.name.trim(),
            form.performed_on,
            form.notes(),
            settings.share_by_default,
        )
        .await?;
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to(&workout_url(&workout.id)).into_response())
}

pub async fn show(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;
    render_show(&state, auth_user, workout, None).await
}

pub async fn edit_page(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;

    render(&EditWorkoutTemplate {
        user: auth_user,
        fields: WorkoutFields::from_workout(&workout),
        workout,
        error: None,
    })
}

pub async fn update(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;

    if let Err(message) = form.validate() {
        return render(&EditWorkoutTemplate {
            user: auth_user,
            fields: WorkoutFields::from_form(&form),
            workout,
            error: Some(message.to_string()),
        });
    }

    state
        .workout_repo
        .update_workout(
            &id,
            &auth_user.id,
            form.name.trim(),
            form.performed_on,
            form.notes(),
            form.duration_minutes.map(|m| m * 60),
        )
        .await?;
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to(&workout_url(&id)).into_response())
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    if !state.workout_repo.delete_workout(&id, &auth_user.id).await? {
        return Err(AppError::NotFound("Workout not found".to_string()));
    }
    state.dashboard_cache.invalidate(&auth_user.id);
    tracing::info!(workout_id = %id, "Workout deleted");

    Ok(Redirect::to("/workouts").into_response())
}

pub async fn publish(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    set_visibility(&state, &auth_user, &id, true).await
}

pub async fn unpublish(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    set_visibility(&state, &auth_user, &id, false).await
}

async fn set_visibility(
    state: &WorkoutsState,
    auth_user: &AuthUser,
    id: &str,
    is_public: bool,
) -> Result<Response> {
    if !state.workout_repo.set_public(id, &auth_user.id, is_public).await? {
        return Err(AppError::NotFound("Workout not found".to_string()));
    }
    Ok(Redirect::to(&workout_url(id)).into_response())
}

pub async fn timer_action(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<TimerForm>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;
    let settings = state.settings_repo.get(&auth_user.id).await?;

    let action = TimerAction::parse(&form.action, form.rest_seconds, settings.default_rest_seconds)
        .ok_or_else(|| AppError::BadRequest("Unknown timer action".to_string()))?;
    let timer = run_timer_action(&state.workout_repo, &workout, action).await?;
    if timer.state == TimerState::Done {
        state.dashboard_cache.invalidate(&auth_user.id);
    }

    Ok(Redirect::to(&workout_url(&id)).into_response())
}

// Sets
pub async fn add_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<SetForm>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;

    if state
        .exercise_repo
        .find_owned(&form.exercise_id, &auth_user.id)
        .await?
        .is_none()
    {
        return render_show(&state, auth_user, workout, Some("Choose an exercise".to_string())).await;
    }

    let settings = state.settings_repo.get(&auth_user.id).await?;
    let weight_kg = settings.weight_unit.to_kg(form.weight);
    let rest_seconds = form.rest_seconds.or(Some(settings.default_rest_seconds));
    if let Err(message) = validate_set(form.reps, weight_kg, rest_seconds) {
        return render_show(&state, auth_user, workout, Some(message.to_string())).await;
    }

    let key = format!(
        "set:{}:{}:{}:{}:{}",
        auth_user.id, workout.id, form.exercise_id, form.reps, weight_kg
    );
    if !state.debouncer.should_run(&key) {
        tracing::debug!(workout_id = %workout.id, "Ignoring duplicate set submission");
        return Ok(Redirect::to(&workout_url(&id)).into_response());
    }

    state
        .workout_repo
        .append_set(&workout.id, &form.exercise_id, form.reps, weight_kg, rest_seconds)
        .await?;
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to(&workout_url(&id)).into_response())
}

async fn owned_set(
    state: &WorkoutsState,
    workout: &Workout,
    set_id: &str,
) -> Result<WorkoutSet> {
    state
        .workout_repo
        .find_set_by_id(set_id)
        .await?
        .filter(|set| set.workout_id == workout.id)
        .ok_or_else(|| AppError::NotFound("Set not found".to_string()))
}

pub async fn edit_set_page(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path((id, set_id)): Path<(String, String)>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;
    let set = owned_set(&state, &workout, &set_id).await?;
    render_edit_set(&state, auth_user, workout, set, None).await
}

async fn render_edit_set(
    state: &WorkoutsState,
    auth_user: AuthUser,
    workout: Workout,
    set: WorkoutSet,
    error: Option<String>,
) -> Result<Response> {
    let (exercise, settings) = tokio::try_join!(
        state.exercise_repo.find_by_id(&set.exercise_id),
        state.settings_repo.get(&auth_user.id),
    )?;
    let unit = settings.weight_unit;

    render(&EditSetTemplate {
        user: auth_user,
        workout,
        exercise_name: exercise.map(|e| e.name).unwrap_or_default(),
        weight_value: weight_input_value(unit, set.weight_kg),
        rest_value: set.rest_seconds.map(|r| r.to_string()).unwrap_or_default(),
        unit_label: unit.as_str(),
        set,
        error,
    })
}

pub async fn update_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path((id, set_id)): Path<(String, String)>,
    Form(form): Form<SetForm>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;
    let set = owned_set(&state, &workout, &set_id).await?;

    let settings = state.settings_repo.get(&auth_user.id).await?;
    let weight_kg = settings.weight_unit.to_kg(form.weight);
    if let Err(message) = validate_set(form.reps, weight_kg, form.rest_seconds) {
        return render_edit_set(&state, auth_user, workout, set, Some(message.to_string())).await;
    }

    state
        .workout_repo
        .update_set(&set.id, &workout.id, form.reps, weight_kg, form.rest_seconds)
        .await?;
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to(&workout_url(&id)).into_response())
}

pub async fn delete_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path((id, set_id)): Path<(String, String)>,
) -> Result<Response> {
    let workout = owned_workout(&state.workout_repo, &id, &auth_user.id).await?;
    if !state.workout_repo.delete_set(&set_id, &workout.id).await? {
        return Err(AppError::NotFound("Set not found".to_string()));
    }
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to(&workout_url(&id)).into_response())
}
