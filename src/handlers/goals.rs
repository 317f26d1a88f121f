use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::{NaiveDate, Utc};

use super::render;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::goal::GoalForm;
use crate::models::{Exercise, GoalKind, GoalProgress, WeightUnit};
use crate::progress::{load_goal_progress, local_today, DashboardCache};
use crate::repositories::{ExerciseRepository, GoalRepository, SettingsRepository, WorkoutRepository};

#[derive(Clone)]
pub struct GoalsState {
    pub workout_repo: WorkoutRepository,
    pub goal_repo: GoalRepository,
    pub exercise_repo: ExerciseRepository,
    pub settings_repo: SettingsRepository,
    pub dashboard_cache: DashboardCache,
}

pub struct GoalRow {
    pub id: String,
    pub title: String,
    pub percent: u8,
    pub current_label: String,
    pub deadline: Option<NaiveDate>,
    pub achieved_on: Option<NaiveDate>,
}

impl GoalRow {
    fn new(progress: GoalProgress, unit: WeightUnit) -> Self {
        let current_label = match progress.goal.kind {
            GoalKind::WeeklyWorkouts => format!("{} workouts", progress.current_value),
            GoalKind::ExerciseWeight | GoalKind::MonthlyVolume => unit.format(progress.current_value),
        };
        Self {
            id: progress.goal.id,
            title: progress.title,
            percent: progress.percent,
            current_label,
            deadline: progress.goal.deadline,
            achieved_on: progress.goal.achieved_at.map(|at| at.date_naive()),
        }
    }
}

#[derive(Template)]
#[template(path = "goals/index.html")]
struct GoalsTemplate {
    user: AuthUser,
    goals: Vec<GoalRow>,
    exercises: Vec<Exercise>,
    kinds: [GoalKind; 3],
    unit_label: &'static str,
    error: Option<String>,
}

async fn render_goals(state: &GoalsState, auth_user: AuthUser, error: Option<String>) -> Result<Response> {
    let settings = state.settings_repo.get(&auth_user.id).await?;
    let unit = settings.weight_unit;
    let (progress, exercises) = tokio::try_join!(
        load_goal_progress(
            &state.workout_repo,
            &state.goal_repo,
            &state.exercise_repo,
            &auth_user.id,
            unit,
            local_today(),
            Utc::now(),
        ),
        state.exercise_repo.find_by_user(&auth_user.id),
    )?;

    render(&GoalsTemplate {
        user: auth_user,
        goals: progress.into_iter().map(|p| GoalRow::new(p, unit)).collect(),
        exercises,
        kinds: GoalKind::ALL,
        unit_label: unit.as_str(),
        error,
    })
}

pub async fn index(State(state): State<GoalsState>, auth_user: AuthUser) -> Result<Response> {
    render_goals(&state, auth_user, None).await
}

pub async fn create(
    State(state): State<GoalsState>,
    auth_user: AuthUser,
    Form(form): Form<GoalForm>,
) -> Result<Response> {
    let Some(kind) = GoalKind::parse(&form.kind) else {
        return render_goals(&state, auth_user, Some("Unknown goal type".to_string())).await;
    };
    let target = match form.target_value() {
        Ok(target) => target,
        Err(message) => return render_goals(&state, auth_user, Some(message.to_string())).await,
    };
    let deadline = match form.deadline() {
        Ok(deadline) => deadline,
        Err(message) => return render_goals(&state, auth_user, Some(message.to_string())).await,
    };

    let exercise_id = match (kind, form.exercise_id()) {
        (GoalKind::ExerciseWeight, Some(id)) => {
            if state.exercise_repo.find_owned(id, &auth_user.id).await?.is_none() {
                return render_goals(&state, auth_user, Some("Choose an exercise".to_string())).await;
            }
            Some(id)
        }
        (GoalKind::ExerciseWeight, None) => {
            return render_goals(&state, auth_user, Some("Choose an exercise".to_string())).await;
        }
        _ => None,
    };

    // Weight and volume targets are entered in the user's unit and stored in kg.
    let target_value = match kind {
        GoalKind::WeeklyWorkouts => target,
        GoalKind::ExerciseWeight | GoalKind::MonthlyVolume => {
            let settings = state.settings_repo.get(&auth_user.id).await?;
            settings.weight_unit.to_kg(target)
        }
    };

    let goal = state
        .goal_repo
        .create(&auth_user.id, kind, exercise_id, target_value, deadline)
        .await?;
    state.dashboard_cache.invalidate(&auth_user.id);
    tracing::info!(goal_id = %goal.id, kind = kind.as_str(), "Goal created");

    Ok(Redirect::to("/goals").into_response())
}

pub async fn delete(
    State(state): State<GoalsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    if !state.goal_repo.delete(&id, &auth_user.id).await? {
        return Err(AppError::NotFound("Goal not found".to_string()));
    }
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to("/goals").into_response())
}
