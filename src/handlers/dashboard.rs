use askama::Template;
use axum::{extract::State, response::Response};
use chrono::Utc;

use super::render;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::WeightUnit;
use crate::progress::{local_today, DashboardCache, DashboardSummary};
use crate::repositories::{ExerciseRepository, GoalRepository, SettingsRepository, WorkoutRepository};

#[derive(Clone)]
pub struct DashboardState {
    pub workout_repo: WorkoutRepository,
    pub goal_repo: GoalRepository,
    pub exercise_repo: ExerciseRepository,
    pub settings_repo: SettingsRepository,
    pub cache: DashboardCache,
}

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    user: AuthUser,
    display_name: String,
    summary: DashboardSummary,
    unit: WeightUnit,
}

pub async fn index(State(state): State<DashboardState>, auth_user: AuthUser) -> Result<Response> {
    let settings = state.settings_repo.get(&auth_user.id).await?;
    let unit = settings.weight_unit;

    let summary = state
        .cache
        .get_or_try_insert_with(auth_user.id.clone(), || {
            tracing::debug!(user_id = %auth_user.id, "Building dashboard summary");
            DashboardSummary::load(
                &state.workout_repo,
                &state.goal_repo,
                &state.exercise_repo,
                &auth_user.id,
                unit,
                local_today(),
                Utc::now(),
            )
        })
        .await?;

    render(&DashboardTemplate {
        user: auth_user,
        display_name: settings.display_name,
        summary,
        unit,
    })
}
