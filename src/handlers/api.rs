//! JSON endpoints used by the pages' scripts. Every route answers 401
//! instead of redirecting when the session is missing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::community::{delete_comment_as, public_item, visible_item};
use super::workouts::{owned_workout, run_timer_action};
use crate::error::{AppError, Result};
use crate::middleware::ApiUser;
use crate::models::community::{clean_comment, CommentForm, ReactionForm};
use crate::models::{CommentWithAuthor, ReactionCounts, ReactionKind, TimerAction, TimerSnapshot, TimerState};
use crate::progress::DashboardCache;
use crate::repositories::{CommunityRepository, SettingsRepository, WorkoutRepository};

#[derive(Clone)]
pub struct ApiState {
    pub community_repo: CommunityRepository,
    pub workout_repo: WorkoutRepository,
    pub settings_repo: SettingsRepository,
    pub dashboard_cache: DashboardCache,
}

#[derive(Debug, Deserialize)]
pub struct TimerRequest {
    pub action: String,
    #[serde(default)]
    pub rest_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub kind: ReactionKind,
    pub active: bool,
    pub counts: ReactionCounts,
}

pub async fn timer(
    State(state): State<ApiState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<Json<TimerSnapshot>> {
    let workout = owned_workout(&state.workout_repo, &id, &user.id).await?;
    Ok(Json(workout.timer.snapshot(Utc::now())))
}

pub async fn timer_action(
    State(state): State<ApiState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(request): Json<TimerRequest>,
) -> Result<Json<TimerSnapshot>> {
    let workout = owned_workout(&state.workout_repo, &id, &user.id).await?;
    let settings = state.settings_repo.get(&user.id).await?;

    let action = TimerAction::parse(&request.action, request.rest_seconds, settings.default_rest_seconds)
        .ok_or_else(|| AppError::BadRequest("Unknown timer action".to_string()))?;
    let timer = run_timer_action(&state.workout_repo, &workout, action).await?;
    if timer.state == TimerState::Done {
        state.dashboard_cache.invalidate(&user.id);
    }

    Ok(Json(timer.snapshot(Utc::now())))
}

pub async fn toggle_reaction(
    State(state): State<ApiState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(request): Json<ReactionForm>,
) -> Result<Json<ReactionResponse>> {
    let item = public_item(&state.community_repo, &id).await?;
    let kind = ReactionKind::parse(&request.kind)
        .ok_or_else(|| AppError::BadRequest("Unknown reaction".to_string()))?;

    let active = state
        .community_repo
        .toggle_reaction(&item.workout_id, &user.id, kind)
        .await?;
    let counts = state.community_repo.reaction_counts(&item.workout_id).await?;

    Ok(Json(ReactionResponse { kind, active, counts }))
}

pub async fn list_comments(
    State(state): State<ApiState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentWithAuthor>>> {
    let item = visible_item(&state.community_repo, &id, &user.id).await?;
    Ok(Json(state.community_repo.list_comments(&item.workout_id).await?))
}

pub async fn add_comment(
    State(state): State<ApiState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(request): Json<CommentForm>,
) -> Result<Response> {
    let item = public_item(&state.community_repo, &id).await?;
    let body = clean_comment(&request.body).map_err(|m| AppError::Validation(m.to_string()))?;

    let comment = state
        .community_repo
        .add_comment(&item.workout_id, &user.id, body)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    delete_comment_as(&state.community_repo, &state.workout_repo, &id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
