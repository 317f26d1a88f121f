use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::render;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::settings::{PasswordForm, SettingsForm};
use crate::models::user::validate_password;
use crate::models::{UserSettings, WeightUnit};
use crate::progress::DashboardCache;
use crate::repositories::{SessionRepository, SettingsRepository, UserRepository};
use crate::version::GIT_VERSION;

#[derive(Clone)]
pub struct SettingsState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
    pub settings_repo: SettingsRepository,
    pub dashboard_cache: DashboardCache,
}

#[derive(Template)]
#[template(path = "settings/index.html")]
struct SettingsTemplate {
    user: AuthUser,
    settings: UserSettings,
    units: [WeightUnit; 2],
    git_version: &'static str,
    notice: Option<String>,
    error: Option<String>,
}

async fn render_settings(
    state: &SettingsState,
    auth_user: AuthUser,
    notice: Option<String>,
    error: Option<String>,
) -> Result<Response> {
    let settings = state.settings_repo.get(&auth_user.id).await?;
    render(&SettingsTemplate {
        user: auth_user,
        settings,
        units: [WeightUnit::Kg, WeightUnit::Lb],
        git_version: GIT_VERSION,
        notice,
        error,
    })
}

pub async fn index(State(state): State<SettingsState>, auth_user: AuthUser) -> Result<Response> {
    render_settings(&state, auth_user, None, None).await
}

pub async fn update(
    State(state): State<SettingsState>,
    auth_user: AuthUser,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    if let Err(message) = form.validate() {
        return render_settings(&state, auth_user, None, Some(message.to_string())).await;
    }

    let settings = UserSettings {
        user_id: auth_user.id.clone(),
        display_name: form.display_name.trim().to_string(),
        weight_unit: WeightUnit::parse(&form.weight_unit),
        default_rest_seconds: form.default_rest_seconds,
        share_by_default: form.share_by_default.is_some(),
    };
    state.settings_repo.save(&settings).await?;
    // Dashboard labels depend on the weight unit.
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to("/settings").into_response())
}

pub async fn change_password(
    State(state): State<SettingsState>,
    auth_user: AuthUser,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    if state
        .user_repo
        .verify_password(&auth_user.username, &form.current_password)
        .await?
        .is_none()
    {
        return render_settings(
            &state,
            auth_user,
            None,
            Some("Current password is incorrect".to_string()),
        )
        .await;
    }
    if let Some(message) = validate_password(&form.new_password) {
        return render_settings(&state, auth_user, None, Some(message.to_string())).await;
    }

    state
        .user_repo
        .update_password(&auth_user.id, &form.new_password)
        .await?;
    let revoked = state
        .session_repo
        .delete_all_for_user_except(&auth_user.id, &auth_user.token)
        .await?;
    tracing::info!(user_id = %auth_user.id, revoked, "Password changed");

    render_settings(
        &state,
        auth_user,
        Some("Password changed. Other sessions were signed out.".to_string()),
        None,
    )
    .await
}
