use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use super::render;
use crate::error::Result;
use crate::middleware::auth::OptionalAuthUser;
use crate::models::user::{validate_password, validate_username};
use crate::models::Credentials;
use crate::repositories::{SessionRepository, UserRepository};
use crate::session::{create_session_cookie, get_session_token, remove_session_cookie};

#[derive(Clone)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
}

// Templates
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    username: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
struct SignupTemplate {
    username: String,
    error: Option<String>,
}

// Handlers
pub async fn login_page(OptionalAuthUser(auth_user): OptionalAuthUser) -> Result<Response> {
    // Redirect to dashboard if already logged in
    if auth_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    render(&LoginTemplate {
        username: String::new(),
        error: None,
    })
}

pub async fn login_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<Response> {
    let username = credentials.username.trim();
    let user = state
        .user_repo
        .verify_password(username, &credentials.password)
        .await?;

    match user {
        Some(user) => {
            let token = state.session_repo.create(&user.id).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            Ok((jar.add(create_session_cookie(&token)), Redirect::to("/")).into_response())
        }
        None => {
            tracing::debug!(username, "Failed login attempt");
            render(&LoginTemplate {
                username: username.to_string(),
                error: Some("Invalid username or password".to_string()),
            })
        }
    }
}

pub async fn signup_page(OptionalAuthUser(auth_user): OptionalAuthUser) -> Result<Response> {
    if auth_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    render(&SignupTemplate {
        username: String::new(),
        error: None,
    })
}

pub async fn signup_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<Credentials>,
) -> Result<Response> {
    let username = form.username.trim().to_string();

    let problem = match validate_username(&username).or_else(|| validate_password(&form.password)) {
        Some(message) => Some(message),
        None if state.user_repo.find_by_username(&username).await?.is_some() => {
            Some("Username is already taken")
        }
        None => None,
    };
    if let Some(message) = problem {
        return render(&SignupTemplate {
            username,
            error: Some(message.to_string()),
        });
    }

    let (user, seeded) = state.user_repo.create_account(&username, &form.password).await?;
    tracing::info!(user_id = %user.id, seeded, "User signed up");

    // Auto login
    let token = state.session_repo.create(&user.id).await?;
    Ok((jar.add(create_session_cookie(&token)), Redirect::to("/")).into_response())
}

pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> Result<Response> {
    if let Some(token) = get_session_token(&jar) {
        state.session_repo.delete(&token).await?;
    }
    Ok((jar.add(remove_session_cookie()), Redirect::to("/auth/login")).into_response())
}
