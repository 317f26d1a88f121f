use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::{AppError, Result};
use crate::repositories::SessionRepository;
use crate::session::get_session_token;

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    /// Token of the session that authenticated this request.
    pub token: String,
}

impl AuthUser {
    /// Resolve the session cookie of a request, if any.
    async fn from_parts(parts: &Parts) -> Result<Option<Self>> {
        let Some(token) = get_session_token(&CookieJar::from_headers(&parts.headers)) else {
            return Ok(None);
        };

        let session_repo = parts
            .extensions
            .get::<SessionRepository>()
            .ok_or_else(|| AppError::Internal("Session repository not configured".to_string()))?;

        Ok(session_repo.find_user(&token).await?.map(|user| Self {
            id: user.user_id,
            username: user.username,
            token,
        }))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        match AuthUser::from_parts(parts).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthRedirect.into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/auth/login").into_response()
    }
}

/// Signed-in user for JSON endpoints: answers 401 instead of redirecting.
#[derive(Clone, Debug)]
pub struct ApiUser(pub AuthUser);

impl<S> FromRequestParts<S> for ApiUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        AuthUser::from_parts(parts)
            .await?
            .map(ApiUser)
            .ok_or(AppError::Unauthorized)
    }
}

// Optional auth - doesn't redirect, just returns None if not logged in
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(AuthUser::from_parts(parts).await?))
    }
}
