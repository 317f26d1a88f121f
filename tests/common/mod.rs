#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use fitlog::cache::{Debouncer, TtlCache};
use fitlog::db::{create_memory_pool, DbPool};
use fitlog::migrations::run_migrations_for_tests;
use fitlog::models::{Exercise, User, Workout, WorkoutSet};
use fitlog::repositories::{ExerciseRepository, SessionRepository, UserRepository, WorkoutRepository};
use fitlog::routes::{create_router, AppStates};
use fitlog::storage::PhotoStorage;

pub const TEST_PASSWORD: &str = "password123";
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
}

pub fn create_test_app(pool: DbPool) -> Router {
    create_test_app_with_options(pool, Duration::ZERO, Duration::ZERO).router
}

/// Build the full router with a throwaway upload directory.
///
/// Zero cache and debounce windows keep requests independent unless a test
/// asks for them.
pub fn create_test_app_with_options(
    pool: DbPool,
    cache_ttl: Duration,
    debounce_window: Duration,
) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let storage = PhotoStorage::new(upload_dir.path());

    let states = AppStates::new(
        &pool,
        storage,
        TtlCache::new(cache_ttl),
        Debouncer::new(debounce_window),
    );
    let session_repo = SessionRepository::new(pool.clone());
    let router = create_router(states, pool, session_repo, TEST_MAX_UPLOAD_BYTES);

    TestApp { router, upload_dir }
}

pub async fn create_test_user(pool: &DbPool, username: &str) -> User {
    let user_repo = UserRepository::new(pool.clone());
    user_repo.create(username, TEST_PASSWORD).await.unwrap()
}

pub async fn create_session_cookie(pool: &DbPool, user: &User) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo.create(&user.id).await.unwrap();
    format!("session={}", token)
}

pub fn extract_cookie_header(set_cookie: &str) -> String {
    // Extract just the cookie name=value part for use in Cookie header
    set_cookie.split(';').next().unwrap_or("").to_string()
}

// Test data creation helpers
pub async fn create_test_exercise(pool: &DbPool, user_id: &str, name: &str, category: &str) -> Exercise {
    let exercise_repo = ExerciseRepository::new(pool.clone());
    exercise_repo.create(user_id, name, category).await.unwrap()
}

pub async fn create_test_workout(
    pool: &DbPool,
    user_id: &str,
    name: &str,
    date: chrono::NaiveDate,
    is_public: bool,
) -> Workout {
    let workout_repo = WorkoutRepository::new(pool.clone());
    workout_repo
        .create_workout(user_id, name, date, None, is_public)
        .await
        .unwrap()
}

pub async fn create_test_set(
    pool: &DbPool,
    workout_id: &str,
    exercise_id: &str,
    set_number: i64,
    reps: i64,
    weight_kg: f64,
) -> WorkoutSet {
    let workout_repo = WorkoutRepository::new(pool.clone());
    workout_repo
        .create_set(workout_id, exercise_id, set_number, reps, weight_kg, None)
        .await
        .unwrap()
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// Request helpers
pub async fn get(app: &Router, uri: &str, cookie: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, uri: &str, cookie: &str, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn send_json(app: &Router, method: &str, uri: &str, cookie: &str, body: serde_json::Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
