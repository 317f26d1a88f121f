mod common;

use axum::http::StatusCode;
use fitlog::repositories::{ExerciseRepository, WorkoutRepository};

#[tokio::test]
async fn test_exercises_list_requires_auth() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = common::get(&app, "/exercises", "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/auth/login");
}

#[tokio::test]
async fn test_exercises_list_groups_by_category() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    common::create_test_exercise(&pool, &user.id, "Bench Press", "chest").await;
    common::create_test_exercise(&pool, &user.id, "Squat", "legs").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::get(&app, "/exercises", &cookie).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Chest"));
    assert!(body.contains("Legs"));
    assert!(body.contains("Bench Press"));
    assert!(body.contains("Squat"));
}

#[tokio::test]
async fn test_create_exercise() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/exercises", &cookie, "name=Face+Pull&category=shoulders").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/exercises");

    let exercises = tokio_test::assert_ok!(ExerciseRepository::new(pool).find_by_user(&user.id).await);
    assert_eq!(exercises.len(), 1);
    assert_eq!(exercises[0].name, "Face Pull");
    assert_eq!(exercises[0].category, "shoulders");
}

#[tokio::test]
async fn test_create_exercise_rejects_duplicate_name() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    common::create_test_exercise(&pool, &user.id, "Deadlift", "back").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/exercises", &cookie, "name=Deadlift&category=back").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("You already have an exercise with that name"));
}

#[tokio::test]
async fn test_same_name_allowed_for_different_users() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let alice = common::create_test_user(&pool, "alice").await;
    let bob = common::create_test_user(&pool, "bob").await;
    common::create_test_exercise(&pool, &alice.id, "Deadlift", "back").await;
    let cookie = common::create_session_cookie(&pool, &bob).await;

    let response = common::post_form(&app, "/exercises", &cookie, "name=Deadlift&category=back").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_create_exercise_rejects_unknown_category() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/exercises", &cookie, "name=Juggling&category=circus").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Unknown category"));
}

#[tokio::test]
async fn test_rename_exercise() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let exercise = common::create_test_exercise(&pool, &user.id, "Bench", "chest").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::get(&app, &format!("/exercises/{}/edit", exercise.id), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = common::post_form(
        &app,
        &format!("/exercises/{}", exercise.id),
        &cookie,
        "name=Incline+Bench&category=chest",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let renamed = ExerciseRepository::new(pool).find_by_id(&exercise.id).await.unwrap().unwrap();
    assert_eq!(renamed.name, "Incline Bench");
}

#[tokio::test]
async fn test_cannot_edit_other_users_exercise() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let owner = common::create_test_user(&pool, "owner").await;
    let other = common::create_test_user(&pool, "other").await;
    let exercise = common::create_test_exercise(&pool, &owner.id, "Bench", "chest").await;
    let cookie = common::create_session_cookie(&pool, &other).await;

    let response = common::get(&app, &format!("/exercises/{}/edit", exercise.id), &cookie).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = common::post_form(&app, &format!("/exercises/{}/delete", exercise.id), &cookie, "").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_exercise_removes_its_sets() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let exercise = common::create_test_exercise(&pool, &user.id, "Bench", "chest").await;
    let workout = common::create_test_workout(&pool, &user.id, "Push", common::today(), false).await;
    common::create_test_set(&pool, &workout.id, &exercise.id, 1, 5, 80.0).await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, &format!("/exercises/{}/delete", exercise.id), &cookie, "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(ExerciseRepository::new(pool.clone()).find_by_id(&exercise.id).await.unwrap().is_none());
    let sets = WorkoutRepository::new(pool).find_sets_by_workout(&workout.id).await.unwrap();
    assert!(sets.is_empty());
}
