mod common;

use axum::http::StatusCode;
use fitlog::models::GoalKind;
use fitlog::repositories::GoalRepository;

#[tokio::test]
async fn test_goals_page_requires_auth() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = common::get(&app, "/goals", "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/auth/login");
}

#[tokio::test]
async fn test_create_weekly_workouts_goal_tracks_progress() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    common::create_test_workout(&pool, &user.id, "Today", common::today(), false).await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/goals", &cookie, "kind=weekly_workouts&target_value=4&exercise_id=&deadline=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/goals");

    let response = common::get(&app, "/goals", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("4 workouts this week"));
    assert!(body.contains("1 workouts (25%)"));
}

#[tokio::test]
async fn test_exercise_weight_goal_requires_exercise() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/goals", &cookie, "kind=exercise_weight&target_value=100&exercise_id=").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Choose an exercise"));
    let goals = GoalRepository::new(pool).find_by_user(&user.id).await.unwrap();
    assert!(goals.is_empty());
}

#[tokio::test]
async fn test_goal_rejects_non_positive_target() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/goals", &cookie, "kind=monthly_volume&target_value=0").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Target must be positive"));
}

#[tokio::test]
async fn test_goal_rejects_bad_deadline() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/goals", &cookie, "kind=weekly_workouts&target_value=3&deadline=soon").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Deadline must be a date"));
}

#[tokio::test]
async fn test_reached_weight_goal_is_marked_achieved() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let exercise = common::create_test_exercise(&pool, &user.id, "Bench Press", "chest").await;
    let workout = common::create_test_workout(&pool, &user.id, "Push", common::today(), false).await;
    common::create_test_set(&pool, &workout.id, &exercise.id, 1, 1, 100.0).await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(
        &app,
        "/goals",
        &cookie,
        &format!("kind=exercise_weight&target_value=100&exercise_id={}", exercise.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = common::body_string(common::get(&app, "/goals", &cookie).await).await;
    assert!(body.contains("Bench Press at 100 kg"));
    assert!(body.contains("achieved"));

    let goals = GoalRepository::new(pool).find_by_user(&user.id).await.unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].kind, GoalKind::ExerciseWeight);
    assert!(goals[0].achieved_at.is_some());
}

#[tokio::test]
async fn test_volume_goal_stored_in_kilograms() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "imperial").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    common::post_form(
        &app,
        "/settings",
        &cookie,
        "display_name=Imperial&weight_unit=lb&default_rest_seconds=90",
    )
    .await;
    common::post_form(&app, "/goals", &cookie, "kind=monthly_volume&target_value=10000").await;

    let goals = GoalRepository::new(pool).find_by_user(&user.id).await.unwrap();
    assert_eq!(goals.len(), 1);
    assert!((goals[0].target_value - 4535.9237).abs() < 0.001);
}

#[tokio::test]
async fn test_delete_goal() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let owner = common::create_test_user(&pool, "owner").await;
    let other = common::create_test_user(&pool, "other").await;
    let goal_repo = GoalRepository::new(pool.clone());
    let goal = goal_repo
        .create(&owner.id, GoalKind::WeeklyWorkouts, None, 3.0, None)
        .await
        .unwrap();

    // Someone else's goal looks missing
    let other_cookie = common::create_session_cookie(&pool, &other).await;
    let response = common::post_form(&app, &format!("/goals/{}/delete", goal.id), &other_cookie, "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let cookie = common::create_session_cookie(&pool, &owner).await;
    let response = common::post_form(&app, &format!("/goals/{}/delete", goal.id), &cookie, "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(goal_repo.find_by_id(&goal.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_goal_with_blank_target_shows_inline_error() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let user = common::create_test_user(&pool, "lifter").await;
    let cookie = common::create_session_cookie(&pool, &user).await;

    let response = common::post_form(&app, "/goals", &cookie, "kind=weekly_workouts&target_value=&deadline=").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Target must be positive"));
    assert!(GoalRepository::new(pool).find_by_user(&user.id).await.unwrap().is_empty());
}
