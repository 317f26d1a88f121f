use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use crate::cache::Debouncer;
use crate::db::DbPool;
use crate::handlers::{
    api, auth, community, dashboard, exercises, goals, health, history, photos, progress, settings,
    workouts,
};
use crate::progress::DashboardCache;
use crate::repositories::{
    CommunityRepository, ExerciseRepository, GoalRepository, PhotoRepository, SessionRepository,
    SettingsRepository, UserRepository, WorkoutRepository,
};
use crate::storage::PhotoStorage;

/// Every handler state the router needs.
pub struct AppStates {
    pub auth: auth::AuthState,
    pub dashboard: dashboard::DashboardState,
    pub workouts: workouts::WorkoutsState,
    pub exercises: exercises::ExercisesState,
    pub history: history::HistoryState,
    pub progress: progress::ProgressState,
    pub goals: goals::GoalsState,
    pub community: community::CommunityState,
    pub photos: photos::PhotosState,
    pub settings: settings::SettingsState,
    pub api: api::ApiState,
}

impl AppStates {
    /// Wire repositories over one pool into every handler state.
    ///
    /// The dashboard cache is shared so mutating handlers can invalidate it.
    pub fn new(
        pool: &DbPool,
        storage: PhotoStorage,
        dashboard_cache: DashboardCache,
        debouncer: Debouncer,
    ) -> Self {
        let user_repo = UserRepository::new(pool.clone());
        let session_repo = SessionRepository::new(pool.clone());
        let settings_repo = SettingsRepository::new(pool.clone());
        let exercise_repo = ExerciseRepository::new(pool.clone());
        let workout_repo = WorkoutRepository::new(pool.clone());
        let goal_repo = GoalRepository::new(pool.clone());
        let community_repo = CommunityRepository::new(pool.clone());
        let photo_repo = PhotoRepository::new(pool.clone());

        Self {
            auth: auth::AuthState {
                user_repo: user_repo.clone(),
                session_repo: session_repo.clone(),
            },
            dashboard: dashboard::DashboardState {
                workout_repo: workout_repo.clone(),
                goal_repo: goal_repo.clone(),
                exercise_repo: exercise_repo.clone(),
                settings_repo: settings_repo.clone(),
                cache: dashboard_cache.clone(),
            },
            workouts: workouts::WorkoutsState {
                workout_repo: workout_repo.clone(),
                exercise_repo: exercise_repo.clone(),
                settings_repo: settings_repo.clone(),
                photo_repo: photo_repo.clone(),
                dashboard_cache: dashboard_cache.clone(),
                debouncer,
            },
            exercises: exercises::ExercisesState {
                exercise_repo: exercise_repo.clone(),
                dashboard_cache: dashboard_cache.clone(),
            },
            history: history::HistoryState {
                workout_repo: workout_repo.clone(),
            },
            progress: progress::ProgressState {
                workout_repo: workout_repo.clone(),
                exercise_repo: exercise_repo.clone(),
                settings_repo: settings_repo.clone(),
            },
            goals: goals::GoalsState {
                workout_repo: workout_repo.clone(),
                goal_repo,
                exercise_repo,
                settings_repo: settings_repo.clone(),
                dashboard_cache: dashboard_cache.clone(),
            },
            community: community::CommunityState {
                community_repo: community_repo.clone(),
                workout_repo: workout_repo.clone(),
                settings_repo: settings_repo.clone(),
            },
            photos: photos::PhotosState {
                photo_repo,
                workout_repo: workout_repo.clone(),
                storage,
            },
            settings: settings::SettingsState {
                user_repo,
                session_repo,
                settings_repo: settings_repo.clone(),
                dashboard_cache: dashboard_cache.clone(),
            },
            api: api::ApiState {
                community_repo,
                workout_repo,
                settings_repo,
                dashboard_cache,
            },
        }
    }
}

pub fn create_router(
    states: AppStates,
    pool: DbPool,
    session_repo: SessionRepository,
    max_upload_bytes: usize,
) -> Router {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::index))
        .with_state(states.dashboard)
        // Auth routes
        .route(
            "/auth/login",
            get(auth::login_page).post(auth::login_submit),
        )
        .route(
            "/auth/signup",
            get(auth::signup_page).post(auth::signup_submit),
        )
        .route("/auth/logout", post(auth::logout))
        .with_state(states.auth)
        // Workout routes
        .route("/workouts", get(workouts::list).post(workouts::create))
        .route("/workouts/new", get(workouts::new_page))
        .route("/workouts/{id}", get(workouts::show).post(workouts::update))
        .route("/workouts/{id}/edit", get(workouts::edit_page))
        .route("/workouts/{id}/delete", post(workouts::delete))
        .route("/workouts/{id}/publish", post(workouts::publish))
        .route("/workouts/{id}/unpublish", post(workouts::unpublish))
        .route("/workouts/{id}/timer", post(workouts::timer_action))
        .route("/workouts/{id}/sets", post(workouts::add_set))
        .route("/workouts/{id}/sets/{set_id}", post(workouts::update_set))
        .route("/workouts/{id}/sets/{set_id}/edit", get(workouts::edit_set_page))
        .route("/workouts/{id}/sets/{set_id}/delete", post(workouts::delete_set))
        .with_state(states.workouts)
        // Exercise routes
        .route("/exercises", get(exercises::list).post(exercises::create))
        .route("/exercises/new", get(exercises::new_page))
        .route("/exercises/{id}", post(exercises::update))
        .route("/exercises/{id}/edit", get(exercises::edit_page))
        .route("/exercises/{id}/delete", post(exercises::delete))
        .with_state(states.exercises)
        // History and progress
        .route("/history", get(history::index))
        .with_state(states.history)
        .route("/progress", get(progress::index))
        .route("/progress/records", get(progress::records))
        .route("/progress/exercises/{id}", get(progress::exercise))
        .with_state(states.progress)
        // Goals
        .route("/goals", get(goals::index).post(goals::create))
        .route("/goals/{id}/delete", post(goals::delete))
        .with_state(states.goals)
        // Community
        .route("/community", get(community::feed))
        .route("/community/workouts/{id}", get(community::show))
        .route("/community/workouts/{id}/reactions", post(community::react))
        .route("/community/workouts/{id}/comments", post(community::comment))
        .route("/community/comments/{id}/delete", post(community::delete_comment))
        .with_state(states.community)
        // Progress photos
        .route(
            "/photos",
            get(photos::index)
                .post(photos::upload)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/photos/{id}/image", get(photos::image))
        .route("/photos/{id}/delete", post(photos::delete))
        .with_state(states.photos)
        // Settings
        .route("/settings", get(settings::index).post(settings::update))
        .route("/settings/password", post(settings::change_password))
        .with_state(states.settings)
        // JSON API
        .route(
            "/api/workouts/{id}/timer",
            get(api::timer).post(api::timer_action),
        )
        .route("/api/workouts/{id}/reactions", post(api::toggle_reaction))
        .route(
            "/api/workouts/{id}/comments",
            get(api::list_comments).post(api::add_comment),
        )
        .route("/api/comments/{id}", axum::routing::delete(api::delete_comment))
        .with_state(states.api)
        // Health check
        .route("/health", get(health::health_check))
        .with_state(pool)
        // Session lookups for the auth extractors
        .layer(Extension(session_repo))
        .layer(TraceLayer::new_for_http())
}
