pub mod community_repo;
pub mod exercise_repo;
pub mod goal_repo;
pub mod photo_repo;
pub mod session_repo;
pub mod settings_repo;
pub mod user_repo;
pub mod workout_repo;

pub use community_repo::CommunityRepository;
pub use exercise_repo::ExerciseRepository;
pub use goal_repo::GoalRepository;
pub use photo_repo::PhotoRepository;
pub use session_repo::SessionRepository;
pub use settings_repo::SettingsRepository;
pub use user_repo::UserRepository;
pub use workout_repo::WorkoutRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::{create_memory_pool, DbPool};
    use crate::migrations::run_migrations_for_tests;

    pub fn setup_test_db() -> DbPool {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        pool
    }

    pub fn create_test_user(pool: &DbPool, user_id: &str) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, datetime('now'))",
            rusqlite::params![user_id, format!("user_{}", user_id), "hash"],
        )
        .unwrap();
    }
}
