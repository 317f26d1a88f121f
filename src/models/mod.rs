pub mod calendar;
pub mod community;
pub mod exercise;
pub mod from_row;
pub mod goal;
pub mod personal_record;
pub mod photo;
pub mod settings;
pub mod timer;
pub mod user;
pub mod workout;
pub mod workout_set;

pub use community::{Comment, CommentWithAuthor, FeedItem, ReactionCounts, ReactionKind};
pub use exercise::{Exercise, ExerciseForm};
pub use from_row::FromSqliteRow;
pub use goal::{Goal, GoalKind, GoalMetrics, GoalProgress};
pub use personal_record::PersonalRecord;
pub use photo::ProgressPhoto;
pub use settings::{UserSettings, WeightUnit};
pub use timer::{TimerAction, TimerSnapshot, TimerState, WorkoutTimer};
pub use user::{Credentials, User};
pub use workout::{Workout, WorkoutForm};
pub use workout_set::{SetForm, WorkoutSet, WorkoutSetWithExercise};
