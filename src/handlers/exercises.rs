use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::render;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::exercise::{ExerciseCategory, CATEGORIES};
use crate::models::{Exercise, ExerciseForm};
use crate::progress::DashboardCache;
use crate::repositories::ExerciseRepository;

#[derive(Clone)]
pub struct ExercisesState {
    pub exercise_repo: ExerciseRepository,
    pub dashboard_cache: DashboardCache,
}

pub struct CategoryGroup {
    pub label: &'static str,
    pub exercises: Vec<Exercise>,
}

/// Exercises bucketed by category in the fixed category order; empty
/// categories are left out.
pub fn group_by_category(exercises: Vec<Exercise>) -> Vec<CategoryGroup> {
    CATEGORIES
        .iter()
        .map(|category| CategoryGroup {
            label: category.display_name,
            exercises: exercises
                .iter()
                .filter(|e| e.category == category.name)
                .cloned()
                .collect(),
        })
        .filter(|group| !group.exercises.is_empty())
        .collect()
}

#[derive(Template)]
#[template(path = "exercises/list.html")]
struct ExercisesListTemplate {
    user: AuthUser,
    groups: Vec<CategoryGroup>,
}

#[derive(Template)]
#[template(path = "exercises/new.html")]
struct NewExerciseTemplate {
    user: AuthUser,
    categories: &'static [ExerciseCategory],
    name: String,
    category: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "exercises/edit.html")]
struct EditExerciseTemplate {
    user: AuthUser,
    exercise: Exercise,
    categories: &'static [ExerciseCategory],
    error: Option<String>,
}

async fn editable_exercise(state: &ExercisesState, id: &str, user_id: &str) -> Result<Exercise> {
    let exercise = state
        .exercise_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exercise not found".to_string()))?;

    if exercise.user_id != user_id {
        return Err(AppError::Forbidden(
            "You can only change your own exercises".to_string(),
        ));
    }
    Ok(exercise)
}

/// Validation message for a create or rename, including the per-user
/// uniqueness check.
async fn form_problem(
    state: &ExercisesState,
    user_id: &str,
    form: &ExerciseForm,
    except_id: Option<&str>,
) -> Result<Option<&'static str>> {
    if let Err(message) = form.validate() {
        return Ok(Some(message));
    }
    if state
        .exercise_repo
        .name_taken(user_id, form.name.trim(), except_id)
        .await?
    {
        return Ok(Some("You already have an exercise with that name"));
    }
    Ok(None)
}

pub async fn list(State(state): State<ExercisesState>, auth_user: AuthUser) -> Result<Response> {
    let exercises = state.exercise_repo.find_by_user(&auth_user.id).await?;

    render(&ExercisesListTemplate {
        user: auth_user,
        groups: group_by_category(exercises),
    })
}

pub async fn new_page(auth_user: AuthUser) -> Result<Response> {
    render(&NewExerciseTemplate {
        user: auth_user,
        categories: CATEGORIES,
        name: String::new(),
        category: String::new(),
        error: None,
    })
}

pub async fn create(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Form(form): Form<ExerciseForm>,
) -> Result<Response> {
    if let Some(message) = form_problem(&state, &auth_user.id, &form, None).await? {
        return render(&NewExerciseTemplate {
            user: auth_user,
            categories: CATEGORIES,
            name: form.name,
            category: form.category,
            error: Some(message.to_string()),
        });
    }

    state
        .exercise_repo
        .create(&auth_user.id, form.name.trim(), &form.category)
        .await?;

    Ok(Redirect::to("/exercises").into_response())
}

pub async fn edit_page(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let exercise = editable_exercise(&state, &id, &auth_user.id).await?;

    render(&EditExerciseTemplate {
        user: auth_user,
        exercise,
        categories: CATEGORIES,
        error: None,
    })
}

pub async fn update(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<ExerciseForm>,
) -> Result<Response> {
    let exercise = editable_exercise(&state, &id, &auth_user.id).await?;

    if let Some(message) = form_problem(&state, &auth_user.id, &form, Some(&id)).await? {
        return render(&EditExerciseTemplate {
            user: auth_user,
            exercise,
            categories: CATEGORIES,
            error: Some(message.to_string()),
        });
    }

    state
        .exercise_repo
        .update(&id, &auth_user.id, form.name.trim(), &form.category)
        .await?;
    state.dashboard_cache.invalidate(&auth_user.id);

    Ok(Redirect::to("/exercises").into_response())
}

pub async fn delete(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    editable_exercise(&state, &id, &auth_user.id).await?;

    state.exercise_repo.delete(&id, &auth_user.id).await?;
    state.dashboard_cache.invalidate(&auth_user.id);
    tracing::info!(exercise_id = %id, "Exercise deleted");

    Ok(Redirect::to("/exercises").into_response())
}
