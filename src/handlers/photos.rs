use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::render;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::photo::extension_for;
use crate::models::{ProgressPhoto, Workout};
use crate::repositories::{PhotoRepository, WorkoutRepository};
use crate::progress::local_today;
use crate::storage::PhotoStorage;

const CAPTION_MAX_LEN: usize = 200;
const WORKOUT_CHOICES: i64 = 20;

#[derive(Clone)]
pub struct PhotosState {
    pub photo_repo: PhotoRepository,
    pub workout_repo: WorkoutRepository,
    pub storage: PhotoStorage,
}

#[derive(Template)]
#[template(path = "photos/index.html")]
struct PhotosTemplate {
    user: AuthUser,
    photos: Vec<ProgressPhoto>,
    workouts: Vec<Workout>,
    today: NaiveDate,
    error: Option<String>,
}

/// Fields collected from the upload form.
#[derive(Default)]
struct Upload {
    bytes: Vec<u8>,
    content_type: Option<String>,
    caption: Option<String>,
    taken_on: Option<String>,
    workout_id: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = field.bytes().await?.to_vec();
            }
            "caption" => upload.caption = non_blank(field.text().await?),
            "taken_on" => upload.taken_on = non_blank(field.text().await?),
            "workout_id" => upload.workout_id = non_blank(field.text().await?),
            _ => {}
        }
    }
    Ok(upload)
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

async fn render_gallery(state: &PhotosState, auth_user: AuthUser, error: Option<String>) -> Result<Response> {
    let (photos, workouts) = tokio::try_join!(
        state.photo_repo.find_by_user(&auth_user.id),
        state
            .workout_repo
            .find_by_user_paginated(&auth_user.id, WORKOUT_CHOICES, 0),
    )?;

    render(&PhotosTemplate {
        user: auth_user,
        photos,
        workouts,
        today: local_today(),
        error,
    })
}

async fn owned_photo(state: &PhotosState, id: &str, user_id: &str) -> Result<ProgressPhoto> {
    state
        .photo_repo
        .find_by_id(id)
        .await?
        .filter(|photo| photo.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
}

pub async fn index(State(state): State<PhotosState>, auth_user: AuthUser) -> Result<Response> {
    render_gallery(&state, auth_user, None).await
}

pub async fn upload(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> Result<Response> {
    let upload = read_upload(multipart).await?;

    if upload.bytes.is_empty() {
        return render_gallery(&state, auth_user, Some("Choose a photo to upload".to_string())).await;
    }
    let content_type = upload.content_type.unwrap_or_default();
    let Some(extension) = extension_for(&content_type) else {
        return render_gallery(
            &state,
            auth_user,
            Some("Photos must be JPEG, PNG or WebP images".to_string()),
        )
        .await;
    };
    if upload
        .caption
        .as_ref()
        .is_some_and(|c| c.chars().count() > CAPTION_MAX_LEN)
    {
        return render_gallery(
            &state,
            auth_user,
            Some("Caption must be at most 200 characters".to_string()),
        )
        .await;
    }
    let taken_on = match upload.taken_on.as_deref() {
        None => local_today(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return render_gallery(&state, auth_user, Some("Date must be a valid date".to_string())).await
            }
        },
    };
    if let Some(workout_id) = upload.workout_id.as_deref() {
        if state
            .workout_repo
            .find_owned(workout_id, &auth_user.id)
            .await?
            .is_none()
        {
            return render_gallery(&state, auth_user, Some("Unknown workout".to_string())).await;
        }
    }

    let photo = ProgressPhoto {
        id: Uuid::new_v4().to_string(),
        user_id: auth_user.id.clone(),
        workout_id: upload.workout_id,
        taken_on,
        caption: upload.caption,
        file_name: PhotoStorage::new_file_name(extension),
        content_type,
        created_at: Utc::now(),
    };

    state.storage.save(&photo.file_name, &upload.bytes).await?;
    if let Err(e) = state.photo_repo.create(&photo).await {
        // Do not leave an orphaned file behind.
        state.storage.delete(&photo.file_name).await?;
        return Err(e);
    }
    tracing::info!(photo_id = %photo.id, size = upload.bytes.len(), "Photo uploaded");

    Ok(Redirect::to("/photos").into_response())
}

pub async fn image(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let photo = owned_photo(&state, &id, &auth_user.id).await?;
    let bytes = state.storage.read(&photo.file_name).await?;

    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let photo = owned_photo(&state, &id, &auth_user.id).await?;

    state.photo_repo.delete(&photo.id, &auth_user.id).await?;
    state.storage.delete(&photo.file_name).await?;
    tracing::info!(photo_id = %photo.id, "Photo deleted");

    Ok(Redirect::to("/photos").into_response())
}
