use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::workouts::{group_sets, ExerciseGroup};
use super::{render, PageQuery, PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::community::{clean_comment, CommentForm, ReactionForm};
use crate::models::personal_record::{compute_records, record_set_ids};
use crate::models::{Comment, CommentWithAuthor, FeedItem, ReactionKind};
use crate::repositories::{CommunityRepository, SettingsRepository, WorkoutRepository};

#[derive(Clone)]
pub struct CommunityState {
    pub community_repo: CommunityRepository,
    pub workout_repo: WorkoutRepository,
    pub settings_repo: SettingsRepository,
}

pub struct ReactionButton {
    pub kind: &'static str,
    pub emoji: &'static str,
    pub count: i64,
    pub active: bool,
}

pub struct CommentRow {
    pub comment: CommentWithAuthor,
    pub can_delete: bool,
}

#[derive(Template)]
#[template(path = "community/feed.html")]
struct FeedTemplate {
    user: AuthUser,
    items: Vec<FeedItem>,
    page: i64,
    has_more: bool,
}

#[derive(Template)]
#[template(path = "community/show.html")]
struct ShowTemplate {
    user: AuthUser,
    item: FeedItem,
    groups: Vec<ExerciseGroup>,
    reactions: Vec<ReactionButton>,
    comments: Vec<CommentRow>,
    error: Option<String>,
}

/// A workout the viewer may look at: public, or their own.
pub(crate) async fn visible_item(repo: &CommunityRepository, id: &str, viewer_id: &str) -> Result<FeedItem> {
    repo.find_item(id)
        .await?
        .filter(|item| item.is_public || item.user_id == viewer_id)
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))
}

/// A workout that accepts reactions and comments.
pub(crate) async fn public_item(repo: &CommunityRepository, id: &str) -> Result<FeedItem> {
    repo.find_item(id)
        .await?
        .filter(|item| item.is_public)
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))
}

pub(crate) fn can_delete_comment(comment_user_id: &str, workout_owner_id: &str, viewer_id: &str) -> bool {
    comment_user_id == viewer_id || workout_owner_id == viewer_id
}

/// Delete a comment on behalf of `viewer_id`, returning it.
pub(crate) async fn delete_comment_as(
    community_repo: &CommunityRepository,
    workout_repo: &WorkoutRepository,
    comment_id: &str,
    viewer_id: &str,
) -> Result<Comment> {
    let comment = community_repo
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    let workout = workout_repo
        .find_by_id(&comment.workout_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))?;

    if !can_delete_comment(&comment.user_id, &workout.user_id, viewer_id) {
        return Err(AppError::Forbidden(
            "You can only delete your own comments".to_string(),
        ));
    }

    community_repo.delete_comment(&comment.id).await?;
    tracing::debug!(comment_id = %comment.id, "Comment deleted");
    Ok(comment)
}

fn community_url(workout_id: &str) -> String {
    format!("/community/workouts/{}", workout_id)
}

async fn render_show(
    state: &CommunityState,
    auth_user: AuthUser,
    item: FeedItem,
    error: Option<String>,
) -> Result<Response> {
    let (sets, owner_history, counts, mine, comments, settings) = tokio::try_join!(
        state.workout_repo.find_sets_by_workout(&item.workout_id),
        state.workout_repo.set_history(&item.user_id),
        state.community_repo.reaction_counts(&item.workout_id),
        state
            .community_repo
            .user_reactions(&item.workout_id, &auth_user.id),
        state.community_repo.list_comments(&item.workout_id),
        state.settings_repo.get(&auth_user.id),
    )?;

    let pr_ids = record_set_ids(&compute_records(&owner_history));
    let reactions = ReactionKind::ALL
        .into_iter()
        .map(|kind| ReactionButton {
            kind: kind.as_str(),
            emoji: kind.emoji(),
            count: counts.get(kind),
            active: mine.contains(&kind),
        })
        .collect();
    let comments = comments
        .into_iter()
        .map(|comment| CommentRow {
            can_delete: can_delete_comment(&comment.user_id, &item.user_id, &auth_user.id),
            comment,
        })
        .collect();

    render(&ShowTemplate {
        user: auth_user,
        groups: group_sets(&sets, settings.weight_unit, &pr_ids),
        item,
        reactions,
        comments,
        error,
    })
}

pub async fn feed(
    State(state): State<CommunityState>,
    auth_user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (items, has_more) = state
        .community_repo
        .feed_page(PAGE_SIZE, query.offset())
        .await?;

    render(&FeedTemplate {
        user: auth_user,
        items,
        page: query.page(),
        has_more,
    })
}

pub async fn show(
    State(state): State<CommunityState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let item = visible_item(&state.community_repo, &id, &auth_user.id).await?;
    render_show(&state, auth_user, item, None).await
}

pub async fn react(
    State(state): State<CommunityState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<ReactionForm>,
) -> Result<Response> {
    let item = public_item(&state.community_repo, &id).await?;
    let kind = ReactionKind::parse(&form.kind)
        .ok_or_else(|| AppError::BadRequest("Unknown reaction".to_string()))?;

    state
        .community_repo
        .toggle_reaction(&item.workout_id, &auth_user.id, kind)
        .await?;

    Ok(Redirect::to(&community_url(&item.workout_id)).into_response())
}

pub async fn comment(
    State(state): State<CommunityState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let item = public_item(&state.community_repo, &id).await?;

    let body = match clean_comment(&form.body) {
        Ok(body) => body,
        Err(message) => return render_show(&state, auth_user, item, Some(message.to_string())).await,
    };

    state
        .community_repo
        .add_comment(&item.workout_id, &auth_user.id, body)
        .await?;

    Ok(Redirect::to(&community_url(&item.workout_id)).into_response())
}

pub async fn delete_comment(
    State(state): State<CommunityState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let comment =
        delete_comment_as(&state.community_repo, &state.workout_repo, &id, &auth_user.id).await?;
    Ok(Redirect::to(&community_url(&comment.workout_id)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_deletion_rights() {
        assert!(can_delete_comment("author", "owner", "author"));
        assert!(can_delete_comment("author", "owner", "owner"));
        assert!(!can_delete_comment("author", "owner", "stranger"));
    }
}
