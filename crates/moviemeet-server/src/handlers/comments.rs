use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use moviemeet_shared::{
    api::{CreateCommentRequest, UpdateCommentRequest},
    MeetupComment, UserSummary,
};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::AppState;

use super::meetups::meetup_organizer;

type CommentRow = (
    i64,           // id
    i64,           // meetup_id
    i64,           // user id
    String,        // username
    String,        // first_name
    String,        // last_name
    String,        // text
    DateTime<Utc>, // created_at
    DateTime<Utc>, // updated_at
);

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.meetup_id, u.id, u.username, u.first_name, u.last_name,
           c.text, c.created_at, c.updated_at
    FROM meetup_comments c
    JOIN users u ON u.id = c.user_id
"#;

fn row_to_comment(row: CommentRow) -> MeetupComment {
    MeetupComment {
        id: row.0,
        meetup_id: row.1,
        user: UserSummary {
            id: row.2,
            username: row.3,
            first_name: row.4,
            last_name: row.5,
        },
        text: row.6,
        created_at: row.7,
        updated_at: row.8,
    }
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Comment text is required".to_string()));
    }
    Ok(())
}

/// Comments on a meetup, newest first.
pub async fn fetch_comments(db: &DbPool, meetup_id: i64) -> Result<Vec<MeetupComment>, AppError> {
    let query = format!(
        "{} WHERE c.meetup_id = $1 ORDER BY c.created_at DESC, c.id DESC",
        COMMENT_SELECT
    );
    let rows: Vec<CommentRow> = sqlx::query_as(&query)
        .bind(meetup_id)
        .fetch_all(db)
        .await?;

    Ok(rows.into_iter().map(row_to_comment).collect())
}

async fn fetch_comment(db: &DbPool, comment_id: i64) -> Result<MeetupComment, AppError> {
    let query = format!("{} WHERE c.id = $1", COMMENT_SELECT);
    let row: Option<CommentRow> = sqlx::query_as(&query)
        .bind(comment_id)
        .fetch_optional(db)
        .await?;

    row.map(row_to_comment)
        .ok_or_else(|| AppError::not_found("Comment"))
}

/// Author of a comment that belongs to the given meetup.
async fn comment_author(db: &DbPool, meetup_id: i64, comment_id: i64) -> Result<i64, AppError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT user_id FROM meetup_comments WHERE id = $1 AND meetup_id = $2")
            .bind(comment_id)
            .bind(meetup_id)
            .fetch_optional(db)
            .await?;

    row.map(|(user_id,)| user_id)
        .ok_or_else(|| AppError::not_found("Comment"))
}

/// GET /api/v1/meetups/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(meetup_id): Path<i64>,
) -> Result<Json<Vec<MeetupComment>>, AppError> {
    meetup_organizer(&state.db, meetup_id).await?;
    Ok(Json(fetch_comments(&state.db, meetup_id).await?))
}

/// POST /api/v1/meetups/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(meetup_id): Path<i64>,
    AppJson(req): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<MeetupComment>), AppError> {
    validate_text(&req.text)?;

    // Any signed-in user can comment on any meetup
    let (comment_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO meetup_comments (meetup_id, user_id, text)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(meetup_id)
    .bind(user.id)
    .bind(&req.text)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::on_missing_reference(e, "Meetup"))?;

    Ok((
        StatusCode::CREATED,
        Json(fetch_comment(&state.db, comment_id).await?),
    ))
}

/// PATCH /api/v1/meetups/:id/comments/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((meetup_id, comment_id)): Path<(i64, i64)>,
    AppJson(req): AppJson<UpdateCommentRequest>,
) -> Result<Json<MeetupComment>, AppError> {
    validate_text(&req.text)?;

    // Author only
    if comment_author(&state.db, meetup_id, comment_id).await? != user.id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("UPDATE meetup_comments SET text = $1, updated_at = NOW() WHERE id = $2")
        .bind(&req.text)
        .bind(comment_id)
        .execute(&state.db)
        .await?;

    Ok(Json(fetch_comment(&state.db, comment_id).await?))
}

/// DELETE /api/v1/meetups/:id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((meetup_id, comment_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let author_id = comment_author(&state.db, meetup_id, comment_id).await?;

    // Author or meetup organizer can delete
    if author_id != user.id && meetup_organizer(&state.db, meetup_id).await? != user.id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM meetup_comments WHERE id = $1")
        .bind(comment_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
