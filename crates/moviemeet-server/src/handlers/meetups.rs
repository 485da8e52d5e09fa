use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use moviemeet_shared::{
    api::{
        CreateMeetupRequest, JoinMeetupRequest, MeetupListParams, ParticipantListParams,
        UpdateMeetupRequest,
    },
    Attendance, Meetup, MeetupDetail, MeetupParticipant, MeetupStatus, MovieSummary,
    ParticipantStatus, UserSummary, DEFAULT_MAX_PARTICIPANTS,
};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::reconcile::resolve_movie;
use crate::routes::AppState;

use super::comments::fetch_comments;

const TEXT_MAX_CHARS: usize = 200;

#[derive(sqlx::FromRow)]
struct MeetupRow {
    id: i64,
    title: String,
    description: String,
    location: String,
    theater_name: String,
    meetup_datetime: DateTime<Utc>,
    max_participants: i32,
    status: MeetupStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    movie_id: i64,
    movie_tmdb_id: Option<i64>,
    movie_title: String,
    movie_release_date: NaiveDate,
    movie_poster_url: String,
    organizer_id: i64,
    organizer_username: String,
    organizer_first_name: String,
    organizer_last_name: String,
    accepted_participants: i64,
}

const MEETUP_SELECT: &str = r#"
    SELECT mt.id, mt.title, mt.description, mt.location, mt.theater_name,
           mt.meetup_datetime, mt.max_participants, mt.status, mt.created_at, mt.updated_at,
           mv.id AS movie_id, mv.tmdb_id AS movie_tmdb_id, mv.title AS movie_title,
           mv.release_date AS movie_release_date, mv.poster_url AS movie_poster_url,
           u.id AS organizer_id, u.username AS organizer_username,
           u.first_name AS organizer_first_name, u.last_name AS organizer_last_name,
           (SELECT COUNT(*) FROM meetup_participants p
            WHERE p.meetup_id = mt.id AND p.status = 'accepted') AS accepted_participants
    FROM meetups mt
    JOIN movies mv ON mv.id = mt.movie_id
    JOIN users u ON u.id = mt.organizer_id
"#;

fn row_to_meetup(row: MeetupRow) -> Meetup {
    Meetup {
        id: row.id,
        title: row.title,
        description: row.description,
        movie: MovieSummary {
            id: row.movie_id,
            tmdb_id: row.movie_tmdb_id,
            title: row.movie_title,
            release_date: row.movie_release_date,
            poster_url: row.movie_poster_url,
        },
        organizer: UserSummary {
            id: row.organizer_id,
            username: row.organizer_username,
            first_name: row.organizer_first_name,
            last_name: row.organizer_last_name,
        },
        location: row.location,
        theater_name: row.theater_name,
        meetup_datetime: row.meetup_datetime,
        max_participants: row.max_participants,
        status: row.status,
        attendance: Attendance::new(row.accepted_participants, row.max_participants),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

type ParticipantRow = (
    i64,               // id
    i64,               // meetup_id
    i64,               // user id
    String,            // username
    String,            // first_name
    String,            // last_name
    ParticipantStatus, // status
    String,            // message
    DateTime<Utc>,     // joined_at
    DateTime<Utc>,     // updated_at
);

const PARTICIPANT_SELECT: &str = r#"
    SELECT p.id, p.meetup_id, u.id, u.username, u.first_name, u.last_name,
           p.status, p.message, p.joined_at, p.updated_at
    FROM meetup_participants p
    JOIN users u ON u.id = p.user_id
"#;

fn row_to_participant(row: ParticipantRow) -> MeetupParticipant {
    MeetupParticipant {
        id: row.0,
        meetup_id: row.1,
        user: UserSummary {
            id: row.2,
            username: row.3,
            first_name: row.4,
            last_name: row.5,
        },
        status: row.6,
        message: row.7,
        joined_at: row.8,
        updated_at: row.9,
    }
}

/// Business rules for a join attempt, checked against the locked meetup row.
/// Duplicate joins are left to the (meetup, user) unique index.
pub fn check_join(organizer_id: i64, user_id: i64, attendance: Attendance) -> Result<(), AppError> {
    if organizer_id == user_id {
        return Err(AppError::Validation(
            "You are the organizer of this meetup".to_string(),
        ));
    }

    if attendance.is_full {
        return Err(AppError::Validation("This meetup is full".to_string()));
    }

    Ok(())
}

fn validate_text(value: &str, field: &str, required: bool) -> Result<(), AppError> {
    if required && value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > TEXT_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, TEXT_MAX_CHARS
        )));
    }
    Ok(())
}

fn validate_capacity(max_participants: i32) -> Result<(), AppError> {
    if max_participants < 1 {
        return Err(AppError::Validation(
            "Max participants must be at least 1".to_string(),
        ));
    }
    Ok(())
}

async fn fetch_meetup(db: &DbPool, meetup_id: i64) -> Result<Meetup, AppError> {
    let query = format!("{} WHERE mt.id = $1", MEETUP_SELECT);

    sqlx::query_as::<_, MeetupRow>(&query)
        .bind(meetup_id)
        .fetch_optional(db)
        .await?
        .map(row_to_meetup)
        .ok_or_else(|| AppError::not_found("Meetup"))
}

/// Returns the organizer of the meetup, or not-found.
pub(crate) async fn meetup_organizer(db: &DbPool, meetup_id: i64) -> Result<i64, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT organizer_id FROM meetups WHERE id = $1")
        .bind(meetup_id)
        .fetch_optional(db)
        .await?;

    row.map(|(organizer_id,)| organizer_id)
        .ok_or_else(|| AppError::not_found("Meetup"))
}

async fn ensure_organizer(db: &DbPool, meetup_id: i64, user_id: i64) -> Result<(), AppError> {
    if meetup_organizer(db, meetup_id).await? != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn fetch_participants(
    db: &DbPool,
    meetup_id: Option<i64>,
    user_id: Option<i64>,
) -> Result<Vec<MeetupParticipant>, AppError> {
    let mut conditions = Vec::new();
    let mut param_idx = 1;

    if meetup_id.is_some() {
        conditions.push(format!("p.meetup_id = ${}", param_idx));
        param_idx += 1;
    }
    if user_id.is_some() {
        conditions.push(format!("p.user_id = ${}", param_idx));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!("{} {} ORDER BY p.joined_at ASC, p.id ASC", PARTICIPANT_SELECT, where_clause);
    let mut builder = sqlx::query_as::<_, ParticipantRow>(&query);

    if let Some(meetup_id) = meetup_id {
        builder = builder.bind(meetup_id);
    }
    if let Some(user_id) = user_id {
        builder = builder.bind(user_id);
    }

    let rows = builder.fetch_all(db).await?;
    Ok(rows.into_iter().map(row_to_participant).collect())
}

/// GET /api/v1/meetups
pub async fn list_meetups(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    AppQuery(params): AppQuery<MeetupListParams>,
) -> Result<Json<Vec<Meetup>>, AppError> {
    let organizer_id = if params.my_meetups == Some(true) {
        let Some(Extension(user)) = caller else {
            return Err(AppError::Unauthorized);
        };
        Some(user.id)
    } else {
        None
    };

    let mut conditions = Vec::new();
    let mut param_idx = 1;

    if params.status.is_some() {
        conditions.push(format!("mt.status = ${}", param_idx));
        param_idx += 1;
    }
    if params.movie.is_some() {
        conditions.push(format!("mt.movie_id = ${}", param_idx));
        param_idx += 1;
    }
    if params.upcoming == Some(true) {
        conditions.push("mt.meetup_datetime >= NOW() AND mt.status = 'upcoming'".to_string());
    }
    if organizer_id.is_some() {
        conditions.push(format!("mt.organizer_id = ${}", param_idx));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "{} {} ORDER BY mt.meetup_datetime ASC, mt.id ASC",
        MEETUP_SELECT, where_clause
    );
    let mut builder = sqlx::query_as::<_, MeetupRow>(&query);

    if let Some(status) = params.status {
        builder = builder.bind(status);
    }
    if let Some(movie_id) = params.movie {
        builder = builder.bind(movie_id);
    }
    if let Some(organizer_id) = organizer_id {
        builder = builder.bind(organizer_id);
    }

    let rows = builder.fetch_all(&state.db).await?;
    Ok(Json(rows.into_iter().map(row_to_meetup).collect()))
}

/// POST /api/v1/meetups
pub async fn create_meetup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(req): AppJson<CreateMeetupRequest>,
) -> Result<(StatusCode, Json<Meetup>), AppError> {
    validate_text(&req.title, "Title", true)?;
    validate_text(&req.location, "Location", true)?;
    validate_text(&req.theater_name, "Theater name", false)?;

    let max_participants = req.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
    validate_capacity(max_participants)?;

    if req.movie <= 0 {
        return Err(AppError::Validation("A valid movie is required".to_string()));
    }

    let movie_id = resolve_movie(
        &state.db,
        state.tmdb.as_ref(),
        req.movie,
        req.movie_title.as_deref(),
    )
    .await?;

    let (meetup_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO meetups (title, description, movie_id, organizer_id, location,
                             theater_name, meetup_datetime, max_participants)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(movie_id)
    .bind(user.id)
    .bind(req.location.trim())
    .bind(req.theater_name.trim())
    .bind(req.meetup_datetime)
    .bind(max_participants)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        "User {} created meetup {} for movie {}",
        user.id,
        meetup_id,
        movie_id
    );

    Ok((StatusCode::CREATED, Json(fetch_meetup(&state.db, meetup_id).await?)))
}

/// GET /api/v1/meetups/:id
pub async fn get_meetup(
    State(state): State<AppState>,
    Path(meetup_id): Path<i64>,
) -> Result<Json<MeetupDetail>, AppError> {
    let meetup = fetch_meetup(&state.db, meetup_id).await?;
    let participants = fetch_participants(&state.db, Some(meetup_id), None).await?;
    let comments = fetch_comments(&state.db, meetup_id).await?;

    Ok(Json(MeetupDetail {
        meetup,
        participants,
        comments,
    }))
}

/// PATCH /api/v1/meetups/:id
///
/// Organizer only. Status transitions are plain field edits.
pub async fn update_meetup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(meetup_id): Path<i64>,
    AppJson(req): AppJson<UpdateMeetupRequest>,
) -> Result<Json<Meetup>, AppError> {
    if let Some(ref title) = req.title {
        validate_text(title, "Title", true)?;
    }
    if let Some(ref location) = req.location {
        validate_text(location, "Location", true)?;
    }
    if let Some(ref theater_name) = req.theater_name {
        validate_text(theater_name, "Theater name", false)?;
    }
    if let Some(max_participants) = req.max_participants {
        validate_capacity(max_participants)?;
    }

    ensure_organizer(&state.db, meetup_id, user.id).await?;

    sqlx::query(
        r#"
        UPDATE meetups
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            location = COALESCE($3, location),
            theater_name = COALESCE($4, theater_name),
            meetup_datetime = COALESCE($5, meetup_datetime),
            max_participants = COALESCE($6, max_participants),
            status = COALESCE($7, status),
            updated_at = NOW()
        WHERE id = $8
        "#,
    )
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(req.location.as_deref().map(str::trim))
    .bind(req.theater_name.as_deref().map(str::trim))
    .bind(req.meetup_datetime)
    .bind(req.max_participants)
    .bind(req.status)
    .bind(meetup_id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_meetup(&state.db, meetup_id).await?))
}

/// DELETE /api/v1/meetups/:id
pub async fn delete_meetup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(meetup_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ensure_organizer(&state.db, meetup_id, user.id).await?;

    sqlx::query("DELETE FROM meetups WHERE id = $1")
        .bind(meetup_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/meetups/:id/join
pub async fn join_meetup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(meetup_id): Path<i64>,
    body: Option<Json<JoinMeetupRequest>>,
) -> Result<(StatusCode, Json<MeetupParticipant>), AppError> {
    let message = body.map(|Json(req)| req.message).unwrap_or_default();

    let mut tx = state.db.begin().await?;

    // Row lock serializes concurrent joins on the same meetup
    let meetup: Option<(i64, i32)> = sqlx::query_as(
        "SELECT organizer_id, max_participants FROM meetups WHERE id = $1 FOR UPDATE",
    )
    .bind(meetup_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (organizer_id, max_participants) = meetup.ok_or_else(|| AppError::not_found("Meetup"))?;

    let (accepted,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM meetup_participants WHERE meetup_id = $1 AND status = 'accepted'",
    )
    .bind(meetup_id)
    .fetch_one(&mut *tx)
    .await?;

    check_join(
        organizer_id,
        user.id,
        Attendance::new(accepted, max_participants),
    )?;

    let (participant_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO meetup_participants (meetup_id, user_id, status, message)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(meetup_id)
    .bind(user.id)
    .bind(ParticipantStatus::Accepted)
    .bind(&message)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::on_unique_violation(e, "You have already joined this meetup"))?;

    tx.commit().await?;

    let query = format!("{} WHERE p.id = $1", PARTICIPANT_SELECT);
    let row: ParticipantRow = sqlx::query_as(&query)
        .bind(participant_id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(row_to_participant(row))))
}

/// POST /api/v1/meetups/:id/leave
pub async fn leave_meetup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(meetup_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM meetup_participants WHERE meetup_id = $1 AND user_id = $2")
        .bind(meetup_id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "You are not a participant of this meetup".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/meetups/:id/participants
pub async fn list_participants(
    State(state): State<AppState>,
    Path(meetup_id): Path<i64>,
) -> Result<Json<Vec<MeetupParticipant>>, AppError> {
    meetup_organizer(&state.db, meetup_id).await?;
    Ok(Json(fetch_participants(&state.db, Some(meetup_id), None).await?))
}

/// GET /api/v1/participants?meetup=&user=
pub async fn search_participants(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ParticipantListParams>,
) -> Result<Json<Vec<MeetupParticipant>>, AppError> {
    Ok(Json(
        fetch_participants(&state.db, params.meetup, params.user).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizer_cannot_join_own_meetup() {
        let err = check_join(1, 1, Attendance::new(0, 10)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("organizer")));
    }

    #[test]
    fn full_meetup_rejects_newcomers() {
        // Capacity 2: organizer plus one accepted participant fills it
        let err = check_join(1, 3, Attendance::new(1, 2)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "This meetup is full"));
    }

    #[test]
    fn open_meetup_admits() {
        assert!(check_join(1, 2, Attendance::new(0, 2)).is_ok());
    }

    #[test]
    fn organizer_check_precedes_capacity_check() {
        let err = check_join(1, 1, Attendance::new(5, 2)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("organizer")));
    }

    #[test]
    fn capacity_and_text_limits() {
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(1).is_ok());
        assert!(validate_text("", "Title", true).is_err());
        assert!(validate_text("", "Theater name", false).is_ok());
        assert!(validate_text(&"a".repeat(201), "Location", true).is_err());
    }
}
