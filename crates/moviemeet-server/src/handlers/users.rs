use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use moviemeet_shared::{Profile, PublicUser, User};

use crate::db::DbPool;
use crate::error::AppError;
use crate::routes::AppState;

type UserRow = (
    i64,               // id
    String,            // username
    String,            // email
    String,            // first_name
    String,            // last_name
    DateTime<Utc>,     // date_joined
    String,            // bio
    String,            // location
    Option<NaiveDate>, // birth_date
    String,            // profile_picture
    DateTime<Utc>,     // profile created_at
    DateTime<Utc>,     // profile updated_at
);

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.0,
        username: row.1,
        email: row.2,
        first_name: row.3,
        last_name: row.4,
        date_joined: row.5,
        profile: Profile {
            bio: row.6,
            location: row.7,
            birth_date: row.8,
            profile_picture: row.9,
            created_at: row.10,
            updated_at: row.11,
        },
    }
}

/// Loads a user with its profile.
pub async fn fetch_user(db: &DbPool, user_id: i64) -> Result<User, AppError> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.date_joined,
               p.bio, p.location, p.birth_date, p.profile_picture, p.created_at, p.updated_at
        FROM users u
        JOIN profiles p ON p.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    row.map(row_to_user).ok_or_else(|| AppError::not_found("User"))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(fetch_user(&state.db, user_id).await?.into()))
}
