use axum::{extract::State, http::StatusCode, Extension, Json};
use moviemeet_shared::api::{
    AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
    UpdateProfileRequest,
};
use moviemeet_shared::User;

use crate::auth::{
    create_access_token, create_refresh_token, hash_password, validate_password_strength,
    verify_password, verify_token, AuthUser, TokenKind,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::AppState;

use super::users::fetch_user;

const LOCATION_MAX_CHARS: usize = 100;

fn validate_email(email: &str) -> Result<(), AppError> {
    if !email.is_empty() && !email.contains('@') {
        return Err(AppError::Validation(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Checks registration input before anything touches the database.
pub fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if req.password != req.password2 {
        return Err(AppError::Validation(
            "Password fields didn't match".to_string(),
        ));
    }

    validate_password_strength(&req.password, req.username.trim())?;
    validate_email(req.email.trim())
}

/// Issues an access/refresh pair and records the refresh token so it can be revoked.
async fn issue_session(
    state: &AppState,
    user_id: i64,
    username: &str,
) -> Result<(String, String), AppError> {
    let access = create_access_token(
        user_id,
        username,
        &state.config.jwt_secret,
        state.config.jwt_expires_in,
    )?;

    let refresh = create_refresh_token(
        user_id,
        username,
        &state.config.jwt_secret,
        state.config.refresh_token_expires_in,
    )?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(refresh.jti)
    .bind(user_id)
    .bind(refresh.expires_at)
    .execute(&state.db)
    .await?;

    Ok((access.token, refresh.token))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&req)?;

    let username = req.username.trim();
    let password_hash = hash_password(&req.password)?;

    // User and profile are created together or not at all
    let mut tx = state.db.begin().await?;

    let (user_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash, first_name, last_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(req.email.trim())
    .bind(&password_hash)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::on_unique_violation(e, "A user with that username already exists"))?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Registered user {} ({})", username, user_id);

    let user = fetch_user(&state.db, user_id).await?;
    let (access_token, refresh_token) = issue_session(&state, user_id, &user.username).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            access_token,
            refresh_token,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let row: Option<(i64, String, String)> = sqlx::query_as(
        "SELECT id, username, password_hash FROM users WHERE username = $1",
    )
    .bind(req.username.trim())
    .fetch_optional(&state.db)
    .await?;

    let (user_id, username, password_hash) = row.ok_or(AppError::Unauthorized)?;

    if !verify_password(&req.password, &password_hash)? {
        return Err(AppError::Unauthorized);
    }

    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    let (access_token, refresh_token) = issue_session(&state, user_id, &username).await?;
    let user = fetch_user(&state.db, user_id).await?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = verify_token(&req.refresh_token, &state.config.jwt_secret, TokenKind::Refresh)?;

    // Rotate: the presented token is revoked in the same statement that checks it
    let revoked: Option<(uuid::Uuid,)> = sqlx::query_as(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = NOW()
        WHERE id = $1
          AND user_id = $2
          AND revoked_at IS NULL
          AND expires_at > NOW()
        RETURNING id
        "#,
    )
    .bind(claims.jti)
    .bind(claims.sub)
    .fetch_optional(&state.db)
    .await?;

    if revoked.is_none() {
        return Err(AppError::Unauthorized);
    }

    let user = fetch_user(&state.db, claims.sub).await?;
    let (access_token, refresh_token) = issue_session(&state, user.id, &user.username).await?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revokes the given refresh token, or every live one of the caller.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<LogoutRequest>>,
) -> Result<StatusCode, AppError> {
    let token = body.and_then(|Json(req)| req.refresh_token);

    match token {
        Some(token) => {
            let claims = verify_token(&token, &state.config.jwt_secret, TokenKind::Refresh)
                .map_err(|_| AppError::Validation("Invalid refresh token".to_string()))?;

            if claims.sub != user.id {
                return Err(AppError::Forbidden);
            }

            sqlx::query(
                "UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
            )
            .bind(claims.jti)
            .execute(&state.db)
            .await?;
        }
        None => {
            sqlx::query(
                "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
            )
            .bind(user.id)
            .execute(&state.db)
            .await?;
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    Ok(Json(fetch_user(&state.db, user.id).await?))
}

/// PATCH /api/v1/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    if let Some(ref email) = req.email {
        validate_email(email.trim())?;
    }

    if let Some(ref location) = req.location {
        if location.chars().count() > LOCATION_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "Location must be at most {} characters",
                LOCATION_MAX_CHARS
            )));
        }
    }

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            email = COALESCE($3, email)
        WHERE id = $4
        "#,
    )
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(req.email.as_deref().map(str::trim))
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    let (birth_date_given, birth_date) = match req.birth_date {
        Some(value) => (true, value),
        None => (false, None),
    };

    let result = sqlx::query(
        r#"
        UPDATE profiles
        SET bio = COALESCE($1, bio),
            location = COALESCE($2, location),
            birth_date = CASE WHEN $3 THEN $4 ELSE birth_date END,
            profile_picture = COALESCE($5, profile_picture),
            updated_at = NOW()
        WHERE user_id = $6
        "#,
    )
    .bind(&req.bio)
    .bind(&req.location)
    .bind(birth_date_given)
    .bind(birth_date)
    .bind(&req.profile_picture)
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User"));
    }

    tx.commit().await?;

    Ok(Json(fetch_user(&state.db, user.id).await?))
}
