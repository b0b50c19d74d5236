use axum::extract::{Extension, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bcrypt::{hash, verify};
use sqlx::Error as SqlxError;
use tracing::{info, instrument, warn};

use crate::auth::cookie::{cleared_session_cookie, session_cookie, token_from_headers};
use crate::auth::jwt::{sign_token, verify_token};
use crate::dtos::auth::{AuthResponse, AuthUser, CredentialsRequest, LogoutResponse, MeResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::user::User;
use crate::state::AppState;

pub const BCRYPT_COST: u32 = 12;
const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

// POST /auth/register
#[instrument(skip_all)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Response, AppError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Username and password required"));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::validation("Username must be at least 3 characters"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password must be at least 6 characters"));
    }

    let password_hash = hash(&payload.password, BCRYPT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, password_hash)
         VALUES ($1, $2)
         RETURNING id, username, password_hash, created_at",
    )
    .bind(&username)
    .bind(&password_hash)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| match e {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict("Username already exists")
        }
        other => other.into(),
    })?;

    info!(user_id = user.id, created_at = %user.created_at, "User registered");
    start_session(&state, &user, StatusCode::CREATED)
}

// POST /auth/login
#[instrument(skip_all)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Response, AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Username and password required"));
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
    )
    .bind(payload.username.trim())
    .fetch_optional(&state.db_pool)
    .await?;

    let Some(user) = user else {
        warn!("Login for unknown user");
        return Err(AppError::unauthorized("Invalid username or password"));
    };

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;
    if !ok {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    info!(user_id = user.id, "Login successful");
    start_session(&state, &user, StatusCode::OK)
}

// POST /auth/logout
pub async fn logout_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = token_from_headers(&headers) {
        if let Ok(claims) = verify_token(&token, &state.config.jwt_secret) {
            if state.sessions.delete(&claims.sid) {
                info!(user_id = claims.sub, "Session closed");
            }
        }
    }

    (
        [(header::SET_COOKIE, cleared_session_cookie())],
        Json(LogoutResponse { success: true }),
    )
        .into_response()
}

// GET /auth/me
pub async fn get_me(Extension(auth): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse {
        user: AuthUser { id: auth.user_id, username: auth.username },
    })
}

fn start_session(state: &AppState, user: &User, status: StatusCode) -> Result<Response, AppError> {
    let ttl = state.sessions.ttl();
    let session_id = state.sessions.create(user.id, &user.username);
    let secret = &state.config.jwt_secret;
    let token = match sign_token(user.id, &user.username, &session_id, ttl, secret) {
        Ok(t) => t,
        Err(e) => {
            state.sessions.delete(&session_id);
            return Err(e);
        }
    };
    let cookie = session_cookie(&token, ttl, state.config.cookie_secure)?;

    let body = AuthResponse {
        success: true,
        user: AuthUser { id: user.id, username: user.username.clone() },
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: ttl.num_seconds(),
    };

    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}
