use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::{cookie::token_from_headers, jwt::verify_token};
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match token_from_headers(req.headers()) {
        Some(t) => t,
        None => return unauthorized("No session token"),
    };

    let claims = match verify_token(&token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            return unauthorized("Invalid session");
        }
    };

    // Signature alone is not enough: the session must still be live
    let session = match state.sessions.get(&claims.sid) {
        Some(s) if s.user_id == claims.sub => s,
        _ => return unauthorized("Invalid session"),
    };

    // Attach context
    req.extensions_mut().insert(AuthContext {
        user_id: session.user_id,
        username: session.username,
    });

    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody {
        error: msg.to_string(),
        code: "unauthorized",
    });
    (StatusCode::UNAUTHORIZED, body).into_response()
}
