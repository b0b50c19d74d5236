use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    middleware,
    Router,
};
use crate::handlers::upload::{get_upload_template, upload_workbook};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/upload", post(upload_workbook))
        .layer(DefaultBodyLimit::max(limit))
        .route("/upload/template", get(get_upload_template))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
