use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::routes;
use crate::state::AppState;

/// Full application router, mounted under `/api`.
pub fn build_app(state: AppState) -> Router {
    let api = routes::create_router(state.clone())
        .route("/", get(|| async { "Inventory Analytics API" }))
        .route("/health", get(health_check));

    let mut app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = state.config.cors_origin.as_deref() {
        match HeaderValue::from_str(origin) {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_credentials(true)
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
                );
            }
            Err(e) => warn!(%origin, error = %e, "Ignoring invalid CORS_ORIGIN"),
        }
    }

    app.with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
