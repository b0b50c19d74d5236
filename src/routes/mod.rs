pub mod auth;
pub mod products;
pub mod upload;

use axum::Router;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(upload::routes(state))
}
