use axum::{
    routing::get,
    middleware,
    Router,
};
use crate::handlers::product::{
    get_products, get_product, export_product, replace_products, clear_products
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/products", get(get_products).put(replace_products).delete(clear_products))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/export", get(export_product))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
