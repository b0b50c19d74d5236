// src/handlers/product.rs
use axum::{
    extract::{Extension, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, instrument};

use crate::analytics::export::{export_file_name, series_to_csv};
use crate::dtos::product::{
    DataSource, ProductAnalyticsResponse, ProductListResponse, ReplaceProductsRequest,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::product::{NewProduct, Product};
use crate::sample::sample_products;
use crate::state::AppState;
use crate::store;

/// The user's uploaded products, or the built-in samples when there are none.
async fn products_for(
    state: &AppState,
    user_id: i64,
) -> Result<(Vec<Product>, DataSource), AppError> {
    let products = store::product::list_for_user(&state.db_pool, user_id).await?;
    if products.is_empty() {
        Ok((sample_products(), DataSource::Sample))
    } else {
        Ok((products, DataSource::Uploaded))
    }
}

async fn product_for(state: &AppState, user_id: i64, id: i64) -> Result<Product, AppError> {
    let (products, _) = products_for(state, user_id).await?;
    products
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::not_found("Product not found"))
}

// GET /products - analytics for every product
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProductListResponse>, AppError> {
    match products_for(&state, auth.user_id).await {
        Ok((products, source)) => {
            let products = products
                .into_iter()
                .map(|p| ProductAnalyticsResponse::build(p, &state.engine))
                .collect();
            Ok(Json(ProductListResponse { products, source }))
        }
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e)
        }
    }
}

// GET /products/{id} - analytics for one product
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProductAnalyticsResponse>, AppError> {
    let product = product_for(&state, auth.user_id, id).await?;
    Ok(Json(ProductAnalyticsResponse::build(product, &state.engine)))
}

// GET /products/{id}/export - CSV of the derived series
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn export_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response, AppError> {
    let product = product_for(&state, auth.user_id, id).await?;
    let series = state.engine.compute_series(&product);
    let body = series_to_csv(&series)
        .map_err(|e| AppError::internal(format!("CSV export failed: {e}")))?;

    let file_name = export_file_name(&product.product_name);
    let disposition = format!("attachment; filename=\"{file_name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

// PUT /products - replace the product set from JSON
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id))]
pub async fn replace_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ReplaceProductsRequest>,
) -> Result<Json<ProductListResponse>, AppError> {
    let horizon = state.engine.config().horizon_days;
    let products = payload
        .products
        .into_iter()
        .map(|p| p.validate(horizon))
        .collect::<Result<Vec<NewProduct>, AppError>>()?;

    let stored = store::product::replace_for_user(&state.db_pool, auth.user_id, products).await?;
    let source = if stored.is_empty() { DataSource::Sample } else { DataSource::Uploaded };
    let products = if stored.is_empty() { sample_products() } else { stored };

    Ok(Json(ProductListResponse {
        products: products
            .into_iter()
            .map(|p| ProductAnalyticsResponse::build(p, &state.engine))
            .collect(),
        source,
    }))
}

// DELETE /products - drop uploaded data, back to samples
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn clear_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = store::product::clear_for_user(&state.db_pool, auth.user_id).await?;
    info!(removed, "Cleared uploaded products");
    Ok(Json(serde_json::json!({ "success": true, "removed": removed })))
}
