use axum::{
    extract::{multipart::MultipartError, Extension, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::dtos::product::{ProductAnalyticsResponse, UploadResponse};
use crate::error::AppError;
use crate::ingest::spreadsheet::{parse_workbook, RowSchema};
use crate::middleware::auth::AuthContext;
use crate::state::AppState;
use crate::store;

const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        AppError::validation(format!("Invalid upload: {}", e.body_text()))
    }
}

pub fn is_spreadsheet_name(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

// GET /upload/template - expected column layout for the current window
pub async fn get_upload_template(State(state): State<AppState>) -> Json<serde_json::Value> {
    let horizon_days = state.engine.config().horizon_days;
    let columns = RowSchema::new(horizon_days).header();
    Json(serde_json::json!({ "horizon_days": horizon_days, "columns": columns }))
}

// POST /upload - parse a workbook and replace the user's products with it
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn upload_workbook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes));
    }

    let (file_name, bytes) = upload.ok_or_else(|| AppError::validation("No file provided"))?;
    if !is_spreadsheet_name(&file_name) {
        return Err(AppError::validation("Please select an Excel file (.xlsx or .xls)"));
    }

    let schema = RowSchema::new(state.engine.config().horizon_days);
    let parsed = parse_workbook(&bytes, &schema).map_err(|e| {
        warn!(%file_name, error = %e, "Rejected upload");
        AppError::from(e)
    })?;

    let stored = store::product::replace_for_user(&state.db_pool, auth.user_id, parsed).await?;
    info!(%file_name, size = bytes.len(), products = stored.len(), "Upload processed");

    Ok(Json(UploadResponse {
        success: true,
        message: format!("Successfully processed {} products", stored.len()),
        data: stored
            .into_iter()
            .map(|p| ProductAnalyticsResponse::build(p, &state.engine))
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_excel_extensions_only() {
        assert!(is_spreadsheet_name("inventory.xlsx"));
        assert!(is_spreadsheet_name("OLD.XLS"));
        assert!(!is_spreadsheet_name("inventory.csv"));
        assert!(!is_spreadsheet_name(""));
    }
}
