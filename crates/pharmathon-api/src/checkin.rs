use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use pharmathon_types::api::{CheckinRequest, CheckinResponse};

use crate::error::ApiError;
use crate::{AppState, blocking, registration_view};

/// Event-day check-in: look up by QR code, stamp the time, hand back the
/// participant's name for operator feedback. Scanning the same code twice is
/// fine; the stamp is refreshed, never cleared.
pub async fn checkin(
    State(state): State<AppState>,
    Json(req): Json<CheckinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = req
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Code requis.".to_string()))?;

    let row = record_checkin(&state, code).await?;
    let name = row.full_name.clone();
    Ok(Json(CheckinResponse {
        ok: true,
        registration: registration_view(row),
        name,
    }))
}

/// Legacy path-parameter variant kept for older scanner builds.
pub async fn checkin_by_path(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = record_checkin(&state, code).await?;
    Ok(Json(json!({ "ok": true, "name": row.full_name })))
}

async fn record_checkin(
    state: &AppState,
    code: String,
) -> Result<pharmathon_db::models::RegistrationRow, ApiError> {
    let db = state.clone();
    let lookup = code.clone();
    let Some(reg) = blocking(move || db.db.find_by_checkin_code(&lookup)).await? else {
        return Err(ApiError::NotFound("Code introuvable.".to_string()));
    };

    let db = state.clone();
    let id = reg.id;
    blocking(move || {
        db.db.record_checkin(id)?;
        db.db.get_registration(id)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Code introuvable.".to_string()))
}
