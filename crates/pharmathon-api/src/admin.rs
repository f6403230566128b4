use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use pharmathon_db::models::RegistrationRow;
use pharmathon_types::api::{
    LoginRequest, LoginResponse, ParticipantView, ParticipantsResponse, RegistrationsResponse,
    SendRemindersResponse,
};

use crate::auth::AdminCredential;
use crate::error::ApiError;
use crate::middleware::ADMIN_TOKEN_HEADER;
use crate::{AppState, blocking, registration_view, reminders};

/// Full listing, newest registrations first.
pub async fn list_registrations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_registrations()).await?;
    Ok(Json(RegistrationsResponse {
        ok: true,
        registrations: rows.into_iter().map(registration_view).collect(),
    }))
}

/// Compact projection for the scanner UI.
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_registrations()).await?;
    Ok(Json(ParticipantsResponse {
        ok: true,
        registrations: rows
            .into_iter()
            .map(|r| ParticipantView {
                id: r.id,
                full_name: r.full_name,
                email: r.email,
                event_choice: r.event_choice,
                checked_in: r.checkin_at.is_some(),
                qr_code: r.checkin_code,
            })
            .collect(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportQuery {
    pub token: Option<String>,
    pub affiliation: Option<String>,
}

const CSV_HEADER: [&str; 18] = [
    "id",
    "fullName",
    "dob",
    "sex",
    "phone",
    "email",
    "affiliation",
    "studentOrigin",
    "studentOriginOther",
    "eventChoice",
    "confirmed",
    "confirmToken",
    "checkinCode",
    "checkinAt",
    "reminded7",
    "reminded3",
    "reminded1",
    "createdAt",
];

/// CSV download. The admin token may arrive in the usual header or as a
/// `?token=` query parameter so plain download links work.
pub async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(query.token.as_deref());
    match token {
        Some(t) if state.gate.authorizes(t) => {}
        _ => return Err(ApiError::Unauthorized),
    }

    // "all" (or blank) is the no-filter sentinel.
    let filter = query
        .affiliation
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty() && *a != "all")
        .map(String::from);

    let db = state.clone();
    let rows = blocking(move || db.db.list_by_affiliation(filter.as_deref())).await?;
    let body = build_csv(&rows).map_err(ApiError::Internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=inscriptions.csv",
            ),
        ],
        body,
    )
        .into_response())
}

fn build_csv(rows: &[RegistrationRow]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for r in rows {
        writer.write_record(&[
            r.id.to_string(),
            r.full_name.clone(),
            r.dob.clone(),
            r.sex.clone(),
            r.phone.clone(),
            r.email.clone(),
            r.affiliation.clone(),
            r.student_origin.clone().unwrap_or_default(),
            r.student_origin_other.clone().unwrap_or_default(),
            r.event_choice.clone(),
            r.confirmed.to_string(),
            r.confirm_token.clone(),
            r.checkin_code.clone(),
            r.checkin_at.clone().unwrap_or_default(),
            r.reminded7.to_string(),
            r.reminded3.to_string(),
            r.reminded1.to_string(),
            r.created_at.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV flush failed: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Manual reminder trigger — same logic as the daily timer, on demand.
pub async fn send_reminders(State(state): State<AppState>) -> Response {
    match reminders::process_reminders(&state).await {
        Ok(result) => Json(SendRemindersResponse { ok: true, result }).into_response(),
        Err(e) => {
            error!("Reminder trigger failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "Erreur envoi rappels." })),
            )
                .into_response()
        }
    }
}

/// Credential exchange: a valid username/password pair yields the same
/// shared token the header gate checks.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .gate
        .verify(&AdminCredential::Password {
            username: &req.username,
            password: &req.password,
        })
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(LoginResponse { ok: true, token }))
}
