use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::error;

use pharmathon_db::InsertError;
use pharmathon_types::api::{RegisterRequest, RegisterResponse, RegistrationId};
use pharmathon_types::models::NewRegistration;

use crate::error::ApiError;
use crate::{AppState, blocking, qr, token, validate};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = validate::parse_registration(&req).map_err(ApiError::Validation)?;

    let confirm_token = token::generate_code();
    let checkin_code = token::generate_code();

    let db = state.clone();
    let to_insert = new.clone();
    let (tok, code) = (confirm_token.clone(), checkin_code.clone());
    let id = tokio::task::spawn_blocking(move || {
        db.db.insert_registration(&to_insert, &tok, &code)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })?
    .map_err(|e| match e {
        InsertError::Duplicate => ApiError::Conflict(
            "Cette adresse e-mail est déjà inscrite pour cette épreuve.".to_string(),
        ),
        InsertError::Other(e) => ApiError::Internal(e),
    })?;

    // Fire-and-forget: a failed confirmation email never fails or rolls back
    // the registration.
    let mail_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = send_confirmation(&mail_state, &new, &confirm_token, &checkin_code).await {
            error!("Email error: {e:#}");
        }
    });

    Ok(Json(RegisterResponse {
        ok: true,
        registration: RegistrationId { id },
    }))
}

async fn send_confirmation(
    state: &AppState,
    new: &NewRegistration,
    confirm_token: &str,
    checkin_code: &str,
) -> anyhow::Result<()> {
    let qr_png = qr::render_png(checkin_code)?;
    let confirm_url = state
        .config
        .public_base_url
        .as_deref()
        .map(|base| format!("{base}/api/confirm?token={confirm_token}"));

    state
        .mailer
        .send_confirmation(
            &new.email,
            &new.full_name,
            new.event_choice.as_str(),
            &state.config.event_date_label(),
            confirm_url.as_deref(),
            qr_png,
        )
        .await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmQuery {
    pub token: Option<String>,
}

/// Confirmation-link target. Plain text answers on purpose: the link lands
/// in a mail client, not in the SPA.
pub async fn confirm(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Response, ApiError> {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return Ok((StatusCode::BAD_REQUEST, "Token manquant.").into_response());
    };

    let db = state.clone();
    let lookup = token.clone();
    let Some(reg) = blocking(move || db.db.find_by_confirm_token(&lookup)).await? else {
        return Ok((StatusCode::NOT_FOUND, "Token invalide.").into_response());
    };

    // Idempotent: re-confirming just leaves the flag set.
    let db = state.clone();
    blocking(move || db.db.mark_confirmed(reg.id)).await?;

    if let Some(front) = &state.config.frontend_base_url {
        return Ok(Redirect::to(&format!("{front}/confirm?status=ok")).into_response());
    }
    Ok("Adresse e-mail confirmée. Merci !".into_response())
}
