pub mod admin;
pub mod auth;
pub mod checkin;
pub mod config;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod qr;
pub mod register;
pub mod reminders;
pub mod token;
pub mod validate;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::json;

use pharmathon_db::Database;
use pharmathon_db::models::RegistrationRow;
use pharmathon_types::api::RegistrationView;

use crate::auth::AdminGate;
use crate::config::Config;
use crate::mailer::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
    pub mailer: Mailer,
    pub gate: AdminGate,
}

/// The full API surface. CORS and request tracing are layered on by the
/// binary so tests can drive this router directly.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/api/register", post(register::register))
        .route("/api/confirm", get(register::confirm))
        .route("/api/admin/login", post(admin::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/registrations", get(admin::list_registrations))
        .route("/api/participants", get(admin::list_participants))
        .route("/api/admin/checkin", post(checkin::checkin))
        .route("/api/checkin/{code}", post(checkin::checkin_by_path))
        .route("/api/admin/send-reminders", post(admin::send_reminders))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin))
        .with_state(state.clone());

    // Export sits outside the header middleware: download links carry the
    // token as a query parameter, so the handler does its own gate check.
    let export = Router::new()
        .route("/api/export/csv", get(admin::export_csv))
        .with_state(state);

    Router::new().merge(public).merge(protected).merge(export)
}

async fn health(State(_state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "now": chrono::Utc::now().to_rfc3339() }))
}

/// Run a blocking DB call off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, error::ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking join error: {}", e);
            error::ApiError::Internal(e.into())
        })?
        .map_err(error::ApiError::Internal)
}

/// DB row → API view. Kept here so the DB layer stays independent of the
/// wire types.
pub(crate) fn registration_view(row: RegistrationRow) -> RegistrationView {
    RegistrationView {
        id: row.id,
        full_name: row.full_name,
        dob: row.dob,
        sex: row.sex,
        phone: row.phone,
        email: row.email,
        affiliation: row.affiliation,
        student_origin: row.student_origin,
        student_origin_other: row.student_origin_other,
        event_choice: row.event_choice,
        confirmed: row.confirmed,
        confirm_token: row.confirm_token,
        checkin_code: row.checkin_code,
        checkin_at: row.checkin_at,
        reminded7: row.reminded7,
        reminded3: row.reminded3,
        reminded1: row.reminded1,
        created_at: row.created_at,
    }
}
