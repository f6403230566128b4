use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Days, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use pharmathon_api::auth::AdminGate;
use pharmathon_api::config::Config;
use pharmathon_api::mailer::Mailer;
use pharmathon_api::{AppState, AppStateInner, router};
use pharmathon_db::Database;

const ADMIN_TOKEN: &str = "test-admin-token";

fn test_config() -> Config {
    Config {
        port: 0,
        sqlite_path: ":memory:".into(),
        allowed_origins: vec![],
        allowed_origin_regex: None,
        admin_token: ADMIN_TOKEN.into(),
        admin_username: None,
        admin_password_hash: None,
        // Far in the future: reminder runs are "skipped" unless a test
        // overrides the date.
        event_date: chrono::NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        timezone: chrono_tz::Africa::Tunis,
        reminder_hour: 9,
        brevo_api_key: None,
        smtp_from: "FPHM <noreply@fphm.tn>".into(),
        frontend_base_url: None,
        public_base_url: None,
    }
}

fn test_state(config: Config) -> AppState {
    let db = Database::open_in_memory().expect("in-memory db");
    let gate = AdminGate::from_config(&config);
    let mailer = Mailer::new(None, &config.smtp_from);
    Arc::new(AppStateInner {
        db,
        config,
        mailer,
        gate,
    })
}

fn app() -> (AppState, Router) {
    let state = test_state(test_config());
    (state.clone(), router(state))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = resp.into_body().collect().await.expect("body").to_bytes();
    (status, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    let value = serde_json::from_slice(&body).expect("json body");
    (status, value)
}

fn valid_registration() -> Value {
    json!({
        "fullName": "Jo Dupont",
        "dob": "1998-05-02",
        "sex": "Homme",
        "phone": "+21620000000",
        "email": "jo@x.com",
        "affiliation": "Personnel",
        "eventChoice": "Pharmathon (8 km)"
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-admin-token", ADMIN_TOKEN)
        .body(Body::empty())
        .expect("request")
}

fn admin_post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-admin-token", ADMIN_TOKEN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_reports_ok() {
    let (_state, app) = app();
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["now"].is_string());
}

#[tokio::test]
async fn register_creates_a_pending_row() {
    let (state, app) = app();

    let (status, body) = send_json(&app, post_json("/api/register", &valid_registration())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let id = body["registration"]["id"].as_i64().unwrap();

    let row = state.db.get_registration(id).unwrap().unwrap();
    assert!(!row.confirmed);
    assert_eq!(row.confirm_token.len(), 10);
    assert_eq!(row.checkin_code.len(), 10);
    assert_ne!(row.confirm_token, row.checkin_code);
    assert!(row.checkin_at.is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts_with_one_message() {
    let (_state, app) = app();

    let (status, _) = send_json(&app, post_json("/api/register", &valid_registration())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, post_json("/api/register", &valid_registration())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["ok"], false);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "Cette adresse e-mail est déjà inscrite pour cette épreuve."
    );
}

#[tokio::test]
async fn invalid_registration_accumulates_errors() {
    let (_state, app) = app();
    let (status, body) = send_json(&app, post_json("/api/register", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["errors"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn confirm_flow_is_idempotent() {
    let (state, app) = app();
    send_json(&app, post_json("/api/register", &valid_registration())).await;
    let token = state.db.list_registrations().unwrap()[0].confirm_token.clone();

    // Missing and unknown tokens answer plain text.
    let req = Request::builder()
        .uri("/api/confirm")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"Token manquant.");

    let req = Request::builder()
        .uri("/api/confirm?token=DOESNOTEXIST")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"Token invalide.");

    for _ in 0..2 {
        let req = Request::builder()
            .uri(format!("/api/confirm?token={token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Adresse e-mail confirmée. Merci !".as_bytes());
    }

    assert!(state.db.list_registrations().unwrap()[0].confirmed);
}

#[tokio::test]
async fn checkin_requires_admin_and_accepts_repeats() {
    let (state, app) = app();
    send_json(&app, post_json("/api/register", &valid_registration())).await;
    let code = state.db.list_registrations().unwrap()[0].checkin_code.clone();

    // No token: rejected before any data access.
    let (status, body) =
        send_json(&app, post_json("/api/admin/checkin", &json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Non autorisé.");

    let (status, body) =
        send_json(&app, admin_post_json("/api/admin/checkin", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Code requis.");

    let (status, body) = send_json(
        &app,
        admin_post_json("/api/admin/checkin", &json!({ "code": "NOPE" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Code introuvable.");

    for _ in 0..2 {
        let (status, body) = send_json(
            &app,
            admin_post_json("/api/admin/checkin", &json!({ "code": code })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["name"], "Jo Dupont");
        assert!(body["registration"]["checkinAt"].is_string());
    }
}

#[tokio::test]
async fn listing_requires_admin_and_is_newest_first() {
    let (_state, app) = app();
    send_json(&app, post_json("/api/register", &valid_registration())).await;
    let mut second = valid_registration();
    second["email"] = json!("zoe@x.com");
    second["fullName"] = json!("Zoé Martin");
    send_json(&app, post_json("/api/register", &second)).await;

    let req = Request::builder()
        .uri("/api/registrations")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&app, admin_get("/api/registrations")).await;
    assert_eq!(status, StatusCode::OK);
    let regs = body["registrations"].as_array().unwrap();
    assert_eq!(regs.len(), 2);
    assert_eq!(regs[0]["fullName"], "Zoé Martin");
    assert_eq!(regs[1]["fullName"], "Jo Dupont");

    let (status, body) = send_json(&app, admin_get("/api/participants")).await;
    assert_eq!(status, StatusCode::OK);
    let parts = body["registrations"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["checkedIn"], false);
    assert!(parts[0]["qrCode"].is_string());
}

#[tokio::test]
async fn csv_export_accepts_header_or_query_token() {
    let (_state, app) = app();
    send_json(&app, post_json("/api/register", &valid_registration())).await;

    let req = Request::builder()
        .uri("/api/export/csv")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(admin_get("/api/export/csv"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=inscriptions.csv"
    );
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("id,fullName,dob,sex,"));
    assert!(text.contains("jo@x.com"));

    // Query-parameter token for plain download links.
    let req = Request::builder()
        .uri(format!("/api/export/csv?token={ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    // Affiliation filter; "all" is the no-filter sentinel.
    let req = Request::builder()
        .uri(format!(
            "/api/export/csv?token={ADMIN_TOKEN}&affiliation=Enseignant(e)"
        ))
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, req).await;
    let text = String::from_utf8(body).unwrap();
    assert!(!text.contains("jo@x.com"));

    let req = Request::builder()
        .uri(format!("/api/export/csv?token={ADMIN_TOKEN}&affiliation=all"))
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, req).await;
    assert!(String::from_utf8(body).unwrap().contains("jo@x.com"));
}

#[tokio::test]
async fn reminders_skip_far_from_the_event() {
    let (_state, app) = app();
    let (status, body) =
        send_json(&app, admin_post_json("/api/admin/send-reminders", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["skipped"], true);
    assert!(body["result"].get("sent").is_none());
}

#[tokio::test]
async fn reminders_send_once_per_milestone_to_confirmed_only() {
    // Event six local days ahead puts ceil(endOfEventDay - now) at exactly 7
    // for any time of day.
    let mut config = test_config();
    let today = Utc::now().with_timezone(&config.timezone).date_naive();
    config.event_date = today.checked_add_days(Days::new(6)).unwrap();
    let state = test_state(config);
    let app = router(state.clone());

    send_json(&app, post_json("/api/register", &valid_registration())).await;
    let mut second = valid_registration();
    second["email"] = json!("zoe@x.com");
    send_json(&app, post_json("/api/register", &second)).await;
    let mut third = valid_registration();
    third["email"] = json!("sam@x.com");
    send_json(&app, post_json("/api/register", &third)).await;

    // Confirm two of the three; the unconfirmed one must never be reminded.
    let rows = state.db.list_registrations().unwrap();
    state.db.mark_confirmed(rows[0].id).unwrap();
    state.db.mark_confirmed(rows[1].id).unwrap();

    let (status, body) =
        send_json(&app, admin_post_json("/api/admin/send-reminders", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["skipped"], false);
    assert_eq!(body["result"]["daysLeft"], 7);
    assert_eq!(body["result"]["sent"], 2);

    // Identical re-run: every flag already claimed.
    let (_, body) =
        send_json(&app, admin_post_json("/api/admin/send-reminders", &json!({}))).await;
    assert_eq!(body["result"]["sent"], 0);

    let rows = state.db.list_registrations().unwrap();
    let reminded = rows.iter().filter(|r| r.reminded7).count();
    assert_eq!(reminded, 2);
}

#[tokio::test]
async fn login_exchanges_credentials_for_the_gate_token() {
    use argon2::password_hash::{SaltString, rand_core::OsRng};
    use argon2::{Argon2, PasswordHasher};

    let mut config = test_config();
    config.admin_username = Some("admin".into());
    let salt = SaltString::generate(&mut OsRng);
    config.admin_password_hash = Some(
        Argon2::default()
            .hash_password(b"hunter2", &salt)
            .unwrap()
            .to_string(),
    );
    let state = test_state(config);
    let app = router(state);

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/admin/login",
            &json!({ "username": "admin", "password": "hunter2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], ADMIN_TOKEN);

    let (status, _) = send_json(
        &app,
        post_json(
            "/api/admin/login",
            &json!({ "username": "admin", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
