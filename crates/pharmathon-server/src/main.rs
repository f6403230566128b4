use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, header};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use pharmathon_api::auth::AdminGate;
use pharmathon_api::config::Config;
use pharmathon_api::mailer::Mailer;
use pharmathon_api::{AppState, AppStateInner, reminders};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmathon=debug,tower_http=debug".into()),
        )
        .init();

    // Config, read once; everything downstream gets it via state.
    let config = Config::from_env()?;
    let cors = cors_layer(&config)?;

    // Init database
    let db = pharmathon_db::Database::open(Path::new(&config.sqlite_path))?;

    // Shared state
    let mailer = Mailer::new(config.brevo_api_key.clone(), &config.smtp_from);
    let gate = AdminGate::from_config(&config);
    let port = config.port;
    let state: AppState = Arc::new(AppStateInner {
        db,
        config,
        mailer,
        gate,
    });

    // Daily reminder timer
    tokio::spawn(reminders::run_scheduler(state.clone()));

    let app = pharmathon_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    info!("Pharmathon backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Browser origins are restricted to the configured allow-list plus an
/// optional regex (Vercel previews). Requests without an Origin header —
/// curl, cron, health checks — are never blocked by CORS.
fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_list = config.allowed_origins.clone();
    let origin_regex = config
        .allowed_origin_regex
        .as_deref()
        .map(Regex::new)
        .transpose()?;

    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        allow_list.iter().any(|o| o == origin)
            || origin_regex.as_ref().is_some_and(|r| r.is_match(origin))
    });

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-token"),
        ]))
}
