use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::env;

/// All environment-derived settings, read once at startup and injected
/// through the shared state. Handlers and jobs never touch the environment
/// themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sqlite_path: String,
    pub allowed_origins: Vec<String>,
    pub allowed_origin_regex: Option<String>,
    pub admin_token: String,
    pub admin_username: Option<String>,
    pub admin_password_hash: Option<String>,
    pub event_date: NaiveDate,
    pub timezone: Tz,
    pub reminder_hour: u32,
    pub brevo_api_key: Option<String>,
    pub smtp_from: String,
    /// Where the confirmation link redirects after success.
    pub frontend_base_url: Option<String>,
    /// Public URL of this backend, used to build the confirmation link in
    /// the email. Absent = no link in the mail.
    pub public_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .context("PORT must be a number")?;

        let origins_raw = env::var("ALLOWED_ORIGINS")
            .or_else(|_| env::var("ALLOWED_ORIGIN"))
            .unwrap_or_default();
        let allowed_origins = origins_raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let event_date_raw = env::var("EVENT_DATE").unwrap_or_else(|_| "2025-11-16".into());
        let event_date = NaiveDate::parse_from_str(&event_date_raw, "%Y-%m-%d")
            .context("EVENT_DATE must be YYYY-MM-DD")?;

        let tz_raw = env::var("TIMEZONE").unwrap_or_else(|_| "Africa/Tunis".into());
        let timezone: Tz = tz_raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Unknown TIMEZONE {tz_raw}: {e}"))?;

        let reminder_hour: u32 = env::var("REMINDER_HOUR")
            .unwrap_or_else(|_| "9".into())
            .parse()
            .context("REMINDER_HOUR must be a number")?;
        anyhow::ensure!(reminder_hour < 24, "REMINDER_HOUR must be 0-23");

        Ok(Self {
            port,
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "data.sqlite".into()),
            allowed_origins,
            allowed_origin_regex: non_empty(env::var("ALLOWED_ORIGIN_REGEX").ok()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_default(),
            admin_username: non_empty(env::var("ADMIN_USERNAME").ok()),
            admin_password_hash: non_empty(env::var("ADMIN_PASSWORD_HASH").ok()),
            event_date,
            timezone,
            reminder_hour,
            brevo_api_key: non_empty(env::var("BREVO_API_KEY").ok()),
            smtp_from: env::var("SMTP_FROM").unwrap_or_default(),
            frontend_base_url: non_empty(env::var("FRONTEND_BASE_URL").ok()),
            public_base_url: non_empty(env::var("PUBLIC_BASE_URL").ok()),
        })
    }

    /// The event date as shown in emails, e.g. "16/11/2025".
    pub fn event_date_label(&self) -> String {
        self.event_date.format("%d/%m/%Y").to_string()
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
