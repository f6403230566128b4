use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use pharmathon_types::api::ReminderReport;
use pharmathon_types::models::Milestone;

use crate::AppState;

/// Whole days until the end of the event day, both instants taken in the
/// event timezone. Matches `ceil(endOfEventDay − now)`: the morning of the
/// event still counts as 1 day left.
pub fn days_until_event(now_utc: DateTime<Utc>, event_date: NaiveDate, tz: Tz) -> i64 {
    let now = now_utc.with_timezone(&tz);
    let end = local_datetime(tz, event_date, 23, 59, 59);
    let secs = (end - now).num_seconds();
    (secs as f64 / 86_400.0).ceil() as i64
}

/// One reminder run: map days-left to a milestone, then claim-then-send for
/// every confirmed registration. The timer and the manual admin trigger both
/// call exactly this.
pub async fn process_reminders(state: &AppState) -> anyhow::Result<ReminderReport> {
    let days_left = days_until_event(Utc::now(), state.config.event_date, state.config.timezone);

    let Some(milestone) = Milestone::from_days_left(days_left) else {
        return Ok(ReminderReport {
            skipped: true,
            days_left,
            sent: None,
        });
    };

    let db = state.clone();
    let regs = tokio::task::spawn_blocking(move || db.db.list_confirmed()).await??;

    let mut sent = 0u64;
    for reg in regs {
        // Claim the flag before sending: concurrent runs on the same
        // milestone day race on the conditional update and only one wins,
        // so no registration gets a duplicate reminder.
        let db = state.clone();
        let id = reg.id;
        let claimed =
            tokio::task::spawn_blocking(move || db.db.claim_reminder(id, milestone)).await??;
        if !claimed {
            continue;
        }

        if let Err(e) = state
            .mailer
            .send_reminder(
                &reg.email,
                &reg.full_name,
                &reg.event_choice,
                &state.config.event_date_label(),
                days_left,
            )
            .await
        {
            warn!("Reminder email to {} failed: {e:#}", reg.email);
        }
        sent += 1;
    }

    Ok(ReminderReport {
        skipped: false,
        days_left,
        sent: Some(sent),
    })
}

/// Next occurrence of `hour`:00 in the given timezone: today if still ahead,
/// otherwise tomorrow.
pub fn next_run(now_utc: DateTime<Utc>, tz: Tz, hour: u32) -> DateTime<Utc> {
    let now = now_utc.with_timezone(&tz);
    let today = local_datetime(tz, now.date_naive(), hour, 0, 0);
    if today > now {
        return today.with_timezone(&Utc);
    }
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date_naive());
    local_datetime(tz, tomorrow, hour, 0, 0).with_timezone(&Utc)
}

/// Daily reminder timer. Failures of one run are logged and the loop keeps
/// its schedule.
pub async fn run_scheduler(state: AppState) {
    let tz = state.config.timezone;
    let hour = state.config.reminder_hour;
    info!("Reminder scheduler armed for {:02}:00 {}", hour, tz);

    loop {
        let at = next_run(Utc::now(), tz, hour);
        let wait = (at - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match process_reminders(&state).await {
            Ok(r) if !r.skipped => {
                info!("Reminder job J-{}: sent {}", r.days_left, r.sent.unwrap_or(0));
            }
            Ok(r) => debug!("Reminder job skipped (daysLeft={})", r.days_left),
            Err(e) => error!("Reminder job failed: {e:#}"),
        }
    }
}

fn local_datetime(tz: Tz, date: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<Tz> {
    let naive = date
        .and_hms_opt(h, m, s)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    // DST gaps resolve to the earliest valid instant.
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
