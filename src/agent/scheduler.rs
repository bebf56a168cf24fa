use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use crate::agent::calendar_agent::{BatchReport, CalendarAgent};

/// Longest accepted check interval, one week
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Convert a configured interval in minutes, capped at [`MAX_INTERVAL_MINUTES`]
pub fn interval_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.min(MAX_INTERVAL_MINUTES).saturating_mul(60))
}

/// Run a single calendar pass, logging instead of failing
pub async fn run_once(agent: &mut CalendarAgent) -> Option<BatchReport> {
    match agent.process_calendar_events().await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!("Calendar check failed: {}", e);
            None
        }
    }
}

/// Run a calendar pass now and then every `every`, until Ctrl-C
///
/// A slow pass delays the next tick instead of queueing extra runs.
pub async fn run_every(agent: &mut CalendarAgent, every: Duration) {
    let every = every.max(Duration::from_secs(1));
    tracing::info!("Scheduler started (interval: {:?})", every);

    let mut interval_timer = time::interval(every);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {
                run_once(agent).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested, stopping scheduler");
                break;
            }
        }
    }
}
