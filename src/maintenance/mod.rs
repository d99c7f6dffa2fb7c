use anyhow::{Context, Result};
use tokio::time::{Duration as TokioDuration, sleep};
use tracing::{error, info};

use crate::{services::auth, web::AppState};

const CLEANUP_INTERVAL_MINUTES: u64 = 15;

pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let interval = TokioDuration::from_secs(CLEANUP_INTERVAL_MINUTES * 60);
        loop {
            if let Err(err) = run_cleanup_cycle(&state, auth::now_millis()).await {
                error!(?err, "login attempt cleanup cycle failed");
            }
            sleep(interval).await;
        }
    });
}

/// Removes login attempts that can no longer count towards a lockout.
async fn run_cleanup_cycle(state: &AppState, now_ms: i64) -> Result<u64> {
    let limits = &state.config().login_limits;
    let cutoff = now_ms - limits.lockout.max(limits.window).num_milliseconds();
    let removed = auth::prune_attempts(state.pool_ref(), cutoff)
        .await
        .context("failed to prune stale login attempts")?;

    if removed > 0 {
        info!(removed, "login attempt cleanup completed");
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db::memory_pool};

    #[tokio::test]
    async fn prunes_only_attempts_past_lockout_and_window() {
        let state = AppState::from_parts(memory_pool().await, AppConfig::for_tests(None));
        let now = 1_700_000_000_000;
        let lockout = state.config().login_limits.lockout.num_milliseconds();

        auth::record_failed_attempt(state.pool_ref(), "old", now - lockout - 1)
            .await
            .unwrap();
        auth::record_failed_attempt(state.pool_ref(), "fresh", now - 1)
            .await
            .unwrap();

        assert_eq!(run_cleanup_cycle(&state, now).await.unwrap(), 1);
        let left: Vec<String> = sqlx::query_scalar("SELECT ip FROM login_attempts")
            .fetch_all(state.pool_ref())
            .await
            .unwrap();
        assert_eq!(left, ["fresh"]);
    }
}
