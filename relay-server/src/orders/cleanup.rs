//! Cleanup scheduler
//!
//! Reclaims storage by deleting orders that are `DONE` and were completed
//! before the start of the current calendar day, once per day at the
//! configured clear hour. Runs at a fixed poll interval and fires only on
//! an exact hour:minute match, so a process that is down across the trigger
//! minute simply skips that day's pass — the next successful pass picks the
//! stragglers up.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;

use crate::store::{OrderStore, StoreResult};
use crate::utils::time::day_start;

/// Poll interval between trigger checks
const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Deletes previous-day completed orders at the configured clear hour
///
/// The last-cleared date lives in this instance, not in any ambient global:
/// it starts unset, is updated after each executed pass, and dies with the
/// process. It only guards against same-day re-execution — orders whose
/// deletion failed are retried by a future day's pass.
pub struct CleanupScheduler {
    store: Arc<dyn OrderStore>,
    clear_hour: u32,
    tz: Tz,
    shutdown: CancellationToken,
    last_cleared: Option<NaiveDate>,
}

impl CleanupScheduler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        clear_hour: u32,
        tz: Tz,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            clear_hour,
            tz,
            shutdown,
            last_cleared: None,
        }
    }

    /// Main loop: poll the wall clock until shutdown
    pub async fn run(mut self) {
        tracing::info!(
            clear_hour = self.clear_hour,
            tz = %self.tz,
            "cleanup scheduler started"
        );
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("cleanup scheduler received shutdown signal");
                    return;
                }
                _ = interval.tick() => {
                    let now = Utc::now().with_timezone(&self.tz);
                    self.run_if_due(now).await;
                }
            }
        }
    }

    /// Execute the cleanup pass if the trigger window matches
    ///
    /// Returns whether a pass was executed. Fires on an exact minute match
    /// against `clear_hour:00`, at most once per calendar date.
    pub async fn run_if_due(&mut self, now: DateTime<Tz>) -> bool {
        if now.hour() != self.clear_hour || now.minute() != 0 {
            return false;
        }
        let today = now.date_naive();
        if self.last_cleared == Some(today) {
            return false;
        }

        match self.sweep(today).await {
            Ok(deleted) => {
                tracing::info!(date = %today, deleted, "cleanup pass executed");
                self.last_cleared = Some(today);
                true
            }
            Err(e) => {
                // The pass never ran; leave the guard unset so a later tick
                // inside the same trigger minute can retry.
                tracing::warn!(date = %today, "cleanup pass failed: {}", e);
                false
            }
        }
    }

    /// Delete every `DONE` order completed before the start of `today`
    ///
    /// Deletions fire concurrently. Per-item failures are absorbed: the
    /// affected orders simply survive until a future day's pass.
    async fn sweep(&self, today: NaiveDate) -> StoreResult<usize> {
        self.store.ensure_identity().await?;

        let done = self
            .store
            .query_where("status", serde_json::json!("DONE"))
            .await?;

        let start_of_today: DateTime<Utc> = day_start(today, self.tz);
        let stale: Vec<_> = done
            .into_iter()
            .filter(|o| o.done_at.is_some_and(|d| d < start_of_today))
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let results =
            futures::future::join_all(stale.iter().map(|o| self.store.delete(&o.id))).await;

        let mut deleted = 0;
        for (order, result) in stale.iter().zip(results) {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(order_id = %order.id, "failed to delete stale order: {}", e);
                }
            }
        }
        Ok(deleted)
    }
}
