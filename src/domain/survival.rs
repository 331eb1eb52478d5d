//! Timed 24h/48h follow-up of approved candidates

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::SurvivalCfg;
use crate::domain::alerts::AlertDispatcher;
use crate::domain::watchlist::Watchlist;
use crate::infrastructure::api_clients::MarketDataSource;
use crate::report::SurvivalReport;
use crate::shared::types::{CandidateEntry, CandidateStatus};

/// An entry whose next checkpoint has come up
#[derive(Debug, Clone, PartialEq)]
pub struct DueCheckpoint {
    pub entry: CandidateEntry,
    pub next_status: CandidateStatus,
    pub hours: u32,
}

/// Entries due for follow-up at `now`. Age is always measured from `found_at` and must
/// strictly exceed the checkpoint.
pub fn due_checkpoints(entries: &[CandidateEntry], now: DateTime<Utc>, cfg: &SurvivalCfg) -> Vec<DueCheckpoint> {
    entries
        .iter()
        .filter_map(|entry| {
            let threshold = match entry.status {
                CandidateStatus::New => cfg.first_checkpoint_secs,
                CandidateStatus::Checked24h => cfg.second_checkpoint_secs,
                CandidateStatus::Checked48h => return None,
            };
            if entry.age_secs(now) <= threshold {
                return None;
            }
            Some(DueCheckpoint {
                entry: entry.clone(),
                next_status: entry.status.next()?,
                hours: (threshold / 3600) as u32,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub due: usize,
    pub alerted: usize,
    pub advanced: usize,
}

pub struct SurvivalWatcher {
    market: Arc<dyn MarketDataSource>,
    watchlist: Arc<Watchlist>,
    alerts: AlertDispatcher,
    cfg: SurvivalCfg,
    destination: String,
}

impl SurvivalWatcher {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        watchlist: Arc<Watchlist>,
        alerts: AlertDispatcher,
        cfg: SurvivalCfg,
        destination: String,
    ) -> Self {
        Self {
            market,
            watchlist,
            alerts,
            cfg,
            destination,
        }
    }

    /// Scan immediately, then once per interval, until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        info!("👁️ Survival watcher started");
        let interval = Duration::from_secs(self.cfg.interval_secs);

        loop {
            self.run_cycle(Utc::now()).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("🛑 Survival watcher stopped");
    }

    /// One follow-up pass. Every due entry advances whether or not it survived; the
    /// watchlist is persisted once at the end.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleSummary {
        info!("⏰ Survival watcher waking up...");
        let due = due_checkpoints(&self.watchlist.list().await, now, &self.cfg);

        if due.is_empty() {
            info!("  - No candidate has reached 24/48h yet");
            return CycleSummary::default();
        }
        info!("  - {} survivor(s) due for follow-up", due.len());

        let mut summary = CycleSummary {
            due: due.len(),
            ..Default::default()
        };
        let mut updates = Vec::with_capacity(due.len());

        for checkpoint in &due {
            if self.check_survivor(checkpoint).await {
                summary.alerted += 1;
            }
            updates.push((checkpoint.entry.token_address.clone(), checkpoint.next_status));
        }

        // persistence failures are logged by the watchlist; statuses stay advanced in memory
        summary.advanced = self.watchlist.advance(&updates).await.unwrap_or(0);
        summary
    }

    async fn check_survivor(&self, checkpoint: &DueCheckpoint) -> bool {
        let entry = &checkpoint.entry;
        let snapshot = match self.market.token_overview(&entry.token_address).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("  - {} ({}h): no market data", entry.symbol, checkpoint.hours);
                return false;
            }
            Err(e) => {
                warn!("  - {} ({}h): market data error: {}", entry.symbol, checkpoint.hours, e);
                return false;
            }
        };

        let report = SurvivalReport::new(entry, &snapshot, checkpoint.hours);
        if !report.survived(self.cfg.max_liquidity_drop_pct, self.cfg.max_holders_drop_pct) {
            info!(
                "  - 💀 {} did not survive {}h (liq {:+.2}%, holders {:+.2}%)",
                entry.symbol, checkpoint.hours, report.liquidity_change_pct, report.holders_change_pct
            );
            return false;
        }

        info!("  - 🌱 {} survived {}h", entry.symbol, checkpoint.hours);
        self.alerts.dispatch(&report.to_markdown(), &self.destination).await;
        true
    }
}
