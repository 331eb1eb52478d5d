//! Two-stage candidate filter: security first, then market depth.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::FiltersCfg;
use crate::domain::alerts::AlertDispatcher;
use crate::domain::watchlist::Watchlist;
use crate::exchanges::DexLabel;
use crate::infrastructure::api_clients::{MarketDataSource, SecurityScorer};
use crate::report::approval_message;
use crate::shared::types::{CandidateEntry, MarketSnapshot, SecurityReport};

/// Outcome of one evaluation. Only `Approved` has side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Approved(CandidateEntry),
    /// Already on the watchlist; no service was queried
    AlreadyTracked,
    /// Honeypot-flagged or under-locked liquidity
    Unsafe(SecurityReport),
    /// Security service failed or had no result; treated as unsafe
    SecurityUnavailable(String),
    BelowMarketThreshold(MarketSnapshot),
    MarketUnavailable(String),
}

impl Verdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved(_))
    }
}

/// Both bounds strict
pub fn passes_market_filter(snapshot: &MarketSnapshot, filters: &FiltersCfg) -> bool {
    snapshot.liquidity > filters.min_liquidity && snapshot.holders > filters.min_holders
}

pub struct CandidateEvaluator {
    scorer: Arc<dyn SecurityScorer>,
    market: Arc<dyn MarketDataSource>,
    watchlist: Arc<Watchlist>,
    alerts: AlertDispatcher,
    filters: FiltersCfg,
    destination: String,
}

impl CandidateEvaluator {
    pub fn new(
        scorer: Arc<dyn SecurityScorer>,
        market: Arc<dyn MarketDataSource>,
        watchlist: Arc<Watchlist>,
        alerts: AlertDispatcher,
        filters: FiltersCfg,
        destination: String,
    ) -> Self {
        Self {
            scorer,
            market,
            watchlist,
            alerts,
            filters,
            destination,
        }
    }

    pub async fn evaluate(&self, token_address: &str, source: DexLabel) -> Verdict {
        if self.watchlist.contains(token_address).await {
            debug!("  - {} already on the watchlist, skipping", token_address);
            return Verdict::AlreadyTracked;
        }

        info!("🔎 Evaluating candidate from {}: {}", source, token_address);

        let security = match self.security_stage(token_address).await {
            Ok(report) => report,
            Err(verdict) => return verdict,
        };

        let snapshot = match self.market.token_overview(token_address).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("  - DISCARDED (market): no market data for {}", token_address);
                return Verdict::MarketUnavailable("no market data".to_string());
            }
            Err(e) => {
                warn!("  - DISCARDED (market error) {}: {}", token_address, e);
                return Verdict::MarketUnavailable(e.to_string());
            }
        };

        if !passes_market_filter(&snapshot, &self.filters) {
            info!(
                "  - DISCARDED (market): below minimums (liq: ${:.2}, holders: {})",
                snapshot.liquidity, snapshot.holders
            );
            return Verdict::BelowMarketThreshold(snapshot);
        }

        let entry = CandidateEntry::approved(token_address, source, &snapshot, Utc::now());
        match self.watchlist.insert_new(entry.clone()).await {
            Ok(true) => info!("  - ✅ APPROVED! {} added to the watchlist", entry.symbol),
            Ok(false) => {
                debug!("  - {} approved concurrently by another stream, skipping", token_address);
                return Verdict::AlreadyTracked;
            }
            Err(e) => warn!("  - ✅ APPROVED! {} tracked in memory only: {}", entry.symbol, e),
        }

        self.alerts
            .dispatch(&approval_message(&entry, &security), &self.destination)
            .await;

        Verdict::Approved(entry)
    }

    /// Fail-closed: any error or missing result rejects the candidate
    async fn security_stage(&self, token_address: &str) -> Result<SecurityReport, Verdict> {
        match self.scorer.token_security(token_address).await {
            Ok(Some(security)) => {
                let report = SecurityReport::assess(&security, self.filters.min_locked_fraction);
                if report.is_safe(self.filters.min_locked_fraction) {
                    Ok(report)
                } else {
                    info!("  - DISCARDED (security): {}", report.summary.join(" "));
                    Err(Verdict::Unsafe(report))
                }
            }
            Ok(None) => {
                info!("  - DISCARDED (security unavailable): no report for {}", token_address);
                Err(Verdict::SecurityUnavailable("no security report".to_string()))
            }
            Err(e) => {
                warn!("  - DISCARDED (security error) {}: {}", token_address, e);
                Err(Verdict::SecurityUnavailable(e.to_string()))
            }
        }
    }
}
