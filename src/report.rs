// src/report.rs

use crate::shared::types::{CandidateEntry, MarketSnapshot, SecurityReport};
use crate::shared::utils::{calculate_percentage_change, format_count, format_thousands};

/// Follow-up comparison of a candidate against its approval baseline
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalReport {
    pub token_address: String,
    pub symbol: String,
    pub checkpoint_hours: u32,
    pub current_liquidity: f64,
    pub current_holders: u64,
    pub liquidity_change_pct: f64,
    pub holders_change_pct: f64,
}

impl SurvivalReport {
    pub fn new(entry: &CandidateEntry, snapshot: &MarketSnapshot, checkpoint_hours: u32) -> Self {
        Self {
            token_address: entry.token_address.clone(),
            symbol: entry.symbol.clone(),
            checkpoint_hours,
            current_liquidity: snapshot.liquidity,
            current_holders: snapshot.holders,
            liquidity_change_pct: calculate_percentage_change(entry.initial_liquidity, snapshot.liquidity),
            holders_change_pct: calculate_percentage_change(entry.initial_holders as f64, snapshot.holders as f64),
        }
    }

    /// Both deltas strictly above their floors
    pub fn survived(&self, liquidity_floor_pct: f64, holders_floor_pct: f64) -> bool {
        self.liquidity_change_pct > liquidity_floor_pct && self.holders_change_pct > holders_floor_pct
    }

    pub fn to_markdown(&self) -> String {
        format!(
            "📈 *SURVIVAL REPORT ({hours}H)*\n\n*{symbol}* ({address})\n\n*Progress:*\n\
             - Liquidity: `${liquidity}` ({liq_change:+.2}%)\n\
             - Holders: *{holders}* ({holders_change:+.2}%)\n\n\
             [View on Birdeye](https://birdeye.so/token/{address}?chain=solana)",
            hours = self.checkpoint_hours,
            symbol = self.symbol,
            address = self.token_address,
            liquidity = format_thousands(self.current_liquidity),
            liq_change = self.liquidity_change_pct,
            holders = format_count(self.current_holders),
            holders_change = self.holders_change_pct,
        )
    }
}

/// Alert text for a newly approved candidate
pub fn approval_message(entry: &CandidateEntry, security: &SecurityReport) -> String {
    format!(
        "🕵️‍♂️ *NEW CANDIDATE TO WATCH* (Source: {source})\n\n*{symbol}* ({address})\n\n\
         Passed the security filters. Added to the watchlist for 24h follow-up.\n\n\
         *Security report:*\n{summary}",
        source = entry.source,
        symbol = entry.symbol,
        address = entry.token_address,
        summary = security.summary_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::DexLabel;
    use crate::shared::types::{CandidateStatus, HoneypotFlag};
    use chrono::Utc;

    fn entry(initial_liquidity: f64, initial_holders: u64) -> CandidateEntry {
        CandidateEntry {
            token_address: "Tok1111".to_string(),
            found_at: Utc::now(),
            symbol: "PEPE".to_string(),
            status: CandidateStatus::New,
            initial_liquidity,
            initial_holders,
            source: DexLabel::RaydiumV4,
        }
    }

    fn snapshot(liquidity: f64, holders: u64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: "PEPE".to_string(),
            liquidity,
            holders,
        }
    }

    #[test]
    fn test_survival_report_deltas() {
        let report = SurvivalReport::new(&entry(10_000.0, 80), &snapshot(15_000.0, 60), 24);
        assert_eq!(report.liquidity_change_pct, 50.0);
        assert_eq!(report.holders_change_pct, -25.0);
        assert!(!report.survived(-50.0, -10.0));
    }

    #[test]
    fn test_survival_report_zero_baseline() {
        let report = SurvivalReport::new(&entry(0.0, 0), &snapshot(5_000.0, 10), 48);
        assert_eq!(report.liquidity_change_pct, 0.0);
        assert_eq!(report.holders_change_pct, 0.0);
        assert!(report.survived(-50.0, -10.0));
    }

    #[test]
    fn test_survival_thresholds_are_strict() {
        let report = SurvivalReport::new(&entry(10_000.0, 100), &snapshot(5_000.0, 95), 24);
        assert_eq!(report.liquidity_change_pct, -50.0);
        assert!(!report.survived(-50.0, -10.0));

        let report = SurvivalReport::new(&entry(10_000.0, 100), &snapshot(5_001.0, 91), 24);
        assert!(report.survived(-50.0, -10.0));
    }

    #[test]
    fn test_survival_markdown() {
        let text = SurvivalReport::new(&entry(10_000.0, 80), &snapshot(12_345.6, 1200), 24).to_markdown();
        assert!(text.contains("(24H)"));
        assert!(text.contains("`$12,345.60` (+23.46%)"));
        assert!(text.contains("*1,200* (+1400.00%)"));
        assert!(text.contains("https://birdeye.so/token/Tok1111?chain=solana"));
    }

    #[test]
    fn test_approval_message() {
        let security = SecurityReport {
            honeypot: HoneypotFlag::NotHoneypot,
            locked_fraction: 0.95,
            summary: vec!["- line one".to_string(), "- line two".to_string()],
        };
        let text = approval_message(&entry(10_000.0, 80), &security);
        assert!(text.contains("(Source: Raydium)"));
        assert!(text.contains("*PEPE* (Tok1111)"));
        assert!(text.ends_with("- line one\n- line two"));
    }
}
