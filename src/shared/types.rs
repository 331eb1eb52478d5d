//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exchanges::types::DexLabel;

/// Follow-up state of a watchlist candidate. Ordered: a candidate only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CandidateStatus {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "checked_24h")]
    Checked24h,
    #[serde(rename = "checked_48h")]
    Checked48h,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::New => "new",
            CandidateStatus::Checked24h => "checked_24h",
            CandidateStatus::Checked48h => "checked_48h",
        }
    }

    /// Next checkpoint, `None` once terminal
    pub fn next(&self) -> Option<Self> {
        match self {
            CandidateStatus::New => Some(CandidateStatus::Checked24h),
            CandidateStatus::Checked24h => Some(CandidateStatus::Checked48h),
            CandidateStatus::Checked48h => None,
        }
    }
}

/// Approved candidate tracked for survival follow-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub token_address: String,
    pub found_at: DateTime<Utc>,
    pub symbol: String,
    pub status: CandidateStatus,
    pub initial_liquidity: f64,
    pub initial_holders: u64,
    pub source: DexLabel,
}

impl CandidateEntry {
    /// Fresh entry with the market snapshot taken at approval time as baseline
    pub fn approved(token_address: &str, source: DexLabel, snapshot: &MarketSnapshot, found_at: DateTime<Utc>) -> Self {
        Self {
            token_address: token_address.to_string(),
            found_at,
            symbol: snapshot.symbol.clone(),
            status: CandidateStatus::New,
            initial_liquidity: snapshot.liquidity,
            initial_holders: snapshot.holders,
            source,
        }
    }

    /// Seconds elapsed since the candidate was found
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.found_at).num_seconds()
    }
}

/// Token address recovered from a pool-initialization log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEvent {
    pub token_address: String,
    pub source: DexLabel,
    pub raw_log: String,
}

/// Honeypot verdict of the security service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoneypotFlag {
    NotHoneypot,
    Honeypot,
    Unknown,
}

/// Liquidity-provider holder record
#[derive(Debug, Clone, PartialEq)]
pub struct LpHolder {
    pub is_locked: bool,
    /// Fraction of the LP supply, 0.0..=1.0
    pub percent: f64,
}

/// Raw security data as returned by the security collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSecurity {
    pub honeypot: HoneypotFlag,
    pub lp_holders: Vec<LpHolder>,
}

/// Assessed security of a token
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityReport {
    pub honeypot: HoneypotFlag,
    pub locked_fraction: f64,
    pub summary: Vec<String>,
}

impl SecurityReport {
    pub fn assess(security: &TokenSecurity, min_locked_fraction: f64) -> Self {
        let locked_fraction: f64 = security
            .lp_holders
            .iter()
            .filter(|lp| lp.is_locked)
            .map(|lp| lp.percent)
            .sum();

        let mut summary = Vec::new();
        summary.push(match security.honeypot {
            HoneypotFlag::Honeypot => "- 🚨 HIGH RISK! Possible honeypot.".to_string(),
            HoneypotFlag::NotHoneypot => "- ✅ Does not look like a honeypot.".to_string(),
            HoneypotFlag::Unknown => "- ❓ Honeypot status unknown.".to_string(),
        });
        summary.push(format!("- 💧 Locked liquidity: {:.2}%", locked_fraction * 100.0));
        if locked_fraction < min_locked_fraction {
            summary.push(format!(
                "- 🚩 WARNING: less than {:.0}% of liquidity is locked.",
                min_locked_fraction * 100.0
            ));
        }

        Self {
            honeypot: security.honeypot,
            locked_fraction,
            summary,
        }
    }

    pub fn is_safe(&self, min_locked_fraction: f64) -> bool {
        self.honeypot != HoneypotFlag::Honeypot && self.locked_fraction >= min_locked_fraction
    }

    pub fn summary_text(&self) -> String {
        self.summary.join("\n")
    }
}

/// Market state of a token at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Pool liquidity in quote-currency (USD) units
    pub liquidity: f64,
    pub holders: u64,
}
