//! Poolhunter - Solana new-pool hunter
//! Streams pool-initialization logs, filters launches through security and market checks,
//! and follows approved candidates up at 24h and 48h.

pub mod application;
pub mod config;
pub mod domain;
pub mod exchanges;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{Collaborators, Orchestrator};
pub use config::{Config, Credentials};
pub use domain::{CandidateEvaluator, SurvivalWatcher, Verdict, Watchlist};
pub use exchanges::DexLabel;
