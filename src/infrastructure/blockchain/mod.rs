//! Solana program log streaming

pub mod log_stream;

pub use log_stream::{Backoff, LogBatch, LogStreamWatcher, LogSubscription, PubsubLogSubscription};
