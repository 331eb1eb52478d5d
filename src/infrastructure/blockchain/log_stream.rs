//! Program log subscriptions and the per-exchange stream watcher.
//!
//! A watcher moves through Connecting -> Streaming, and on any stream failure (a silent
//! stream included) through Backoff and back to Connecting, until its cancellation token
//! fires. Cancellation is observed while connecting, while waiting for the next batch and
//! while backing off; it always ends the task cleanly.

use async_trait::async_trait;
use futures_util::StreamExt;
use rand::Rng;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_client::rpc_response::RpcLogsResponse;
use solana_sdk::commitment_config::CommitmentConfig;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::StreamCfg;
use crate::domain::evaluator::{CandidateEvaluator, Verdict};
use crate::exchanges::{decode_lines, DexLabel};
use crate::shared::errors::{ConfigError, StreamError};
use crate::shared::types::LaunchEvent;

/// Log lines of one successful transaction mentioning the subscribed program
pub type LogBatch = Vec<String>;

const LOG_CHANNEL_CAPACITY: usize = 256;

/// Source of program log batches
#[async_trait]
pub trait LogSubscription: Send + Sync {
    /// Subscribe to logs mentioning `program_id`. The returned channel closing means the
    /// subscription ended unexpectedly.
    async fn open(&self, program_id: &str) -> Result<mpsc::Receiver<LogBatch>, StreamError>;
}

/// Websocket `logsSubscribe` against a Solana RPC node
pub struct PubsubLogSubscription {
    ws_url: String,
    commitment: CommitmentConfig,
}

impl PubsubLogSubscription {
    pub fn new(ws_url: String, commitment: &str) -> Result<Self, ConfigError> {
        let commitment = CommitmentConfig::from_str(commitment)
            .map_err(|e| ConfigError::Invalid(format!("stream.commitment {}: {}", commitment, e)))?;
        Ok(Self { ws_url, commitment })
    }
}

#[async_trait]
impl LogSubscription for PubsubLogSubscription {
    async fn open(&self, program_id: &str) -> Result<mpsc::Receiver<LogBatch>, StreamError> {
        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(forward_logs(
            self.ws_url.clone(),
            program_id.to_string(),
            self.commitment,
            tx,
            ready_tx,
        ));

        match ready_rx.await {
            Ok(Ok(())) => Ok(rx),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(StreamError::Closed),
        }
    }
}

/// Owns the websocket client for the lifetime of one subscription. Exits when the
/// receiver is dropped or the remote stream ends.
async fn forward_logs(
    ws_url: String,
    program_id: String,
    commitment: CommitmentConfig,
    tx: mpsc::Sender<LogBatch>,
    ready: oneshot::Sender<Result<(), StreamError>>,
) {
    let client = match PubsubClient::new(&ws_url).await {
        Ok(client) => client,
        Err(e) => {
            let _ = ready.send(Err(StreamError::Connect(e.to_string())));
            return;
        }
    };

    let (mut stream, unsubscribe) = match client
        .logs_subscribe(
            RpcTransactionLogsFilter::Mentions(vec![program_id.clone()]),
            RpcTransactionLogsConfig {
                commitment: Some(commitment),
            },
        )
        .await
    {
        Ok(subscription) => subscription,
        Err(e) => {
            let _ = ready.send(Err(StreamError::Subscribe(e.to_string())));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        drop(stream);
        unsubscribe().await;
        return;
    }

    loop {
        tokio::select! {
            _ = tx.closed() => break,
            notification = stream.next() => match notification {
                Some(response) => {
                    if let Some(batch) = batch_from_notification(response.value) {
                        if tx.send(batch).await.is_err() {
                            break;
                        }
                    }
                }
                None => {
                    debug!("Log stream for {} ended", program_id);
                    break;
                }
            }
        }
    }

    drop(stream);
    unsubscribe().await;
    if let Err(e) = client.shutdown().await {
        debug!("Websocket shutdown for {}: {}", program_id, e);
    }
}

/// Lines of a notification, or `None` when the transaction failed
pub fn batch_from_notification(notification: RpcLogsResponse) -> Option<LogBatch> {
    if let Some(err) = notification.err {
        debug!("Skipping failed transaction {}: {}", notification.signature, err);
        return None;
    }
    Some(notification.logs)
}

/// Reconnect delay: fixed base plus uniform jitter in `[0, jitter]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base: Duration,
    jitter: Duration,
}

impl Backoff {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn from_config(cfg: &StreamCfg) -> Self {
        Self::new(
            Duration::from_secs(cfg.backoff_secs),
            Duration::from_secs(cfg.backoff_jitter_secs),
        )
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

enum StreamEnd {
    Cancelled,
    Failed(StreamError),
}

/// Self-healing subscription to one exchange program
pub struct LogStreamWatcher {
    dex: DexLabel,
    program_id: String,
    subscription: Arc<dyn LogSubscription>,
    evaluator: Arc<CandidateEvaluator>,
    backoff: Backoff,
    idle_timeout: Duration,
}

impl LogStreamWatcher {
    pub fn new(
        dex: DexLabel,
        program_id: String,
        subscription: Arc<dyn LogSubscription>,
        evaluator: Arc<CandidateEvaluator>,
        backoff: Backoff,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            dex,
            program_id,
            subscription,
            evaluator,
            backoff,
            idle_timeout,
        }
    }

    /// Run until `cancel` fires. Never returns an error: every failure leads to a retry.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("🚀 {} watcher started ({})", self.dex, self.program_id);

        loop {
            info!("🔌 Connecting to {} log stream...", self.dex);
            let opened = tokio::select! {
                _ = cancel.cancelled() => break,
                opened = self.subscription.open(&self.program_id) => opened,
            };

            match opened {
                Ok(receiver) => {
                    info!("✅ Subscribed to {} pool creations", self.dex);
                    match self.stream(receiver, &cancel).await {
                        StreamEnd::Cancelled => break,
                        StreamEnd::Failed(e) => warn!("⚠️ {} stream error: {}", self.dex, e),
                    }
                }
                Err(e) => warn!("⚠️ {} stream error: {}", self.dex, e),
            }

            let delay = self.backoff.next_delay();
            warn!("🔁 Reconnecting {} in {:.1}s", self.dex, delay.as_secs_f64());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("🛑 {} watcher stopped", self.dex);
    }

    async fn stream(&self, mut receiver: mpsc::Receiver<LogBatch>, cancel: &CancellationToken) -> StreamEnd {
        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => return StreamEnd::Cancelled,
                batch = tokio::time::timeout(self.idle_timeout, receiver.recv()) => batch,
            };

            match batch {
                Ok(Some(lines)) => {
                    self.process_batch(&lines).await;
                }
                Ok(None) => return StreamEnd::Failed(StreamError::Closed),
                Err(_) => return StreamEnd::Failed(StreamError::Timeout(self.idle_timeout)),
            }
        }
    }

    /// Decode a batch and evaluate each distinct new address, in line order
    pub async fn process_batch(&self, lines: &[String]) -> Vec<(LaunchEvent, Verdict)> {
        let mut seen = HashSet::new();
        let mut outcomes = Vec::new();

        for (token_address, raw_log) in decode_lines(self.dex, lines) {
            if !seen.insert(token_address.clone()) {
                continue;
            }

            let event = LaunchEvent {
                token_address,
                source: self.dex,
                raw_log: raw_log.to_string(),
            };
            info!("🆕 {} launch detected: {}", self.dex, event.token_address);

            let verdict = self.evaluator.evaluate(&event.token_address, event.source).await;
            if let Verdict::Approved(entry) = &verdict {
                info!("🎯 {} candidate {} tracked", self.dex, entry.symbol);
            }
            outcomes.push((event, verdict));
        }

        if outcomes.is_empty() && !lines.is_empty() {
            debug!("No pool initialization in {} line batch", lines.len());
        }
        outcomes
    }
}
