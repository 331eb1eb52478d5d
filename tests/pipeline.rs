//! End-to-end hunting pipeline against in-process fakes of every external service

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use poolhunter::application::{Collaborators, Orchestrator, StartOutcome, StopOutcome};
use poolhunter::config::Config;
use poolhunter::domain::alerts::AlertSink;
use poolhunter::domain::watchlist::read_map;
use poolhunter::exchanges::DexLabel;
use poolhunter::infrastructure::api_clients::{MarketDataSource, SecurityScorer};
use poolhunter::infrastructure::blockchain::{LogBatch, LogSubscription};
use poolhunter::shared::errors::{AlertError, ServiceError, StreamError};
use poolhunter::shared::types::{CandidateStatus, HoneypotFlag, LpHolder, MarketSnapshot, TokenSecurity};

/// Log subscription whose live sender per program is reachable from the test
#[derive(Default)]
struct FakeLogs {
    senders: Mutex<HashMap<String, mpsc::Sender<LogBatch>>>,
    opens: AtomicUsize,
}

impl FakeLogs {
    fn sender(&self, program_id: &str) -> Option<mpsc::Sender<LogBatch>> {
        self.senders.lock().unwrap().get(program_id).cloned()
    }

    async fn push(&self, dex: DexLabel, lines: Vec<String>) {
        let program_id = dex.program_id();
        for _ in 0..300 {
            if let Some(tx) = self.sender(program_id) {
                if tx.send(lines.clone()).await.is_ok() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no live subscription for {}", dex);
    }

    /// Simulate the remote closing the stream
    fn close(&self, dex: DexLabel) {
        self.senders.lock().unwrap().remove(dex.program_id());
    }
}

#[async_trait]
impl LogSubscription for FakeLogs {
    async fn open(&self, program_id: &str) -> Result<mpsc::Receiver<LogBatch>, StreamError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        self.senders.lock().unwrap().insert(program_id.to_string(), tx);
        Ok(rx)
    }
}

/// Every token is safe with 95% locked liquidity
struct FakeScorer;

#[async_trait]
impl SecurityScorer for FakeScorer {
    async fn token_security(&self, _token_address: &str) -> Result<Option<TokenSecurity>, ServiceError> {
        Ok(Some(TokenSecurity {
            honeypot: HoneypotFlag::NotHoneypot,
            lp_holders: vec![
                LpHolder { is_locked: true, percent: 0.95 },
                LpHolder { is_locked: false, percent: 0.05 },
            ],
        }))
    }
}

/// Market data keyed by address; unknown addresses have none. Each call is slowed down so
/// approvals from different streams overlap.
struct FakeMarket {
    snapshots: HashMap<String, (f64, u64)>,
    delay: Duration,
}

#[async_trait]
impl MarketDataSource for FakeMarket {
    async fn token_overview(&self, token_address: &str) -> Result<Option<MarketSnapshot>, ServiceError> {
        tokio::time::sleep(self.delay).await;
        Ok(self
            .snapshots
            .get(token_address)
            .map(|(liquidity, holders)| MarketSnapshot {
                symbol: format!("SYM{}", &token_address[..4]),
                liquidity: *liquidity,
                holders: *holders,
            }))
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, destination: &str, text: &str) -> Result<(), AlertError> {
        self.sent.lock().unwrap().push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

struct Harness {
    orchestrator: Orchestrator,
    logs: Arc<FakeLogs>,
    sink: Arc<RecordingSink>,
    _dir: tempfile::TempDir,
}

fn harness(snapshots: &[(&str, f64, u64)]) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.watchlist_path = dir.path().join("watchlist.json");
    config.stream.backoff_secs = 1;
    config.stream.backoff_jitter_secs = 0;

    let logs = Arc::new(FakeLogs::default());
    let sink = Arc::new(RecordingSink::default());
    let market = FakeMarket {
        snapshots: snapshots
            .iter()
            .map(|(address, liquidity, holders)| (address.to_string(), (*liquidity, *holders)))
            .collect(),
        delay: Duration::from_millis(25),
    };

    let orchestrator = Orchestrator::new(
        config,
        Collaborators {
            scorer: Arc::new(FakeScorer),
            market: Arc::new(market),
            sink: sink.clone(),
            logs: logs.clone(),
        },
    );

    Harness {
        orchestrator,
        logs,
        sink,
        _dir: dir,
    }
}

fn key(seed: u8) -> [u8; 32] {
    let mut key = [0u8; 32];
    for (i, b) in key.iter_mut().enumerate() {
        *b = seed.wrapping_add(i as u8).wrapping_mul(31);
    }
    key
}

fn address(key: &[u8; 32]) -> String {
    bs58::encode(key).into_string()
}

fn raydium_line(key: &[u8; 32]) -> String {
    let mut data = vec![0x11u8; 305];
    data.extend_from_slice(key);
    data.extend_from_slice(&[0u8; 8]);
    format!("Program log: initialize2 {}", BASE64.encode(data))
}

fn meteora_line(key: &[u8; 32]) -> String {
    let mut data = vec![0x22u8; 72];
    data.extend_from_slice(key);
    format!("Program log: Instruction: InitializePool Program data: {}", BASE64.encode(data))
}

async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..300 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_raydium_launch_is_approved_and_alerted() {
    let x = key(1);
    let h = harness(&[(&address(&x), 10_000.0, 80)]);
    assert!(matches!(h.orchestrator.start("chat-A").await.unwrap(), StartOutcome::Started { .. }));

    h.logs
        .push(
            DexLabel::RaydiumV4,
            vec!["Program log: ray_log: AAAA".to_string(), raydium_line(&x)],
        )
        .await;

    let watchlist = h.orchestrator.watchlist();
    eventually(|| {
        let watchlist = watchlist.clone();
        async move { watchlist.len().await == 1 }
    })
    .await;

    let entry = watchlist.get(&address(&x)).await.unwrap();
    assert_eq!(entry.status, CandidateStatus::New);
    assert_eq!(entry.source, DexLabel::RaydiumV4);
    assert_eq!(entry.initial_liquidity, 10_000.0);
    assert_eq!(entry.initial_holders, 80);

    {
        let sent = h.sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "chat-A");
        assert!(sent[0].1.contains(&address(&x)));
        assert!(sent[0].1.contains("Source: Raydium"));
    }

    assert_eq!(h.orchestrator.stop().await, StopOutcome::Stopped);
}

#[tokio::test]
async fn test_thin_holder_base_is_discarded() {
    let thin = key(2);
    let marker = key(3);
    let h = harness(&[(&address(&thin), 10_000.0, 40), (&address(&marker), 10_000.0, 80)]);
    h.orchestrator.start("chat-B").await.unwrap();

    h.logs.push(DexLabel::RaydiumV4, vec![raydium_line(&thin)]).await;
    h.logs.push(DexLabel::RaydiumV4, vec![raydium_line(&marker)]).await;

    // batches are processed in order, so once the marker lands the thin one was judged
    let watchlist = h.orchestrator.watchlist();
    eventually(|| {
        let watchlist = watchlist.clone();
        let marker = address(&marker);
        async move { watchlist.contains(&marker).await }
    })
    .await;

    assert!(!watchlist.contains(&address(&thin)).await);
    assert_eq!(h.sink.sent.lock().unwrap().len(), 1);

    h.orchestrator.stop().await;
}

#[tokio::test]
async fn test_concurrent_approvals_on_both_exchanges_are_all_persisted() {
    let x = key(4);
    let y = key(5);
    let h = harness(&[(&address(&x), 20_000.0, 300), (&address(&y), 9_000.0, 60)]);
    h.orchestrator.start("chat-C").await.unwrap();

    tokio::join!(
        h.logs.push(DexLabel::RaydiumV4, vec![raydium_line(&x)]),
        h.logs.push(DexLabel::MeteoraDlmm, vec![meteora_line(&y)]),
    );

    let watchlist = h.orchestrator.watchlist();
    eventually(|| {
        let watchlist = watchlist.clone();
        async move { watchlist.len().await == 2 }
    })
    .await;
    h.orchestrator.stop().await;

    let persisted = read_map(watchlist.path()).await.unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[&address(&x)].source, DexLabel::RaydiumV4);
    assert_eq!(persisted[&address(&y)].source, DexLabel::MeteoraDlmm);
    assert_eq!(h.sink.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_start_stop_restart_lifecycle() {
    let x = key(6);
    let (ray_marker, met_marker) = (key(8), key(9));
    let h = harness(&[
        (&address(&x), 10_000.0, 80),
        (&address(&ray_marker), 10_000.0, 80),
        (&address(&met_marker), 10_000.0, 80),
    ]);

    assert_eq!(h.orchestrator.stop().await, StopOutcome::NotRunning);
    assert!(!h.orchestrator.status().await.active);

    h.orchestrator.start("chat-D").await.unwrap();
    assert_eq!(h.orchestrator.start("chat-D").await.unwrap(), StartOutcome::AlreadyRunning);

    h.logs.push(DexLabel::RaydiumV4, vec![raydium_line(&x)]).await;
    let watchlist = h.orchestrator.watchlist();
    eventually(|| {
        let watchlist = watchlist.clone();
        async move { watchlist.len().await == 1 }
    })
    .await;

    let status = h.orchestrator.status().await;
    assert!(status.active);
    assert_eq!(status.watchlist_len, 1);
    assert_eq!(status.destination.as_deref(), Some("chat-D"));

    let stopped = tokio::time::timeout(Duration::from_secs(2), h.orchestrator.stop())
        .await
        .expect("stop waits for every task and returns");
    assert_eq!(stopped, StopOutcome::Stopped);
    assert!(!h.orchestrator.status().await.active);

    // restart reloads the persisted watchlist and resubscribes both exchanges
    let opens_before = h.logs.opens.load(Ordering::SeqCst);
    h.orchestrator.start("chat-E").await.unwrap();
    assert_eq!(h.orchestrator.status().await.watchlist_len, 1);

    // an already tracked token is not evaluated or alerted again; the markers behind it
    // prove each stream got past it
    h.logs.push(DexLabel::RaydiumV4, vec![raydium_line(&x)]).await;
    h.logs.push(DexLabel::MeteoraDlmm, vec![meteora_line(&x)]).await;
    h.logs.push(DexLabel::RaydiumV4, vec![raydium_line(&ray_marker)]).await;
    h.logs.push(DexLabel::MeteoraDlmm, vec![meteora_line(&met_marker)]).await;
    assert!(h.logs.opens.load(Ordering::SeqCst) >= opens_before + 2);

    eventually(|| {
        let watchlist = watchlist.clone();
        async move { watchlist.len().await == 3 }
    })
    .await;
    h.orchestrator.stop().await;

    assert_eq!(watchlist.get(&address(&x)).await.map(|e| e.source), Some(DexLabel::RaydiumV4));
    let sent = h.sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent.iter().filter(|(_, text)| text.contains(&address(&x))).count(), 1);
}

#[tokio::test]
async fn test_watcher_resubscribes_after_stream_closure() {
    let x = key(7);
    let h = harness(&[(&address(&x), 10_000.0, 80)]);
    h.orchestrator.start("chat-F").await.unwrap();

    eventually(|| {
        let logs = h.logs.clone();
        async move { logs.sender(DexLabel::MeteoraDlmm.program_id()).is_some() }
    })
    .await;
    let opens_before = h.logs.opens.load(Ordering::SeqCst);
    h.logs.close(DexLabel::MeteoraDlmm);

    // one backoff later the watcher opens a fresh subscription and keeps hunting
    h.logs.push(DexLabel::MeteoraDlmm, vec![meteora_line(&x)]).await;
    assert!(h.logs.opens.load(Ordering::SeqCst) > opens_before);

    let watchlist = h.orchestrator.watchlist();
    eventually(|| {
        let watchlist = watchlist.clone();
        async move { watchlist.len().await == 1 }
    })
    .await;
    assert_eq!(watchlist.get(&address(&x)).await.unwrap().source, DexLabel::MeteoraDlmm);

    h.orchestrator.stop().await;
}
