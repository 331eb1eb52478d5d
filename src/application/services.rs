//! Hunting task group: one log watcher per exchange plus the survival watcher,
//! started and stopped as a unit.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::alerts::{AlertDispatcher, AlertSink};
use crate::domain::evaluator::CandidateEvaluator;
use crate::domain::survival::SurvivalWatcher;
use crate::domain::watchlist::Watchlist;
use crate::exchanges::DexLabel;
use crate::infrastructure::api_clients::{MarketDataSource, SecurityScorer};
use crate::infrastructure::blockchain::{Backoff, LogStreamWatcher, LogSubscription};
use crate::shared::errors::AppError;

/// External collaborators the task group is wired with
#[derive(Clone)]
pub struct Collaborators {
    pub scorer: Arc<dyn SecurityScorer>,
    pub market: Arc<dyn MarketDataSource>,
    pub sink: Arc<dyn AlertSink>,
    pub logs: Arc<dyn LogSubscription>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { exchanges: Vec<DexLabel> },
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    pub active: bool,
    pub destination: Option<String>,
    pub watchlist_len: usize,
}

struct TaskGroup {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    destination: String,
}

pub struct Orchestrator {
    config: Config,
    collaborators: Collaborators,
    watchlist: Arc<Watchlist>,
    group: Mutex<Option<TaskGroup>>,
}

impl Orchestrator {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let watchlist = Arc::new(Watchlist::new(config.storage.watchlist_path.clone()));
        Self {
            config,
            collaborators,
            watchlist,
            group: Mutex::new(None),
        }
    }

    pub fn watchlist(&self) -> Arc<Watchlist> {
        self.watchlist.clone()
    }

    /// Reload the watchlist and launch the task group, alerting to `destination`.
    /// An unreadable watchlist file aborts the start so it is never overwritten.
    pub async fn start(&self, destination: &str) -> Result<StartOutcome, AppError> {
        let mut group = self.group.lock().await;
        if group.is_some() {
            info!("🤔 Hunt already running, ignoring start");
            return Ok(StartOutcome::AlreadyRunning);
        }

        self.watchlist.load().await?;

        let alerts = AlertDispatcher::new(self.collaborators.sink.clone());
        let evaluator = Arc::new(CandidateEvaluator::new(
            self.collaborators.scorer.clone(),
            self.collaborators.market.clone(),
            self.watchlist.clone(),
            alerts.clone(),
            self.config.filters.clone(),
            destination.to_string(),
        ));

        let cancel = CancellationToken::new();
        let mut handles = Vec::with_capacity(DexLabel::ALL.len() + 1);

        for dex in DexLabel::ALL {
            let watcher = LogStreamWatcher::new(
                dex,
                self.config.programs.program_id(dex).to_string(),
                self.collaborators.logs.clone(),
                evaluator.clone(),
                Backoff::from_config(&self.config.stream),
                Duration::from_secs(self.config.stream.idle_timeout_secs),
            );
            let token = cancel.child_token();
            handles.push(tokio::spawn(async move { watcher.run(token).await }));
        }

        let survival = SurvivalWatcher::new(
            self.collaborators.market.clone(),
            self.watchlist.clone(),
            alerts,
            self.config.survival.clone(),
            destination.to_string(),
        );
        let token = cancel.child_token();
        handles.push(tokio::spawn(async move { survival.run(token).await }));

        info!("🏹 Hunt started: {} task(s), alerts to {}", handles.len(), destination);
        *group = Some(TaskGroup {
            cancel,
            handles,
            destination: destination.to_string(),
        });

        Ok(StartOutcome::Started {
            exchanges: DexLabel::ALL.to_vec(),
        })
    }

    /// Cancel every task and wait for all of them to finish
    pub async fn stop(&self) -> StopOutcome {
        let mut group = self.group.lock().await;
        let Some(TaskGroup { cancel, handles, .. }) = group.take() else {
            info!("🤔 No hunt running, nothing to stop");
            return StopOutcome::NotRunning;
        };

        cancel.cancel();
        for result in join_all(handles).await {
            if let Err(e) = result {
                debug!("Task ended abnormally during stop: {}", e);
            }
        }

        info!("🛑 Hunt stopped, all tasks joined");
        StopOutcome::Stopped
    }

    pub async fn status(&self) -> GroupStatus {
        let group = self.group.lock().await;
        GroupStatus {
            active: group.is_some(),
            destination: group.as_ref().map(|g| g.destination.clone()),
            watchlist_len: self.watchlist.len().await,
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(group) = self.group.get_mut() {
            warn!("Orchestrator dropped while running, cancelling tasks");
            group.cancel.cancel();
        }
    }
}
