//! CLI commands, Telegram chat commands and their handlers
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::services::{Collaborators, Orchestrator, StartOutcome, StopOutcome};
use crate::config::{Config, Credentials};
use crate::domain::watchlist::read_map;
use crate::exchanges::DexLabel;
use crate::infrastructure::api_clients::{BirdeyeClient, GoPlusClient};
use crate::infrastructure::blockchain::PubsubLogSubscription;
use crate::infrastructure::telegram::TelegramClient;
use crate::shared::errors::{AppError, ConfigError};
use crate::shared::types::CandidateStatus;

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "poolhunter", version)]
#[command(about = "Solana new-pool hunter with security filtering and survival follow-up")]
pub struct Cli {
    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram command bot (/hunt, /stop, /status)
    Bot,

    /// Start hunting without the command bot; Ctrl-C stops
    Hunt {
        /// Chat that receives alerts (overrides telegram.chat_id)
        #[arg(long)]
        chat_id: Option<String>,
    },

    /// Print the persisted watchlist
    Status,

    /// Decode one program log line offline
    Decode {
        /// Exchange layout to apply (raydium, meteora)
        #[arg(short, long)]
        dex: DexLabel,

        /// Raw log line
        line: String,
    },
}

/// Chat command, routed 1:1 to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Hunt,
    Stop,
    Status,
}

impl BotCommand {
    /// Parse the leading `/command`, with or without a `@botname` suffix
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next()?;
        match name.to_lowercase().as_str() {
            "start" => Some(BotCommand::Start),
            "hunt" | "cazar" => Some(BotCommand::Hunt),
            "stop" | "parar" => Some(BotCommand::Stop),
            "status" => Some(BotCommand::Status),
            _ => None,
        }
    }
}

pub const WELCOME_TEXT: &str = "👋 Welcome to the Pool Hunter bot (Raydium + Meteora)!\n\n\
    Use /hunt to start hunting.\nUse /stop to stop it.\nUse /status to see the current state.";

/// Run one chat command and produce the reply text
pub async fn handle_command(
    orchestrator: &Orchestrator,
    command: BotCommand,
    chat_id: &str,
) -> Result<String, AppError> {
    let reply = match command {
        BotCommand::Start => WELCOME_TEXT.to_string(),
        BotCommand::Hunt => match orchestrator.start(chat_id).await? {
            StartOutcome::AlreadyRunning => "🤔 The bot is already hunting.".to_string(),
            StartOutcome::Started { exchanges } => {
                let names: Vec<&str> = exchanges.iter().map(|dex| dex.as_str()).collect();
                format!("🏹 Hunt started! Hunters deployed on {}.", names.join(" and "))
            }
        },
        BotCommand::Stop => match orchestrator.stop().await {
            StopOutcome::NotRunning => "🤔 The bot is not hunting right now.".to_string(),
            StopOutcome::Stopped => "🛑 Hunt stopped! Every hunter is back at base.".to_string(),
        },
        BotCommand::Status => {
            let status = orchestrator.status().await;
            if status.active {
                format!(
                    "✅ The bot is *Active*.\n🕵️‍♂️ *{}* candidates on the watchlist.",
                    status.watchlist_len
                )
            } else {
                "🛑 The bot is *Stopped*.".to_string()
            }
        }
    };
    Ok(reply)
}

/// Long-poll Telegram for chat commands until `cancel` fires, then stop any running hunt
pub async fn run_bot(
    telegram: Arc<TelegramClient>,
    orchestrator: Arc<Orchestrator>,
    poll_timeout: Duration,
    cancel: CancellationToken,
) {
    info!("🤖 Telegram command bot started");
    let mut offset = 0i64;

    loop {
        let updates = tokio::select! {
            _ = cancel.cancelled() => break,
            updates = telegram.get_updates(offset, poll_timeout) => updates,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("⚠️ getUpdates failed: {}", e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(POLL_ERROR_PAUSE) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let Some(command) = message.text.as_deref().and_then(BotCommand::parse) else {
                continue;
            };

            let chat_id = message.chat.id.to_string();
            info!("💬 {:?} from chat {}", command, chat_id);
            let reply = match handle_command(&orchestrator, command, &chat_id).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!("❌ {:?} failed: {}", command, e);
                    format!("❌ Command failed: {}", e)
                }
            };
            if let Err(e) = telegram.send_message(&chat_id, &reply).await {
                error!("❌ Failed to reply to chat {}: {}", chat_id, e);
            }
        }
    }

    orchestrator.stop().await;
    info!("🤖 Telegram command bot stopped");
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command (`bot` when none is given)
    pub async fn execute(command: Option<Commands>, config: Config) -> Result<(), AppError> {
        match command.unwrap_or(Commands::Bot) {
            Commands::Bot => Self::execute_bot_command(config).await,
            Commands::Hunt { chat_id } => Self::execute_hunt_command(chat_id, config).await,
            Commands::Status => Self::execute_status_command(config).await,
            Commands::Decode { dex, line } => {
                Self::execute_decode_command(dex, &line);
                Ok(())
            }
        }
    }

    /// Wire production collaborators from config and environment credentials
    pub fn build_collaborators(
        config: &Config,
        credentials: &Credentials,
    ) -> Result<(Collaborators, Arc<TelegramClient>), AppError> {
        let timeout = config.request_timeout();
        let telegram = Arc::new(TelegramClient::new(
            &config.services.telegram_api_url,
            &credentials.telegram_bot_token,
            timeout,
        ));

        let collaborators = Collaborators {
            scorer: Arc::new(GoPlusClient::new(
                config.services.goplus_url.clone(),
                credentials.goplus_api_key.clone(),
                timeout,
            )?),
            market: Arc::new(BirdeyeClient::new(
                config.services.birdeye_url.clone(),
                credentials.birdeye_api_key.clone(),
                timeout,
            )?),
            sink: telegram.clone(),
            logs: Arc::new(PubsubLogSubscription::new(
                credentials.rpc_ws_url.clone(),
                &config.stream.commitment,
            )?),
        };
        Ok((collaborators, telegram))
    }

    async fn execute_bot_command(config: Config) -> Result<(), AppError> {
        let credentials = Credentials::from_env()?;
        let (collaborators, telegram) = Self::build_collaborators(&config, &credentials)?;
        let poll_timeout = Duration::from_secs(config.telegram.poll_timeout_secs);
        let orchestrator = Arc::new(Orchestrator::new(config, collaborators));

        let cancel = CancellationToken::new();
        let bot = tokio::spawn(run_bot(telegram, orchestrator, poll_timeout, cancel.clone()));

        wait_for_ctrl_c().await;
        cancel.cancel();
        if let Err(e) = bot.await {
            error!("⚠️ Command bot ended abnormally: {}", e);
        }
        Ok(())
    }

    async fn execute_hunt_command(chat_id: Option<String>, config: Config) -> Result<(), AppError> {
        let destination = chat_id
            .or_else(|| config.telegram.chat_id.clone())
            .ok_or_else(|| ConfigError::Invalid("hunt needs --chat-id or telegram.chat_id".to_string()))?;

        let credentials = Credentials::from_env()?;
        let (collaborators, _telegram) = Self::build_collaborators(&config, &credentials)?;
        let orchestrator = Orchestrator::new(config, collaborators);

        orchestrator.start(&destination).await?;
        wait_for_ctrl_c().await;
        orchestrator.stop().await;
        Ok(())
    }

    async fn execute_status_command(config: Config) -> Result<(), AppError> {
        let path = &config.storage.watchlist_path;
        let entries = read_map(path).await?;

        info!("📊 Watchlist {} ({} candidates)", path.display(), entries.len());
        let mut counts: BTreeMap<CandidateStatus, usize> = BTreeMap::new();
        for entry in entries.values() {
            *counts.entry(entry.status).or_default() += 1;
        }
        for (status, count) in &counts {
            info!("   {}: {}", status.as_str(), count);
        }
        for entry in entries.values() {
            info!(
                "   - {} ({}) from {} found {} [{}] liq ${:.2} holders {}",
                entry.symbol,
                entry.token_address,
                entry.source,
                entry.found_at.to_rfc3339(),
                entry.status.as_str(),
                entry.initial_liquidity,
                entry.initial_holders
            );
        }
        Ok(())
    }

    fn execute_decode_command(dex: DexLabel, line: &str) {
        match dex.layout().decode(line) {
            Some(address) => info!("✅ {} token address: {}", dex, address),
            None => info!("❌ No {} pool initialization found in line", dex),
        }
    }
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Ctrl-C received, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}
