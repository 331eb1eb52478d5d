//! Application layer - use cases and services

pub mod commands;
pub mod services;

pub use commands::{BotCommand, Cli, CommandExecutor, Commands};
pub use services::{Collaborators, GroupStatus, Orchestrator, StartOutcome, StopOutcome};
