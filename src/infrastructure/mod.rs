//! Infrastructure layer - chain streams and external HTTP services

pub mod api_clients;
pub mod blockchain;
pub mod telegram;
