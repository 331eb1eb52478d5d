//! External security-scoring and market-data services

pub mod birdeye_client;
pub mod goplus_client;

use async_trait::async_trait;

use crate::shared::errors::ServiceError;
use crate::shared::types::{MarketSnapshot, TokenSecurity};

pub use birdeye_client::BirdeyeClient;
pub use goplus_client::GoPlusClient;

/// Security-scoring collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecurityScorer: Send + Sync {
    /// Security data for `token_address`, `None` when the service has no result for it
    async fn token_security(&self, token_address: &str) -> Result<Option<TokenSecurity>, ServiceError>;
}

/// Market-data collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current market snapshot, `None` when the service reports no data
    async fn token_overview(&self, token_address: &str) -> Result<Option<MarketSnapshot>, ServiceError>;
}
