//! Fire-and-forget alert delivery

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::shared::errors::AlertError;

/// Messaging collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<(), AlertError>;
}

/// At-most-once alert delivery. Failures are logged and swallowed, never retried.
#[derive(Clone)]
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    pub async fn dispatch(&self, message: &str, destination: &str) {
        match self.sink.send(destination, message).await {
            Ok(()) => info!("📨 Alert sent to {}", destination),
            Err(e) => error!("❌ Failed to deliver alert to {}: {}", destination, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let mut sink = MockAlertSink::new();
        sink.expect_send()
            .times(1)
            .returning(|_, _| Err(AlertError::Rejected("chat not found".to_string())));

        AlertDispatcher::new(Arc::new(sink)).dispatch("hello", "42").await;
    }

    #[tokio::test]
    async fn test_dispatch_passes_destination_and_text() {
        let mut sink = MockAlertSink::new();
        sink.expect_send()
            .withf(|destination, text| destination == "-100" && text == "*bold*")
            .times(1)
            .returning(|_, _| Ok(()));

        AlertDispatcher::new(Arc::new(sink)).dispatch("*bold*", "-100").await;
    }
}
