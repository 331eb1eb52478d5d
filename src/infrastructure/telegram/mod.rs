//! Telegram Bot API client: alert delivery and command polling

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::alerts::AlertSink;
use crate::shared::errors::AlertError;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Telegram Bot API client
pub struct TelegramClient {
    http_client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, bot_token: &str, request_timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
            request_timeout,
        }
    }

    /// Send Markdown text with link previews disabled
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), AlertError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response: TelegramResponse<serde_json::Value> = self
            .http_client
            .post(format!("{}/sendMessage", self.base_url))
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(AlertError::Rejected(
                response.description.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, poll_timeout: Duration) -> Result<Vec<Update>, AlertError> {
        let response: TelegramResponse<Vec<Update>> = self
            .http_client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", poll_timeout.as_secs().to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .timeout(poll_timeout + self.request_timeout)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            Ok(response.result.unwrap_or_default())
        } else {
            Err(AlertError::Rejected(
                response.description.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl AlertSink for TelegramClient {
    async fn send(&self, destination: &str, text: &str) -> Result<(), AlertError> {
        self.send_message(destination, text).await
    }
}
