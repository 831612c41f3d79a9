//! Bot API transport over HTTPS.
//!
//! Every method is a JSON `POST` to `{api_base}/bot{token}/{method}`. The
//! response envelope is decoded by [`decode_envelope`], which folds HTTP
//! status, `{"ok": false}` bodies and unparsable bodies into [`ApiFailure`].
//!
//! The request URL embeds the bot token, so it is never logged and
//! `reqwest` errors are stripped of their URL before being surfaced.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::{ApiEnvelope, ApiFailure, ApiResult, ChatId, TgChat, TgMessage, Transport};
use crate::config::TelegramConfig;

/// Bot API client bound to a single bot token.
pub struct BotApiTransport {
    token: String,
    api_base: String,
    client: Client,
}

impl BotApiTransport {
    /// Create a transport with its own HTTP client.
    ///
    /// # Example
    /// ```
    /// use tgrelay::transport::{BotApiTransport, Transport};
    ///
    /// let transport = BotApiTransport::new("123:abc", "https://api.telegram.org", 30);
    /// assert_eq!(transport.name(), "telegram");
    /// ```
    pub fn new(token: &str, api_base: &str, timeout_secs: u64) -> Self {
        Self::with_client(
            token,
            api_base,
            Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
                .build()
                .unwrap_or_else(|_| Client::new()),
        )
    }

    /// Create a transport with a caller-supplied HTTP client.
    pub fn with_client(token: &str, api_base: &str, client: Client) -> Self {
        Self {
            token: token.trim().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn from_config(config: &TelegramConfig) -> Self {
        Self::new(&config.bot_token, &config.api_base, config.timeout_secs)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> ApiResult<T> {
        if self.token.is_empty() {
            return Err(ApiFailure::new(401, "Unauthorized: bot token is empty"));
        }

        debug!(method = method, "Bot API call");

        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiFailure::network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiFailure::network(e.without_url().to_string()))?;

        decode_envelope(status, &body)
    }
}

/// Decode a Bot API response body into a result.
///
/// A body with `"ok": true` and a `result` wins regardless of HTTP status.
/// Failures take `error_code` from the body, falling back to the HTTP status.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> ApiResult<T> {
    let envelope: ApiEnvelope<T> = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) => {
            let code = if (200..300).contains(&status) {
                0
            } else {
                i64::from(status)
            };
            return Err(ApiFailure::new(
                code,
                format!("Malformed Bot API response (HTTP {}): {}", status, e),
            ));
        }
    };

    if envelope.ok {
        if let Some(result) = envelope.result {
            return Ok(result);
        }
        return Err(ApiFailure::new(
            i64::from(status),
            "Bot API response is missing 'result'",
        ));
    }

    let code = envelope.error_code.unwrap_or(i64::from(status));
    let description = envelope
        .description
        .unwrap_or_else(|| format!("HTTP {}", status));
    let mut failure = ApiFailure::new(code, description);
    failure.retry_after = envelope.parameters.and_then(|p| p.retry_after);
    Err(failure)
}

#[async_trait]
impl Transport for BotApiTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn forward_one(
        &self,
        source: &ChatId,
        target: &ChatId,
        message_id: u64,
    ) -> ApiResult<TgMessage> {
        self.call(
            "forwardMessage",
            json!({
                "chat_id": target.as_str(),
                "from_chat_id": source.as_str(),
                "message_id": message_id,
            }),
        )
        .await
    }

    async fn send_text(&self, chat: &ChatId, text: &str) -> ApiResult<TgMessage> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat.as_str(),
                "text": text,
            }),
        )
        .await
    }

    async fn delete_one(&self, chat: &ChatId, message_id: u64) -> ApiResult<bool> {
        self.call(
            "deleteMessage",
            json!({
                "chat_id": chat.as_str(),
                "message_id": message_id,
            }),
        )
        .await
    }

    async fn get_chat(&self, chat: &ChatId) -> ApiResult<TgChat> {
        self.call("getChat", json!({ "chat_id": chat.as_str() }))
            .await
    }
}
