//! A client for posting messages through the Slack Web API.

use crate::notification::ChatClient;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

/// Base URL of the Slack Web API.
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// A bearer-token client for `chat.postMessage`.
pub struct SlackClient {
    token: String,
    api_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

/// The envelope Slack wraps every Web API response in. HTTP 200 with
/// `ok: false` still means the call failed.
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

impl SlackClient {
    /// Creates a client against the production Slack API.
    pub fn new(token: String) -> Self {
        Self::with_api_url(token, DEFAULT_API_URL.to_string())
    }

    /// Creates a client against an alternate API base URL (used in tests).
    pub fn with_api_url(token: String, api_url: String) -> Self {
        Self {
            token,
            api_url,
            http: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn deliver(&self, channel_id: &str, text: &str) -> anyhow::Result<String> {
        let payload = json!({
            "channel": channel_id,
            "text": "Error Message",
            "blocks": [{
                "type": "section",
                "text": { "type": "mrkdwn", "text": text },
            }],
        });

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .context("HTTP request to Slack failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Slack returned an HTTP error");
            anyhow::bail!("Slack returned HTTP {status}: {body}");
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .context("Failed to decode Slack response")?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
            error!(error = %reason, channel = %channel_id, "Slack rejected the message");
            anyhow::bail!("Slack rejected the message: {reason}");
        }

        let message_id = body.ts.unwrap_or_default();
        debug!(channel = %channel_id, ts = %message_id, "Delivered message to Slack");
        Ok(message_id)
    }
}
