//! Chat clients and their registry.
//!
//! The [`ChatClient`] trait is the seam between the dispatcher and a
//! concrete provider, so tests (and embedding applications) can inject
//! their own client. The [`ClientRegistry`] is built once by the host and
//! handed to the dispatcher by reference; there is no hidden process-wide
//! singleton.

pub mod slack;

use crate::errors::ConfigError;
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

pub use slack::SlackClient;

/// A provider-bound "send message to channel" capability.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Delivers `text` to the channel, returning the provider message id.
    async fn deliver(&self, channel_id: &str, text: &str) -> anyhow::Result<String>;
}

/// Supported chat providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Slack,
}

impl FromStr for Provider {
    type Err = ConfigError;

    /// Unrecognized identifiers fail fast instead of silently falling back
    /// to Slack, so a typo in a provider id is caught at setup time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slack" => Ok(Provider::Slack),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Holds the one client the host built for this process. Cheap to clone;
/// clones share the underlying client.
#[derive(Clone)]
pub struct ClientRegistry {
    client: Arc<dyn ChatClient>,
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish_non_exhaustive()
    }
}

impl ClientRegistry {
    /// Builds the provider's client from a credential. An empty credential
    /// is a hard configuration error: nothing may be delivered without one.
    pub fn connect(provider: Provider, token: &str) -> Result<Self, ConfigError> {
        if token.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        let client: Arc<dyn ChatClient> = match provider {
            Provider::Slack => Arc::new(SlackClient::new(token.to_string())),
        };
        Ok(Self { client })
    }

    /// Wraps an externally constructed client.
    pub fn with_client(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&self.client)
    }
}
