//! The alert guard: wraps an arbitrary operation and reports its failure.
//!
//! This is the composition entry point most applications use:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use alertbot::AlertGuard;
//!
//! let guard = AlertGuard::builder()
//!     .config_path("alertbot.yaml")
//!     .environment("prod")
//!     .build()
//!     .await?;
//!
//! let result = guard.run(|| risky_operation()).await;
//! # drop(result); Ok(())
//! # }
//! # fn risky_operation() -> Result<(), std::io::Error> { Ok(()) }
//! ```
//!
//! By default the original error is returned to the caller after the alert
//! goes out; [`AlertGuard::run_silenced`] is the explicit opt-in that
//! swallows it.

use crate::config::AlertConfig;
use crate::core::ErrorReport;
use crate::dispatch::Dispatcher;
use crate::errors::ConfigError;
use crate::notification::{ChatClient, ClientRegistry, Provider};
use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// A post-alert callback. Receives the guard's params; a failing callback
/// is logged and never interferes with the others.
pub type AlertCallback = Box<dyn Fn(&[(String, String)]) -> anyhow::Result<()> + Send + Sync>;

const DEFAULT_ENVIRONMENT: &str = "dev";

/// Builder for [`AlertGuard`]. Either a config path or an inline token and
/// channel id must be supplied; anything else fails at build time, before
/// any network call.
#[derive(Default)]
pub struct AlertGuardBuilder {
    config_path: Option<PathBuf>,
    provider: Provider,
    token: Option<String>,
    channel: Option<String>,
    channel_id: Option<String>,
    service: Option<String>,
    environment: Option<String>,
    params: Vec<(String, String)>,
    attach_params: Option<bool>,
    callbacks: Vec<AlertCallback>,
    client: Option<Arc<dyn ChatClient>>,
}

impl AlertGuardBuilder {
    /// YAML config document to resolve channels and the credential from.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Chat provider to deliver through. Defaults to Slack.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Explicit bot token. Outranks every credential source in the config.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Channel name, looked up in the config's channel map.
    pub fn channel(mut self, name: impl Into<String>) -> Self {
        self.channel = Some(name.into());
        self
    }

    /// Raw channel id, for the inline (config-less) path.
    pub fn channel_id(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Adds a key/value param, attached to alerts as a custom field when
    /// param attachment is enabled, and passed to callbacks.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Attach params to alerts as custom fields. Overrides the config's
    /// `params` flag; defaults to false on the inline path.
    pub fn attach_params(mut self, attach: bool) -> Self {
        self.attach_params = Some(attach);
        self
    }

    /// Registers a callback run after each alert.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[(String, String)]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Injects a pre-built chat client instead of connecting one from the
    /// resolved credential. Used by tests and by hosts that manage their
    /// own client.
    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Resolves configuration and credential and builds the guard.
    ///
    /// Fails with [`ConfigError::MissingTriggerArgs`] before any network
    /// call when neither a config path nor an inline token + channel id is
    /// present.
    pub async fn build(self) -> Result<AlertGuard, ConfigError> {
        if let Some(path) = &self.config_path {
            let config = AlertConfig::load(path)?;
            let channel_id = config.channels.resolve(self.channel.as_deref())?.to_string();
            let registry = match self.client {
                // An injected client carries its own credential.
                Some(client) => ClientRegistry::with_client(client),
                None => {
                    let token = config.resolve_token(self.token.as_deref()).await?;
                    ClientRegistry::connect(self.provider, &token)?
                }
            };
            Ok(AlertGuard {
                dispatcher: Dispatcher::new(registry),
                channel_id,
                service: self.service.or(config.service).unwrap_or_default(),
                environment: self
                    .environment
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
                cloudwatch: config.cloudwatch,
                attach_params: self.attach_params.unwrap_or(config.params),
                params: self.params,
                callbacks: self.callbacks,
            })
        } else {
            let (token, channel_id) = match (
                self.token.filter(|t| !t.is_empty()),
                self.channel_id.filter(|c| !c.is_empty()),
            ) {
                (Some(token), Some(channel_id)) => (token, channel_id),
                _ => return Err(ConfigError::MissingTriggerArgs),
            };
            let registry = match self.client {
                Some(client) => ClientRegistry::with_client(client),
                None => ClientRegistry::connect(self.provider, &token)?,
            };
            Ok(AlertGuard {
                dispatcher: Dispatcher::new(registry),
                channel_id,
                service: self.service.unwrap_or_default(),
                environment: self
                    .environment
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
                cloudwatch: None,
                attach_params: self.attach_params.unwrap_or(false),
                params: self.params,
                callbacks: self.callbacks,
            })
        }
    }
}

/// Wraps operations and reports their failures to the configured channel.
pub struct AlertGuard {
    dispatcher: Dispatcher,
    channel_id: String,
    service: String,
    environment: String,
    cloudwatch: Option<String>,
    attach_params: bool,
    params: Vec<(String, String)>,
    callbacks: Vec<AlertCallback>,
}

impl std::fmt::Debug for AlertGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertGuard")
            .field("channel_id", &self.channel_id)
            .field("service", &self.service)
            .field("environment", &self.environment)
            .field("cloudwatch", &self.cloudwatch)
            .field("attach_params", &self.attach_params)
            .field("params", &self.params)
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl AlertGuard {
    pub fn builder() -> AlertGuardBuilder {
        AlertGuardBuilder::default()
    }

    /// Runs the operation. On failure, dispatches an alert and runs the
    /// registered callbacks, then returns the original error unchanged.
    pub async fn run<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error,
    {
        match op() {
            Ok(value) => Ok(value),
            Err(err) => {
                self.report(&err).await;
                Err(err)
            }
        }
    }

    /// Like [`run`](Self::run), but swallows the failure after reporting
    /// it. The explicit opt-in for fire-and-forget call sites.
    pub async fn run_silenced<T, E, F>(&self, op: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error,
    {
        match op() {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(&err).await;
                None
            }
        }
    }

    /// Runs an async operation with the same reporting contract as
    /// [`run`](Self::run).
    pub async fn run_async<T, E, Fut>(&self, fut: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error,
    {
        match fut.await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.report(&err).await;
                Err(err)
            }
        }
    }

    /// Sends a generic (non-error) message to the guard's channel.
    pub async fn notify(&self, message: &str) {
        self.dispatcher
            .send_generic(&self.channel_id, message, &self.environment, &self.service)
            .await;
    }

    async fn report<E: Error>(&self, err: &E) {
        let report = ErrorReport::capture(err);
        let fields: &[(String, String)] = if self.attach_params {
            &self.params
        } else {
            &[]
        };
        self.dispatcher
            .send_error(
                &self.channel_id,
                &self.environment,
                &self.service,
                self.cloudwatch.as_deref(),
                report,
                fields,
            )
            .await;

        for (index, callback) in self.callbacks.iter().enumerate() {
            if let Err(e) = callback(&self.params) {
                warn!(index, error = %e, "Post-alert callback failed");
            }
        }
    }
}
