//! The dispatcher composes and delivers one alert.
//!
//! Everything here is best-effort by contract: this path runs inside the
//! caller's failure handling, so a delivery problem is logged and contained,
//! never returned. Setup problems belong to `config` and `trigger`, which
//! do fail loudly.

use crate::core::{AlertContext, ErrorReport};
use crate::formatting;
use crate::notification::ClientRegistry;
use chrono::Local;
use tracing::{debug, error};

/// Environment variable carrying the host/pod name appended to the
/// cloud-log prefix.
const HOSTNAME_VAR: &str = "HOSTNAME";

pub struct Dispatcher {
    registry: ClientRegistry,
}

impl Dispatcher {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Formats and delivers an error alert. Never fails: delivery problems
    /// are logged at error level and swallowed.
    pub async fn send_error(
        &self,
        channel_id: &str,
        environment: &str,
        service: &str,
        cloudwatch: Option<&str>,
        report: ErrorReport,
        custom_fields: &[(String, String)],
    ) {
        let ctx = AlertContext {
            environment: environment.to_string(),
            service: service.to_string(),
            timestamp: Local::now(),
            report,
            cloudwatch: compose_cloudwatch(cloudwatch),
            custom_fields: custom_fields.to_vec(),
        };
        let text = formatting::render_error(&ctx);
        self.deliver(channel_id, &text).await;
    }

    /// Formats and delivers a generic message. Never fails.
    pub async fn send_generic(
        &self,
        channel_id: &str,
        message: &str,
        environment: &str,
        service: &str,
    ) {
        let text = formatting::render_generic(message, environment, service, Local::now());
        self.deliver(channel_id, &text).await;
    }

    async fn deliver(&self, channel_id: &str, text: &str) {
        match self.registry.client().deliver(channel_id, text).await {
            Ok(message_id) => {
                debug!(channel = %channel_id, message_id = %message_id, "Alert delivered");
            }
            Err(e) => {
                error!(error = %e, channel = %channel_id, "Failed to deliver alert");
            }
        }
    }
}

/// Composes the cloud-log pointer: the configured prefix, with the host/pod
/// name appended when the environment provides one.
fn compose_cloudwatch(prefix: Option<&str>) -> Option<String> {
    let prefix = prefix?;
    match std::env::var(HOSTNAME_VAR) {
        Ok(host) if !host.is_empty() => Some(format!("{prefix}{host}")),
        _ => Some(prefix.to_string()),
    }
}
