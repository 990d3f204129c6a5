//! Configuration loading for alertbot.
//!
//! The config document is YAML, e.g.:
//!
//! ```yaml
//! channels:
//!   ops: C0123456789
//!   oncall: C0987654321
//! service: billing
//! cloudwatch: https://console.aws.amazon.com/cloudwatch/home#logsV2:log-groups/
//! aws_sm_secret: alertbot/slack
//! aws_region: ap-southeast-1
//! params: true
//! ```
//!
//! Loading performs no network I/O; the Secrets Manager fetch happens only
//! when a token is resolved and the document names a secret.

use crate::errors::ConfigError;
use crate::secrets;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// An order-preserving channel-name to channel-id map.
///
/// Document order matters: when no channel name is given, dispatch falls
/// back to the first declared channel. Duplicate names are rejected at
/// parse time.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    entries: Vec<(String, String)>,
}

impl ChannelMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Looks up a channel id by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, id)| id.as_str())
    }

    /// Resolves a channel id: named lookup, or the first declared channel
    /// when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<&str, ConfigError> {
        match name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| ConfigError::UnknownChannel(name.to_string())),
            None => self
                .entries
                .first()
                .map(|(_, id)| id.as_str())
                .ok_or(ConfigError::MissingChannels),
        }
    }
}

impl FromIterator<(String, String)> for ChannelMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for ChannelMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChannelMapVisitor;

        impl<'de> Visitor<'de> for ChannelMapVisitor {
            type Value = ChannelMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of channel names to channel ids")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, String)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, id)) = access.next_entry::<String, String>()? {
                    if entries.iter().any(|(key, _)| *key == name) {
                        return Err(de::Error::custom(format!(
                            "duplicate channel name: {name}"
                        )));
                    }
                    entries.push((name, id));
                }
                Ok(ChannelMap { entries })
            }
        }

        deserializer.deserialize_map(ChannelMapVisitor)
    }
}

/// The parsed alert configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Channel name to channel id map. Required and non-empty.
    #[serde(default)]
    pub channels: ChannelMap,
    /// Name of the service raising alerts.
    #[serde(default)]
    pub service: Option<String>,
    /// Cloud-log URL prefix included in alerts when set.
    #[serde(default)]
    pub cloudwatch: Option<String>,
    /// Secrets Manager secret holding the bot token.
    #[serde(default)]
    pub aws_sm_secret: Option<String>,
    /// Region of the Secrets Manager secret.
    #[serde(default)]
    pub aws_region: Option<String>,
    /// Literal bot token, lowest-priority credential source.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Attach caller params to alerts as custom fields.
    #[serde(default)]
    pub params: bool,
}

impl AlertConfig {
    /// Loads and validates a config document from disk. No network I/O.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_str(&contents)?;
        debug!(path = %path.display(), channels = config.channels.len(), "Loaded alert config");
        Ok(config)
    }

    /// Parses a config document from a string and validates it.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AlertConfig = serde_yml::from_str(contents)?;
        if config.channels.is_empty() {
            return Err(ConfigError::MissingChannels);
        }
        Ok(config)
    }

    /// Resolves the bot token, in priority order: an explicit caller-supplied
    /// token, then the document's Secrets Manager reference, then the
    /// document's literal `bot_token`. Empty strings count as absent.
    ///
    /// The secret reference deliberately outranks the literal token so a
    /// stale `bot_token` left in a document cannot shadow the managed
    /// credential.
    pub async fn resolve_token(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        if let Some(token) = non_empty(explicit) {
            return Ok(token.to_string());
        }

        if let Some(secret_name) = non_empty(self.aws_sm_secret.as_deref()) {
            let region = non_empty(self.aws_region.as_deref())
                .ok_or(ConfigError::MissingRegion)?;
            return secrets::fetch_bot_token(secret_name, region).await;
        }

        match non_empty(self.bot_token.as_deref()) {
            Some(token) => Ok(token.to_string()),
            None => Err(ConfigError::MissingCredential),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOC: &str = "\
channels:
  ops: C123
  oncall: C456
service: billing
cloudwatch: https://logs.example.com/
bot_token: xoxb-literal
params: true
";

    #[test]
    fn parses_a_full_document() {
        let config = AlertConfig::from_str(FULL_DOC).unwrap();
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.service.as_deref(), Some("billing"));
        assert_eq!(config.cloudwatch.as_deref(), Some("https://logs.example.com/"));
        assert_eq!(config.bot_token.as_deref(), Some("xoxb-literal"));
        assert!(config.params);
    }

    #[test]
    fn default_channel_is_first_in_document_order() {
        let config = AlertConfig::from_str("channels:\n  ops: C123\n").unwrap();
        assert_eq!(config.channels.resolve(None).unwrap(), "C123");

        let config = AlertConfig::from_str(FULL_DOC).unwrap();
        assert_eq!(config.channels.resolve(None).unwrap(), "C123");
        assert_eq!(config.channels.resolve(Some("oncall")).unwrap(), "C456");
    }

    #[test]
    fn unknown_channel_name_fails() {
        let config = AlertConfig::from_str(FULL_DOC).unwrap();
        let err = config.channels.resolve(Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownChannel(name) if name == "nope"));
    }

    #[test]
    fn missing_channels_is_a_config_error() {
        let err = AlertConfig::from_str("service: billing\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingChannels));
    }

    #[test]
    fn empty_channels_is_a_config_error() {
        let err = AlertConfig::from_str("channels: {}\nservice: billing\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingChannels));
    }

    #[test]
    fn duplicate_channel_names_fail_at_parse_time() {
        let err =
            AlertConfig::from_str("channels:\n  ops: C123\n  ops: C456\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn explicit_token_outranks_the_document() {
        let config = AlertConfig::from_str(FULL_DOC).unwrap();
        let token = config.resolve_token(Some("xoxb-explicit")).await.unwrap();
        assert_eq!(token, "xoxb-explicit");
    }

    #[tokio::test]
    async fn literal_token_is_the_fallback() {
        let config = AlertConfig::from_str(FULL_DOC).unwrap();
        let token = config.resolve_token(None).await.unwrap();
        assert_eq!(token, "xoxb-literal");
    }

    #[tokio::test]
    async fn secret_reference_outranks_the_literal_token() {
        // The secret path is consulted before the literal token: with a
        // secret name but no region, resolution fails on the secret path
        // instead of falling back to bot_token.
        let doc = "\
channels:
  ops: C123
aws_sm_secret: alertbot/slack
bot_token: xoxb-literal
";
        let config = AlertConfig::from_str(doc).unwrap();
        let err = config.resolve_token(None).await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingRegion));
    }

    #[tokio::test]
    async fn no_credential_source_fails() {
        let config = AlertConfig::from_str("channels:\n  ops: C123\n").unwrap();
        let err = config.resolve_token(None).await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));

        // An empty explicit token counts as absent.
        let err = config.resolve_token(Some("")).await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));
    }
}
