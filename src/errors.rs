//! Error types for configuration and setup failures.
//!
//! Only setup-time mistakes surface as errors: a missing channel map, an
//! unresolvable credential, bad trigger arguments. Runtime delivery failures
//! are deliberately not represented here; the dispatcher logs and contains
//! them (see `dispatch`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config document declares no channel information")]
    MissingChannels,

    #[error("no bot token could be resolved; pass a token or set bot_token or aws_sm_secret")]
    MissingCredential,

    #[error("unknown channel name: {0}")]
    UnknownChannel(String),

    #[error("unknown chat provider: {0}")]
    UnknownProvider(String),

    #[error("either a config path or both a token and a channel id must be supplied")]
    MissingTriggerArgs,

    #[error("aws_sm_secret is set but aws_region is missing")]
    MissingRegion,

    #[error("failed to fetch bot token from the secret store: {0}")]
    Secrets(String),

    #[error("failed to parse config document: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("failed to read config document: {0}")]
    Io(#[from] std::io::Error),
}
