//! Alertbot - best-effort error alerting to Slack
//!
//! This library posts formatted error reports to a Slack channel so humans
//! are notified when a service fails. It is fire-and-forget: configuration
//! mistakes fail loudly at setup, while delivery failures are logged and
//! contained so the alerting path can never crash the instrumented
//! application.

pub mod config;
pub mod core;
pub mod dispatch;
pub mod errors;
pub mod formatting;
pub mod notification;
pub mod secrets;
pub mod trigger;

// Re-export the main entry points for convenience
pub use config::{AlertConfig, ChannelMap};
pub use core::{AlertContext, ErrorReport};
pub use dispatch::Dispatcher;
pub use errors::ConfigError;
pub use notification::{ChatClient, ClientRegistry, Provider};
pub use trigger::{AlertGuard, AlertGuardBuilder};
