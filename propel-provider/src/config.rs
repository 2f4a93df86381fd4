//! Provider configuration
//!
//! Credentials come from the provider block, falling back to the
//! `PROPEL_CLIENT_ID` / `PROPEL_CLIENT_SECRET` environment variables.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use propel_core::diagnostics::Diagnostic;
use propel_core::resource::{AttributesExt, Value};
use propel_core::wait::Waiter;
use thiserror::Error;

pub const CLIENT_ID_ENV: &str = "PROPEL_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "PROPEL_CLIENT_SECRET";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Credentials are required")]
    MissingCredentials,

    #[error("Invalid provider setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },
}

impl From<ConfigError> for Diagnostic {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingCredentials => Diagnostic::error(err.to_string())
                .with_detail("Unable to authenticate for the Propel client"),
            ConfigError::InvalidSetting { .. } => Diagnostic::error(err.to_string()),
        }
    }
}

/// Schedule used while waiting on provisioning and deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait before the first status read
    pub delay: Duration,
    pub interval: Duration,
    pub min_interval: Duration,
    /// Consecutive target observations required
    pub stability: usize,
    /// Subtracted from the operation timeout to get the poll deadline
    pub safety_margin: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            interval: Duration::from_secs(10),
            min_interval: Duration::from_secs(5),
            stability: 3,
            safety_margin: Duration::from_secs(60),
        }
    }
}

impl PollSettings {
    /// Waiter whose deadline is `timeout` minus the safety margin
    pub fn waiter(&self, timeout: Duration) -> Waiter {
        Waiter::new(timeout.saturating_sub(self.safety_margin))
            .with_delay(self.delay)
            .with_interval(self.interval)
            .with_min_interval(self.min_interval)
    }
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub poll: PollSettings,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("poll", &self.poll)
            .finish()
    }
}

impl ProviderConfig {
    /// Build the configuration from the provider block and the process environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::from_attributes_with_env(attributes, |name| std::env::var(name).ok())
    }

    pub fn from_attributes_with_env(
        attributes: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let credential = |key: &str, var: &str| {
            attributes
                .get_str(key)
                .map(str::to_string)
                .or_else(|| env(var))
                .unwrap_or_default()
        };

        let client_id = credential("client_id", CLIENT_ID_ENV);
        let client_secret = credential("client_secret", CLIENT_SECRET_ENV);
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        let mut poll = PollSettings::default();
        if let Some(secs) = positive_int(attributes, "poll_interval_seconds")? {
            poll.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = positive_int(attributes, "poll_delay_seconds")? {
            poll.delay = Duration::from_secs(secs);
        }
        if let Some(count) = positive_int(attributes, "stability_count")? {
            poll.stability = count as usize;
        }

        Ok(Self {
            client_id,
            client_secret,
            poll,
        })
    }
}

fn positive_int(attributes: &HashMap<String, Value>, key: &str) -> Result<Option<u64>, ConfigError> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::Int(n)) if *n > 0 => Ok(Some(*n as u64)),
        Some(other) => Err(ConfigError::InvalidSetting {
            name: key.to_string(),
            reason: format!("expected a positive integer, got {:?}", other),
        }),
    }
}
