//! # System Configuration
//!
//! Settings for an [`ActorSystem`](crate::ActorSystem). Build them in code, or read them
//! from the environment with [`SystemConfig::from_env`]:
//!
//! ```bash
//! ACTOR_SYSTEM_NAME=trading ACTOR_ASK_TIMEOUT_MS=250 cargo run
//! ```

use crate::error::ActorError;
use std::time::Duration;

pub const DEFAULT_SYSTEM_NAME: &str = "default-system";
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_millis(1000);

pub const SYSTEM_NAME_VAR: &str = "ACTOR_SYSTEM_NAME";
pub const ASK_TIMEOUT_VAR: &str = "ACTOR_ASK_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Name of the system, also used as the guardian actor's name.
    pub name: String,
    /// Deadline for [`ActorSystem::ask`](crate::ActorSystem::ask).
    pub ask_timeout: Duration,
}

impl SystemConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ask_timeout(mut self, ask_timeout: Duration) -> Self {
        self.ask_timeout = ask_timeout;
        self
    }

    /// Reads `ACTOR_SYSTEM_NAME` and `ACTOR_ASK_TIMEOUT_MS`, falling back to the defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self, ActorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SystemConfig::from_env`], with variables resolved through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ActorError> {
        let mut config = Self::default();
        if let Some(name) = lookup(SYSTEM_NAME_VAR) {
            if name.trim().is_empty() {
                return Err(ActorError::InvalidConfig(format!(
                    "{SYSTEM_NAME_VAR} must not be empty"
                )));
            }
            config.name = name;
        }
        if let Some(raw) = lookup(ASK_TIMEOUT_VAR) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ActorError::InvalidConfig(format!(
                    "{ASK_TIMEOUT_VAR} must be a number of milliseconds, got `{raw}`"
                ))
            })?;
            if millis == 0 {
                return Err(ActorError::InvalidConfig(format!(
                    "{ASK_TIMEOUT_VAR} must be greater than zero"
                )));
            }
            config.ask_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SYSTEM_NAME.to_string(),
            ask_timeout: DEFAULT_ASK_TIMEOUT,
        }
    }
}
