use std::{str::FromStr, time::Duration};

use crate::error::SyncError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Env {
    #[default]
    Dev,
    Staging,
    Production,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not get the environment variable `{0}` due to unicode error")]
    NotUnicode(String),

    #[error("Environment variable `{key}` has an invalid value `{value}`")]
    Invalid { key: String, value: String },
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub env: Env,
    /// Upper bound for every transport call. An elapsed timeout counts as a
    /// transient network failure.
    pub request_timeout: Duration,
    pub notification_capacity: usize,
    pub content_limits: ContentLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            env: Env::Dev,
            request_timeout: Duration::from_secs(10),
            notification_capacity: 256,
            content_limits: ContentLimits::default(),
        }
    }
}

/// Length limits for comment content, counted in characters after trimming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentLimits {
    pub min: usize,
    pub max: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        ContentLimits { min: 1, max: 5000 }
    }
}

impl ContentLimits {
    /// Returns the trimmed content if it fits the limits.
    pub fn validate(&self, content: &str) -> Result<String, SyncError> {
        let content = content.trim();
        let len = content.chars().count();

        if len == 0 {
            return Err("No content provided".into());
        }

        if len < self.min {
            return Err(SyncError::Validation(format!(
                "Content too short (min {} characters)",
                self.min
            )));
        }

        if len > self.max {
            return Err(SyncError::Validation(format!(
                "Content too long (max {} characters)",
                self.max
            )));
        }

        Ok(content.to_string())
    }
}

fn var(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(env) => Ok(Some(env)),
        Err(e) => match e {
            std::env::VarError::NotPresent => Ok(None),
            std::env::VarError::NotUnicode(_) => Err(ConfigError::NotUnicode(key.to_string())),
        },
    }
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match var(key)? {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        None => {
            tracing::debug!("Environment variable `{key}` not set, using default");
            Ok(default)
        }
    }
}

impl EngineConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let defaults = EngineConfig::default();

        let env = match var("ENVIRONMENT")? {
            Some(env) => match env.as_str() {
                "dev" => Env::Dev,
                "staging" => Env::Staging,
                "production" => Env::Production,
                other => {
                    tracing::warn!("Unknown environment `{other}`, defaulting to dev");
                    Env::Dev
                }
            },
            None => Env::Dev,
        };

        let request_timeout = Duration::from_secs(parsed_var(
            "DISCUSSION_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?);

        let notification_capacity = parsed_var(
            "DISCUSSION_NOTIFICATION_CAPACITY",
            defaults.notification_capacity,
        )?;
        if notification_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "DISCUSSION_NOTIFICATION_CAPACITY".into(),
                value: "0".into(),
            });
        }

        let content_limits = ContentLimits {
            min: parsed_var("DISCUSSION_MIN_CONTENT_LENGTH", defaults.content_limits.min)?,
            max: parsed_var("DISCUSSION_MAX_CONTENT_LENGTH", defaults.content_limits.max)?,
        };
        if content_limits.min > content_limits.max {
            return Err(ConfigError::Invalid {
                key: "DISCUSSION_MIN_CONTENT_LENGTH".into(),
                value: content_limits.min.to_string(),
            });
        }

        Ok(EngineConfig {
            env,
            request_timeout,
            notification_capacity,
            content_limits,
        })
    }
}
