//! Configuration management for embedded frames.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::FrameError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const LOAD_TIMEOUT_MS: &str = "UNIT_FRAME_LOAD_TIMEOUT_MS";
const INITIAL_HEIGHT: &str = "UNIT_FRAME_INITIAL_HEIGHT";
const SHUTDOWN_TIMEOUT_MS: &str = "UNIT_FRAME_SHUTDOWN_TIMEOUT_MS";

/// Frame configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Mark a mount as errored if it has not loaded after this many
    /// milliseconds (default: no timeout)
    pub load_timeout_ms: Option<u64>,
    /// Frame height before the embedded document reports one (default: 0)
    pub initial_height: u32,
    /// Grace period for a retired instance's effects (default: 1000)
    pub shutdown_timeout_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: None,
            initial_height: 0,
            shutdown_timeout_ms: 1000,
        }
    }
}

impl FrameConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            load_timeout_ms: env::var(LOAD_TIMEOUT_MS).ok().and_then(|s| s.parse().ok()),
            initial_height: env::var(INITIAL_HEIGHT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.initial_height),
            shutdown_timeout_ms: env::var(SHUTDOWN_TIMEOUT_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.shutdown_timeout_ms),
        }
    }

    /// Load configuration from environment variables, rejecting bad values.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidConfig`] when a variable is set but does
    /// not parse.
    pub fn try_from_env() -> Result<Self, FrameError> {
        Self::try_from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidConfig`] when a key is present but does
    /// not parse.
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FrameError> {
        let defaults = Self::default();
        Ok(Self {
            load_timeout_ms: parse(&lookup, LOAD_TIMEOUT_MS)?,
            initial_height: parse(&lookup, INITIAL_HEIGHT)?.unwrap_or(defaults.initial_height),
            shutdown_timeout_ms: parse(&lookup, SHUTDOWN_TIMEOUT_MS)?
                .unwrap_or(defaults.shutdown_timeout_ms),
        })
    }

    /// Load timeout, if one is configured.
    #[must_use]
    pub const fn load_timeout(&self) -> Option<Duration> {
        match self.load_timeout_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }

    /// Grace period for retiring an instance.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, FrameError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FrameError::InvalidConfig { key, value }),
    }
}
