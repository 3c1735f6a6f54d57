//! Configuration
//!
//! Settings read from the environment at startup. Command-line flags override them
//! per invocation.

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::core::constants::DEFAULT_REST_SECONDS;

pub const USER_VAR: &str = "LIFT_USER";
pub const STORE_PATH_VAR: &str = "LIFT_STORE_PATH";
pub const DEFAULT_REST_VAR: &str = "LIFT_DEFAULT_REST";

const DEFAULT_USER: &str = "local";
const DEFAULT_STORE_PATH: &str = "lift-data.json";

/// Runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// User id history and records are stored under.
    pub user_id: String,
    /// JSON file of the document store.
    pub store_path: PathBuf,
    /// Rest seconds used when no exercise is given.
    pub default_rest: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            default_rest: DEFAULT_REST_SECONDS,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Unset or empty variables fall back to the defaults; a malformed rest time is
    /// an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let default_rest = match get(DEFAULT_REST_VAR) {
            Some(raw) => raw.trim().parse().with_context(|| {
                format!("{} must be a number of seconds, got {:?}", DEFAULT_REST_VAR, raw)
            })?,
            None => defaults.default_rest,
        };
        let config = Self {
            user_id: get(USER_VAR).unwrap_or(defaults.user_id),
            store_path: get(STORE_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            default_rest,
        };
        debug!("configuration: {:?}", config);
        Ok(config)
    }
}
