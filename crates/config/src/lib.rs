//! Configuration loading for the stacks workspace.
//!
//! Values are resolved in layers, later layers overriding earlier ones:
//!
//! 1. Built-in defaults (see the `Default` impls below).
//! 2. An optional `stacks.toml` file.
//! 3. Environment variables prefixed with `STACKS_`, using `__` as the
//!    section separator (`STACKS_POLICY__LOAN_PERIOD_DAYS=21` overrides
//!    `[policy] loan_period_days`).
//!
//! The schema this system was built around leaves its policy figures
//! undetermined (loan period, fine rate, fine cap), so they are exposed
//! here as named values rather than hard-coded at their use sites.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the current directory by [`Config::load`].
pub const CONFIG_FILENAME: &str = "stacks.toml";
/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "STACKS_";

/// Top-level configuration for the circulation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub policy: PolicyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

/// Where the circulation database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. Created on first connect.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        // Fall back to the working directory when the platform gives us
        // no data directory (containers, stripped-down CI images).
        let dir = ProjectDirs::from("", "", "stacks")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_default();
        Self { path: dir.join("circulation.db") }
    }
}

/// Circulation policy constants.
///
/// Monetary values are whole cents to match the decimal(6,2) fine column
/// without dragging floating point into currency arithmetic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Days from checkout to due date.
    pub loan_period_days: u16,
    /// Fine accrued per late day, in cents.
    pub daily_rate_cents: u32,
    /// Ceiling on a single loan's fine, in cents.
    pub fine_cap_cents: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            daily_rate_cents: 25,
            fine_cap_cents: 2500,
        }
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// Reads `stacks.toml` from the working directory if present, then
    /// applies `STACKS_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILENAME)
    }

    /// Load configuration with an explicit file path.
    ///
    /// The file is optional; defaults and environment variables still
    /// apply when it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// Domain constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if self.policy.loan_period_days == 0 {
            exn::bail!(ErrorKind::Invalid("policy.loan_period_days"));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path"));
        }
        Ok(())
    }
}
