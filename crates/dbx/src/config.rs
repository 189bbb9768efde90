//! Data source settings.
//!
//! Settings deserialize from camelCase keys, every field optional:
//!
//! ```
//! use dbx::DataSourceConfig;
//!
//! let config: DataSourceConfig = serde_json::from_str(
//!     r#"{"host":"db.internal","database":"shop","maxIdle":4,"maxOpen":2}"#,
//! ).unwrap();
//! assert_eq!(config.port, 3306);
//! assert_eq!(config.pool_bounds(), (4, 14));
//! ```

use crate::error::{DbxError, DbxResult};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_MAX_IDLE: usize = 10;
const DEFAULT_MAX_OPEN: usize = 20;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub charset: String,
    pub collation: Option<String>,
    /// Connections kept open while idle; `0` means the default.
    pub max_idle: usize,
    /// Upper bound on open connections; raised above `max_idle` if needed.
    pub max_open: usize,
    /// Connection lifetime in seconds; `0` means the default.
    #[serde(alias = "maxLifeTime")]
    pub max_lifetime: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            charset: "utf8mb4".to_string(),
            collation: None,
            max_idle: DEFAULT_MAX_IDLE,
            max_open: DEFAULT_MAX_OPEN,
            max_lifetime: DEFAULT_MAX_LIFETIME_SECS,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl DataSourceConfig {
    /// Read `DBX_HOST`, `DBX_PORT`, `DBX_USERNAME`, `DBX_PASSWORD`,
    /// `DBX_DATABASE` and `DBX_CHARSET`; unset variables keep defaults.
    pub fn from_env() -> DbxResult<Self> {
        let mut config = Self::default();
        if let Some(host) = env_var("DBX_HOST") {
            config.host = host;
        }
        if let Some(port) = env_var("DBX_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| DbxError::config(format!("invalid DBX_PORT: {port}")))?;
        }
        if let Some(username) = env_var("DBX_USERNAME") {
            config.username = username;
        }
        if let Some(password) = env_var("DBX_PASSWORD") {
            config.password = password;
        }
        if let Some(database) = env_var("DBX_DATABASE") {
            config.database = database;
        }
        if let Some(charset) = env_var("DBX_CHARSET") {
            config.charset = charset;
        }
        Ok(config)
    }

    /// `(min idle, max open)` after defaults; max open always exceeds min idle.
    pub fn pool_bounds(&self) -> (usize, usize) {
        let idle = if self.max_idle < 1 { DEFAULT_MAX_IDLE } else { self.max_idle };
        let open = if self.max_open < 1 { DEFAULT_MAX_OPEN } else { self.max_open };
        let open = if open <= idle { idle + 10 } else { open };
        (idle, open)
    }

    pub fn max_lifetime(&self) -> Duration {
        match self.max_lifetime {
            0 => Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Statements run on every new connection to apply charset/collation.
    pub fn init_statements(&self) -> Vec<String> {
        let charset = self.charset.trim();
        if charset.is_empty() {
            return Vec::new();
        }
        let statement = match self.collation.as_deref().map(str::trim) {
            Some(collation) if !collation.is_empty() => {
                format!("SET NAMES {charset} COLLATE {collation}")
            }
            _ => format!("SET NAMES {charset}"),
        };
        vec![statement]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let config: DataSourceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DataSourceConfig::default());
        assert_eq!(config.pool_bounds(), (10, 20));
        assert_eq!(config.max_lifetime(), Duration::from_secs(1800));
        assert_eq!(config.init_statements(), vec!["SET NAMES utf8mb4".to_string()]);
    }

    #[test]
    fn zero_values_fall_back() {
        let config: DataSourceConfig =
            serde_json::from_str(r#"{"maxIdle":0,"maxOpen":0,"maxLifeTime":0}"#).unwrap();
        assert_eq!(config.pool_bounds(), (10, 20));
        assert_eq!(config.max_lifetime(), Duration::from_secs(1800));
    }

    #[test]
    fn collation_joins_charset() {
        let config = DataSourceConfig {
            collation: Some("utf8mb4_general_ci".into()),
            ..Default::default()
        };
        assert_eq!(
            config.init_statements(),
            vec!["SET NAMES utf8mb4 COLLATE utf8mb4_general_ci".to_string()]
        );
    }
}
