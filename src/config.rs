//! Environment-driven server configuration.
//!
//! Every setting has a default. A missing variable is logged and the default
//! is used; a variable that is present but unparseable is an error.

use std::fmt::Display;
use std::str::FromStr;

use tracing::info;

/// Where the server runs, which decides how the database is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployTarget {
    /// Open the database at startup and fail fast.
    Local,
    /// Attach the database on first use and keep it for the process lifetime.
    Platform,
}

impl FromStr for DeployTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(DeployTarget::Local),
            "platform" => Ok(DeployTarget::Platform),
            other => Err(format!("unknown deploy target '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub deploy_target: DeployTarget,
    /// Number of reviews served by `/featured-reviews`.
    pub featured_limit: usize,
    /// Maximum accepted JSON body size in bytes.
    pub json_limit: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            database_path: "local_food_db.sqlite3".into(),
            deploy_target: DeployTarget::Local,
            featured_limit: 6,
            json_limit: 256 * 1024,
            log_level: "info".into(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            host: try_load(&lookup, "HOST", defaults.host)?,
            port: try_load(&lookup, "PORT", defaults.port)?,
            database_path: try_load(&lookup, "DATABASE_PATH", defaults.database_path)?,
            deploy_target: try_load(&lookup, "DEPLOY_TARGET", defaults.deploy_target)?,
            featured_limit: try_load(&lookup, "FEATURED_LIMIT", defaults.featured_limit)?,
            json_limit: try_load(&lookup, "JSON_LIMIT", defaults.json_limit)?,
            log_level: try_load(&lookup, "LOG_LEVEL", defaults.log_level)?,
            log_format: try_load(&lookup, "LOG_FORMAT", defaults.log_format)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError {
            key,
            message: e.to_string(),
        }),
        None => {
            // Logging may not be initialized yet; the subscriber drops these then.
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.deploy_target, DeployTarget::Local);
        assert_eq!(config.featured_limit, 6);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DEPLOY_TARGET", "Platform"),
            ("DATABASE_PATH", ":memory:"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.deploy_target, DeployTarget::Platform);
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert_eq!(err.key, "PORT");

        let err = Config::from_lookup(lookup_from(&[("DEPLOY_TARGET", "cloud")])).unwrap_err();
        assert!(err.to_string().contains("unknown deploy target"));
    }
}
