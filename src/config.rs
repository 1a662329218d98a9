//! Server configuration from environment variables.
//!
//! | Variable          | Default     |
//! |-------------------|-------------|
//! | `CARS_HOST`       | `0.0.0.0`   |
//! | `CARS_PORT`       | `9023`      |
//! | `CARS_DB_PATH`    | `cars.json` |
//! | `CARS_PRETTY`     | `false`     |
//! | `CARS_LOG_FORMAT` | `compact`   |
//!
//! A `.env` file in the working directory is honoured by the binary.

use crate::error::{Error, Result};
use crate::logging::LogFormat;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// JSON file holding the collection.
    pub db_path: PathBuf,
    /// Pretty-print the JSON file.
    pub pretty: bool,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9023,
            db_path: PathBuf::from("cars.json"),
            pretty: false,
            log_format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(host) = lookup("CARS_HOST") {
            cfg.host = host;
        }
        if let Some(port) = lookup("CARS_PORT") {
            cfg.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("CARS_PORT must be a port number, got {port:?}")))?;
        }
        if let Some(path) = lookup("CARS_DB_PATH") {
            if path.trim().is_empty() {
                return Err(Error::Config("CARS_DB_PATH is empty".into()));
            }
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(pretty) = lookup("CARS_PRETTY") {
            cfg.pretty = parse_bool(&pretty)
                .ok_or_else(|| Error::Config(format!("CARS_PRETTY must be true/false, got {pretty:?}")))?;
        }
        if let Some(format) = lookup("CARS_LOG_FORMAT") {
            cfg.log_format = format.parse()?;
        }
        Ok(cfg)
    }

    /// Socket address built from `host` and `port`.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| Error::Config(format!("invalid bind address {}:{}", self.host, self.port)))
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_listen_on_9023() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.bind_addr().unwrap().port(), 9023);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup(&[
            ("CARS_HOST", "127.0.0.1"),
            ("CARS_PORT", "8080"),
            ("CARS_DB_PATH", "/tmp/garage.json"),
            ("CARS_PRETTY", "yes"),
            ("CARS_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/garage.json"));
        assert!(cfg.pretty);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Config::from_lookup(lookup(&[("CARS_PORT", "ninety")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_lookup(lookup(&[("CARS_PRETTY", "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_lookup(lookup(&[("CARS_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn hostname_bind_addr_is_rejected() {
        let cfg = Config::from_lookup(lookup(&[("CARS_HOST", "localhost")])).unwrap();
        assert!(cfg.bind_addr().is_err());
    }
}
