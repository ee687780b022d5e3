//! Server settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// A variable held a value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{var} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Where to listen, where to keep data, how often to sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_host: String,
    pub listen_port: u16,
    /// Directory for the JSON store. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Period of the inactivity sweep.
    pub tick_period: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 3000,
            data_dir: None,
            tick_period: Duration::from_millis(1000),
        }
    }
}

impl ServerConfig {
    /// Reads `LISTEN_HOST`, `LISTEN_PORT`, `HEXDECK_DATA_DIR` and
    /// `HEXDECK_TICK_MS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads through `lookup`.
    /// Unset and empty variables fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let listen_port = match get("LISTEN_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError {
                var: "LISTEN_PORT",
                value,
                expected: "a port number",
            })?,
            None => defaults.listen_port,
        };

        let tick_period = match get("HEXDECK_TICK_MS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError {
                        var: "HEXDECK_TICK_MS",
                        value,
                        expected: "a positive number of milliseconds",
                    });
                }
            },
            None => defaults.tick_period,
        };

        Ok(Self {
            listen_host: get("LISTEN_HOST").unwrap_or(defaults.listen_host),
            listen_port,
            data_dir: get("HEXDECK_DATA_DIR").map(PathBuf::from),
            tick_period,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_reads_all_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("LISTEN_HOST", "127.0.0.1"),
            ("LISTEN_PORT", "8080"),
            ("HEXDECK_DATA_DIR", "/var/lib/hexdeck"),
            ("HEXDECK_TICK_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/hexdeck")));
        assert_eq!(config.tick_period, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_value_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[("LISTEN_PORT", " ")])).unwrap();
        assert_eq!(config.listen_port, 3000);
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[("LISTEN_PORT", "eighty")])).unwrap_err();
        assert_eq!(err.var, "LISTEN_PORT");
        assert_eq!(err.to_string(), "LISTEN_PORT must be a port number, got \"eighty\"");
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("HEXDECK_TICK_MS", "0")])).unwrap_err();
        assert_eq!(err.var, "HEXDECK_TICK_MS");
    }
}
