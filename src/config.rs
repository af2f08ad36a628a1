use std::net::SocketAddr;

use thiserror::Error;
use tracing::Level;
use url::Url;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),
    #[error("{name} can't be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub teloxide_token: String,
    /// Without a database the bot keeps everything in memory.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: Level,
    pub webhook: Option<(Url, SocketAddr)>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let teloxide_token = lookup("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => parse("DATABASE_MAX_CONNECTIONS", &value)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => parse("LOG_LEVEL", &value)?,
            None => Level::INFO,
        };

        let webhook = match (lookup("NGROK_URL"), lookup("NGROK_ADDR")) {
            (Some(url), Some(addr)) => Some((parse("NGROK_URL", &url)?, parse("NGROK_ADDR", &addr)?)),
            (Some(_), None) => return Err(ConfigError::Missing("NGROK_ADDR")),
            (None, Some(_)) => return Err(ConfigError::Missing("NGROK_URL")),
            (None, None) => None,
        };

        Ok(Self {
            teloxide_token,
            database_url,
            max_connections,
            log_level,
            webhook,
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn token_is_required() {
        assert_eq!(
            config(&[]).unwrap_err(),
            ConfigError::Missing("TELOXIDE_TOKEN")
        );
    }

    #[test]
    fn defaults_to_memory_store_and_polling() {
        let config = config(&[("TELOXIDE_TOKEN", "token")]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.webhook.is_none());
    }

    #[test]
    fn reads_database_and_webhook() {
        let config = config(&[
            ("TELOXIDE_TOKEN", "token"),
            ("DATABASE_URL", "postgres://localhost/englishcard"),
            ("LOG_LEVEL", "debug"),
            ("NGROK_URL", "https://example.ngrok.app"),
            ("NGROK_ADDR", "127.0.0.1:8443"),
        ])
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/englishcard")
        );
        assert_eq!(config.log_level, Level::DEBUG);
        let (url, addr) = config.webhook.unwrap();
        assert_eq!(url.as_str(), "https://example.ngrok.app/");
        assert_eq!(addr.port(), 8443);
    }

    #[test]
    fn webhook_needs_both_halves() {
        assert_eq!(
            config(&[("TELOXIDE_TOKEN", "token"), ("NGROK_URL", "https://example.ngrok.app")])
                .unwrap_err(),
            ConfigError::Missing("NGROK_ADDR")
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "token"), ("LOG_LEVEL", "loud")]),
            Err(ConfigError::Invalid { name: "LOG_LEVEL", .. })
        ));
        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "token"), ("NGROK_URL", "x"), ("NGROK_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
