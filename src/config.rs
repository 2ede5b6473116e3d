use std::{net::SocketAddr, str::FromStr, time::Duration};

use tracing::Level;
use url::Url;

use crate::error::ConfigError;

pub const TRIVIA_API_URL: &str = "https://the-trivia-api.com/api/questions";
pub const QUOTES_API_URL: &str = "https://zenquotes.io/api/quotes";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Postgres connection string. Without it chats are kept in memory.
    pub database_url: Option<String>,
    /// Public URL Telegram posts updates to. Without it the bot long-polls.
    pub webhook_url: Option<Url>,
    pub bind_addr: Option<SocketAddr>,
    pub log_level: Level,
    pub trivia_url: Url,
    pub quotes_url: Url,
    pub http_timeout: Duration,
    pub broadcast_batch: usize,
    pub broadcast_pause: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("TELOXIDE_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let webhook_url = parse_opt::<Url>(&lookup, "WEBHOOK_URL")?;
        let bind_addr = match parse_opt::<SocketAddr>(&lookup, "BIND_ADDR")? {
            Some(addr) => Some(addr),
            None if webhook_url.is_some() => Some(parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?),
            None => None,
        };

        Ok(Self {
            bot_token,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            webhook_url,
            bind_addr,
            log_level: parse_opt(&lookup, "LOG_LEVEL")?.unwrap_or(Level::INFO),
            trivia_url: parse_or(&lookup, "TRIVIA_API_URL", TRIVIA_API_URL)?,
            quotes_url: parse_or(&lookup, "QUOTES_API_URL", QUOTES_API_URL)?,
            http_timeout: Duration::from_secs(parse_opt(&lookup, "HTTP_TIMEOUT_SECS")?.unwrap_or(10)),
            broadcast_batch: parse_opt(&lookup, "BROADCAST_BATCH")?.unwrap_or(30),
            broadcast_pause: Duration::from_millis(
                parse_opt(&lookup, "BROADCAST_PAUSE_MS")?.unwrap_or(1000),
            ),
        })
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_opt<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => parse_value(name, &raw).map(Some),
        _ => Ok(None),
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match parse_opt(lookup, name)? {
        Some(value) => Ok(value),
        None => parse_value(name, default),
    }
}
