use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use cowchips_core::constants::{WINNER_NEEDS_LOCATION_TEMPLATE, WINNER_TEMPLATE};
use cowchips_core::notifications::WinnerTemplates;

const DEFAULT_MAIL_SOURCE: &str = "noreply@cowchips4charity.org";

/// Where winner emails go. Without an endpoint, mails are only logged.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub source: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub mail: MailConfig,
    pub templates: WinnerTemplates,
}

impl Config {
    /// Reads `CC_*` variables, loading `.env` first when present.
    ///
    /// Only an unparsable listen address is an error; other bad values fall
    /// back to their defaults with a warning.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = var_or("CC_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid CC_LISTEN_ADDR")?;
        let db_path = var_or("CC_DB_PATH", "./db/cowchips.db");
        let cors_allow = var_or("CC_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = parse_or("CC_REQUEST_TIMEOUT_MS", 30_000);
        let mail = MailConfig {
            endpoint: non_empty_var("CC_MAIL_ENDPOINT"),
            api_key: non_empty_var("CC_MAIL_API_KEY"),
            source: var_or("CC_MAIL_SOURCE", DEFAULT_MAIL_SOURCE),
            timeout: Duration::from_millis(parse_or("CC_MAIL_TIMEOUT_MS", 10_000)),
        };
        let templates = WinnerTemplates {
            ready: var_or("CC_WINNER_TEMPLATE", WINNER_TEMPLATE),
            needs_location: var_or(
                "CC_WINNER_NEEDS_LOCATION_TEMPLATE",
                WINNER_NEEDS_LOCATION_TEMPLATE,
            ),
        };
        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            mail,
            templates,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    non_empty_var(name).unwrap_or_else(|| default.to_string())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match non_empty_var(name) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
    }
}
