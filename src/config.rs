use anyhow::{Context, Result, bail};
use chrono::{FixedOffset, Offset, Utc};
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub shipengine_api_key: String,
    pub shipengine_url: String,
    pub bind_addr: String,
    pub display_offset: FixedOffset,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `SHIPENGINE_API_KEY`: Required - Your ShipEngine API key
    /// - `SHIPENGINE_URL`: Optional - ShipEngine base URL (default: "https://api.shipengine.com")
    /// - `BIND_ADDR`: Optional - Webhook listen address (default: "0.0.0.0:8080")
    /// - `DISPLAY_UTC_OFFSET`: Optional - Offset used to speak event times, `±HH:MM` (default: "+00:00")
    /// - `REQUEST_TIMEOUT_SECS`: Optional - ShipEngine request timeout (default: 30)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Parse API key (required)
        let shipengine_api_key = lookup("SHIPENGINE_API_KEY")
            .context("SHIPENGINE_API_KEY not set")?;

        if shipengine_api_key.trim().is_empty() {
            bail!("SHIPENGINE_API_KEY cannot be empty");
        }

        let shipengine_url = lookup("SHIPENGINE_URL")
            .unwrap_or_else(|| "https://api.shipengine.com".to_string())
            .trim_end_matches('/')
            .to_string();

        if shipengine_url.trim().is_empty() {
            bail!("SHIPENGINE_URL cannot be empty");
        }

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let display_offset = match lookup("DISPLAY_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw)
                .with_context(|| format!("DISPLAY_UTC_OFFSET is invalid: {raw:?}"))?,
            None => utc(),
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: {raw:?}"))?,
            None => 30,
        };

        if request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            shipengine_api_key,
            shipengine_url,
            bind_addr,
            display_offset,
            request_timeout_secs,
        })
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parses `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => bail!("offset must start with '+' or '-'"),
    };

    let (hours, minutes) = rest
        .split_once(':')
        .context("offset must look like ±HH:MM")?;
    let hours: u32 = hours.parse().context("offset hours are not a number")?;
    let minutes: u32 = minutes.parse().context("offset minutes are not a number")?;

    if hours > 14 || minutes > 59 {
        bail!("offset out of range");
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
        .context("offset out of range")
}
