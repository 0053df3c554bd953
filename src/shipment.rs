use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::Config;
use crate::models::TrackingPayload;

/// Spoken carrier names and aliases, keyed by their lowercase alphanumeric form
static CARRIER_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("usps", "stamps_com"),
        ("postalservice", "stamps_com"),
        ("uspostalservice", "stamps_com"),
        ("unitedstatespostalservice", "stamps_com"),
        ("stampscom", "stamps_com"),
        ("ups", "ups"),
        ("unitedparcelservice", "ups"),
        ("fedex", "fedex"),
        ("federalexpress", "fedex"),
        ("dhl", "dhl_express"),
        ("dhlexpress", "dhl_express"),
        ("dhlglobalmail", "dhl_global_mail"),
        ("dhlecommerce", "dhl_global_mail"),
        ("canadapost", "canada_post"),
        ("ontrac", "ontrac"),
        ("lasership", "lasership"),
        ("newgistics", "newgistics"),
        ("firstmile", "firstmile"),
        ("asendia", "asendia"),
        ("apc", "apc"),
    ])
});

/// Maps a carrier name as spoken by the user to a ShipEngine carrier code
pub fn normalize_carrier(carrier: &str) -> Option<&'static str> {
    let key: String = carrier
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();

    CARRIER_CODES.get(key.as_str()).copied()
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to reach tracking provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("tracking provider rejected the API key (status {0})")]
    Unauthorized(StatusCode),
    #[error("tracking provider has no record of {0}")]
    NotFound(String),
    #[error("tracking provider query failed (status {status}): {body}")]
    Api { status: StatusCode, body: String },
    #[error("failed to parse tracking provider response: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Provider code for a spoken carrier name, `None` when unsupported
    fn carrier_code(&self, carrier: &str) -> Option<String> {
        normalize_carrier(carrier).map(str::to_string)
    }

    async fn track(
        &self,
        carrier_code: &str,
        tracking_number: &str,
    ) -> std::result::Result<TrackingPayload, ProviderError>;
}

pub struct ShipEngineClient {
    config: Config,
    http_client: Client,
}

impl ShipEngineClient {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, http_client })
    }
}

#[async_trait::async_trait]
impl TrackingProvider for ShipEngineClient {
    async fn track(
        &self,
        carrier_code: &str,
        tracking_number: &str,
    ) -> std::result::Result<TrackingPayload, ProviderError> {
        let url = format!("{}/v1/tracking", self.config.shipengine_url);

        let response = self.http_client
            .get(&url)
            .query(&[("carrier_code", carrier_code), ("tracking_number", tracking_number)])
            .header("API-Key", &self.config.shipengine_api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Unauthorized(status));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("{carrier_code} {tracking_number}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let body = response.text().await?;
        tracing::debug!(carrier_code, tracking_number, response = %body, "ShipEngine response");

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_names_normalize_to_carrier_codes() {
        assert_eq!(normalize_carrier("USPS"), Some("stamps_com"));
        assert_eq!(normalize_carrier("U.S.P.S."), Some("stamps_com"));
        assert_eq!(normalize_carrier("United States Postal Service"), Some("stamps_com"));
        assert_eq!(normalize_carrier("ups"), Some("ups"));
        assert_eq!(normalize_carrier("Fed Ex"), Some("fedex"));
        assert_eq!(normalize_carrier("DHL Express"), Some("dhl_express"));
        assert_eq!(normalize_carrier(" Canada Post "), Some("canada_post"));
    }

    #[test]
    fn unknown_carriers_are_unsupported() {
        assert_eq!(normalize_carrier("Pony Express"), None);
        assert_eq!(normalize_carrier(""), None);
    }
}
