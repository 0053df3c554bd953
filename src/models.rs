use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ShipEngine tracking response (partial, only fields we need)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingPayload {
    pub tracking_number: Option<String>,
    pub status_code: String,                        // e.g., "AC", "IT", "DE", "EX", "UN"
    pub status_description: Option<String>,
    pub carrier_status_description: Option<String>, // Set by the carrier, spoken for "UN"
    pub estimated_delivery_date: Option<String>,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,                 // Most recent first
}

/// A single scan reported by the carrier
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackingEvent {
    pub occurred_at: String,
    pub carrier_occurred_at: Option<String>,
    pub description: Option<String>,
    pub city_locality: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
    pub event_code: Option<String>,
}

/// Dialogflow fulfillment request (partial, only fields we need)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub response_id: Option<String>,
    pub session: Option<String>,
    #[serde(default)]
    pub query_result: QueryResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query_text: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

impl QueryResult {
    /// String value of an intent parameter; blank values count as missing.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Dialogflow fulfillment response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_text: String,
    pub payload: ResponsePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePayload {
    pub google: GooglePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayload {
    pub expect_user_response: bool,
}

impl WebhookResponse {
    /// Speaks `text` and closes the conversation.
    pub fn tell(text: impl Into<String>) -> Self {
        Self {
            fulfillment_text: text.into(),
            payload: ResponsePayload {
                google: GooglePayload {
                    expect_user_response: false,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shipengine_response_deserializes_with_nulls() {
        let payload: TrackingPayload = serde_json::from_value(json!({
            "tracking_number": "9405511899223197428490",
            "status_code": "IT",
            "status_description": "In Transit",
            "carrier_status_description": null,
            "estimated_delivery_date": null,
            "events": [{
                "occurred_at": "2024-03-05T15:05:00Z",
                "description": "Arrived at USPS Facility",
                "city_locality": "AUSTIN",
                "state_province": "TX",
                "postal_code": null,
                "country_code": "US"
            }]
        }))
        .unwrap();

        assert_eq!(payload.status_code, "IT");
        assert_eq!(payload.events.len(), 1);
        assert_eq!(payload.events[0].city_locality.as_deref(), Some("AUSTIN"));
        assert!(payload.events[0].postal_code.is_none());
    }

    #[test]
    fn missing_events_default_to_empty() {
        let payload: TrackingPayload =
            serde_json::from_value(json!({ "status_code": "EX" })).unwrap();
        assert!(payload.events.is_empty());
    }

    #[test]
    fn webhook_arguments_ignore_blank_and_non_string_values() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "queryResult": {
                "action": "track_package",
                "parameters": { "carrier": "UPS", "number": "  ", "count": 3 }
            }
        }))
        .unwrap();

        let query = &request.query_result;
        assert_eq!(query.argument("carrier"), Some("UPS"));
        assert_eq!(query.argument("number"), None);
        assert_eq!(query.argument("count"), None);
        assert_eq!(query.argument("missing"), None);
    }

    #[test]
    fn tell_closes_the_conversation() {
        let body = serde_json::to_value(WebhookResponse::tell("Bye")).unwrap();
        assert_eq!(
            body,
            json!({
                "fulfillmentText": "Bye",
                "payload": { "google": { "expectUserResponse": false } }
            })
        );
    }
}
