use crate::formatter::UtteranceFormatter;
use crate::models::{QueryResult, WebhookRequest, WebhookResponse};
use crate::shipment::{ProviderError, TrackingProvider};
use std::sync::Arc;

pub const TRACK_ACTION: &str = "track_package";
pub const CARRIER_ARGUMENT: &str = "carrier";
pub const NUMBER_ARGUMENT: &str = "number";

pub const UNKNOWN_ACTION_REPLY: &str = "Sorry, I can't help with that yet.";
pub const MISSING_ARGUMENTS_REPLY: &str =
    "Sorry, I need both a carrier and a tracking number to look up your package.";
pub const UNREADABLE_PAYLOAD_REPLY: &str =
    "Sorry, I had trouble reading the tracking information for your package. Please try again later.";

/// Routes webhook intents to their handlers and always answers with something to say.
pub struct IntentDispatcher {
    provider: Arc<dyn TrackingProvider>,
    formatter: UtteranceFormatter,
}

impl IntentDispatcher {
    pub fn new(provider: Arc<dyn TrackingProvider>, formatter: UtteranceFormatter) -> Self {
        Self { provider, formatter }
    }

    pub async fn dispatch(&self, request: &WebhookRequest) -> WebhookResponse {
        let query = &request.query_result;

        let reply = match query.action.as_str() {
            TRACK_ACTION => self.track_package(query).await,
            other => {
                tracing::warn!(action = other, "No handler for webhook action");
                UNKNOWN_ACTION_REPLY.to_string()
            }
        };

        WebhookResponse::tell(reply)
    }

    async fn track_package(&self, query: &QueryResult) -> String {
        let (Some(original_carrier), Some(spoken_number)) =
            (query.argument(CARRIER_ARGUMENT), query.argument(NUMBER_ARGUMENT))
        else {
            tracing::info!("track_package called without carrier or number");
            return MISSING_ARGUMENTS_REPLY.to_string();
        };

        let Some(carrier_code) = self.provider.carrier_code(original_carrier) else {
            tracing::info!(carrier = original_carrier, "Unsupported carrier");
            return format!(
                "Sorry, but we do not currently provide tracking information for {original_carrier}"
            );
        };

        let tracking_number = join_spoken_number(spoken_number);

        tracing::info!(
            carrier = original_carrier,
            carrier_code = %carrier_code,
            tracking_number = %tracking_number,
            "Tracking package"
        );

        let payload = match self.provider.track(&carrier_code, &tracking_number).await {
            Ok(payload) => payload,
            Err(ProviderError::NotFound(_)) => {
                tracing::info!(tracking_number = %tracking_number, "Tracking number not found");
                return format!(
                    "Sorry, {original_carrier} doesn't have any tracking information for that number yet."
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Tracking provider request failed");
                return format!(
                    "Sorry, I couldn't reach {original_carrier} right now. Please try again later."
                );
            }
        };

        tracing::info!(status_code = %payload.status_code, events = payload.events.len(), "Tracking status");

        // Original carrier string keeps the pronunciation the user used
        match self.formatter.render(original_carrier, &payload) {
            Ok(statement) => statement,
            Err(e) => {
                tracing::warn!(error = %e, "Could not render tracking status");
                UNREADABLE_PAYLOAD_REPLY.to_string()
            }
        }
    }
}

/// Speech recognition splits long numbers into groups; ShipEngine wants them joined.
pub fn join_spoken_number(number: &str) -> String {
    number.split_whitespace().collect()
}
