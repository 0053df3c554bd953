//! Turns a ShipEngine tracking payload into the sentence the assistant speaks.
//!
//! Rendering happens in two steps: [`classify`] picks the template from the
//! status code, then [`UtteranceFormatter::render`] fills it in. Only the most
//! recent event (`events[0]`) is ever looked at.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use thiserror::Error;

use crate::models::{TrackingEvent, TrackingPayload};

pub const EXCEPTION_APOLOGY: &str =
    "Sorry, an exception occured while trying to gather tracking information. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("malformed tracking payload: {0}")]
    MalformedPayload(String),
    #[error("unsupported tracking status code {0:?}")]
    UnsupportedStatus(String),
}

/// ShipEngine status codes the formatter knows how to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Accepted,
    InTransit,
    Delivered,
    Exception,
    Unknown,
}

impl StatusCode {
    pub fn from_code(code: &str) -> Result<Self, FormatError> {
        match code.trim() {
            "AC" | "ACCEPTED" => Ok(StatusCode::Accepted),
            "IT" | "IN_TRANSIT" => Ok(StatusCode::InTransit),
            "DE" | "DELIVERED" => Ok(StatusCode::Delivered),
            "EX" | "EXCEPTION" => Ok(StatusCode::Exception),
            "UN" | "UNKNOWN" => Ok(StatusCode::Unknown),
            other => Err(FormatError::UnsupportedStatus(other.to_string())),
        }
    }

    /// Verb phrase for statuses rendered from an event.
    fn action(self) -> Option<&'static str> {
        match self {
            StatusCode::Accepted => Some("has been accepted"),
            StatusCode::InTransit => Some("is in transit"),
            StatusCode::Delivered => Some("was delivered"),
            StatusCode::Exception | StatusCode::Unknown => None,
        }
    }
}

/// Which sentence template a payload maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'a> {
    Exception,
    Unknown { description: &'a str },
    Normal { action: &'static str, event: &'a TrackingEvent },
}

/// First match wins: exception, then unknown, then the event template.
pub fn classify(payload: &TrackingPayload) -> Result<Classification<'_>, FormatError> {
    let status = StatusCode::from_code(&payload.status_code)?;

    match status {
        StatusCode::Exception => Ok(Classification::Exception),
        StatusCode::Unknown => Ok(Classification::Unknown {
            description: payload.carrier_status_description.as_deref().unwrap_or_default(),
        }),
        _ => {
            let action = status
                .action()
                .ok_or_else(|| FormatError::UnsupportedStatus(payload.status_code.clone()))?;
            let event = payload.events.first().ok_or_else(|| {
                FormatError::MalformedPayload(format!(
                    "status {} has no tracking events",
                    payload.status_code
                ))
            })?;
            Ok(Classification::Normal { action, event })
        }
    }
}

/// Renders payloads with event times shown in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct UtteranceFormatter {
    display_offset: FixedOffset,
}

impl UtteranceFormatter {
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    pub fn render(&self, carrier: &str, payload: &TrackingPayload) -> Result<String, FormatError> {
        match classify(payload)? {
            Classification::Exception => Ok(EXCEPTION_APOLOGY.to_string()),
            Classification::Unknown { description } => Ok(format!(
                "Sorry, we weren't able to gather tracking information for your package. {carrier} says {description}."
            )),
            Classification::Normal { action, event } => {
                let occurred_at = self.local_time(&event.occurred_at)?;
                Ok(format!(
                    "As of {} at {}, {carrier} said your package {action} in {}",
                    date_phrase(&occurred_at),
                    time_phrase(occurred_at.hour(), occurred_at.minute()),
                    location_phrase(event),
                ))
            }
        }
    }

    /// Timestamps without an offset are taken as wall-clock time in the display offset.
    fn local_time(&self, occurred_at: &str) -> Result<DateTime<FixedOffset>, FormatError> {
        let occurred_at = occurred_at.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(occurred_at) {
            return Ok(instant.with_timezone(&self.display_offset));
        }

        NaiveDateTime::parse_from_str(occurred_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(|naive| self.display_offset.from_local_datetime(&naive).single())
            .ok_or_else(|| {
                FormatError::MalformedPayload(format!("unparseable occurred_at {occurred_at:?}"))
            })
    }
}

/// "Tuesday, March 5"
fn date_phrase(at: &DateTime<FixedOffset>) -> String {
    format!("{}, {} {}", at.format("%A"), at.format("%B"), at.day())
}

// Deployed replies shift the hour forward by one and leave the minute unpadded.
fn time_phrase(hour24: u32, minute: u32) -> String {
    let meridiem = if hour24 < 12 { "am" } else { "pm" };
    format!("{}:{} {}", (hour24 + 1) % 12, minute, meridiem)
}

fn location_phrase(event: &TrackingEvent) -> String {
    format!(
        "{}, {}, {}",
        event.city_locality.as_deref().unwrap_or_default(),
        event.state_province.as_deref().unwrap_or_default(),
        event.postal_code.as_deref().unwrap_or_default(),
    )
}
