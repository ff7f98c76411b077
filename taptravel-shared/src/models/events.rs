use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSucceededEvent {
    pub session_id: Uuid,
    pub trip_id: String,
    pub rider_id: String,
    pub intent_id: String,
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatsCommittedEvent {
    pub session_id: Uuid,
    pub trip_id: String,
    pub seat_numbers: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketsIssuedEvent {
    pub session_id: Uuid,
    pub trip_id: String,
    pub rider_id: String,
    pub seat_numbers: Vec<String>,
    pub timestamp: i64,
}

/// Payment went through but a later step did not; support has to settle it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequiredEvent {
    pub session_id: Uuid,
    pub trip_id: String,
    pub intent_id: String,
    pub seats_reserved: bool,
    pub detail: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    PaymentSucceeded(PaymentSucceededEvent),
    SeatsCommitted(SeatsCommittedEvent),
    TicketsIssued(TicketsIssuedEvent),
    ReconciliationRequired(ReconciliationRequiredEvent),
}

impl BookingEvent {
    pub fn trip_id(&self) -> &str {
        match self {
            BookingEvent::PaymentSucceeded(e) => &e.trip_id,
            BookingEvent::SeatsCommitted(e) => &e.trip_id,
            BookingEvent::TicketsIssued(e) => &e.trip_id,
            BookingEvent::ReconciliationRequired(e) => &e.trip_id,
        }
    }
}
