use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taptravel_shared::{Gender, Seat};

/// A seat picked in the current session, with the rider gender assigned to it
/// so far. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSeat {
    pub seat: Seat,
    pub gender: Option<Gender>,
}

impl SelectedSeat {
    pub fn new(seat: Seat) -> Self {
        Self { seat, gender: None }
    }

    pub fn seat_number(&self) -> &str {
        &self.seat.seat_number
    }
}

/// Payment lifecycle:
/// `Idle → Initializing → Ready → Presenting → {Succeeded, Failed, Cancelled}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Idle,
    Initializing,
    Ready,
    Presenting,
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

impl PaymentState {
    /// Whether a fresh intent may be requested from this state.
    pub fn can_initialize(&self) -> bool {
        matches!(
            self,
            PaymentState::Idle | PaymentState::Failed { .. } | PaymentState::Cancelled
        )
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Idle => write!(f, "IDLE"),
            PaymentState::Initializing => write!(f, "INITIALIZING"),
            PaymentState::Ready => write!(f, "READY"),
            PaymentState::Presenting => write!(f, "PRESENTING"),
            PaymentState::Succeeded => write!(f, "SUCCEEDED"),
            PaymentState::Failed { .. } => write!(f, "FAILED"),
            PaymentState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Proof that the provider confirmed a payment. Only the orchestrator creates
/// one, so ticket issuance cannot start without a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    intent_id: String,
    amount: i64,
    trip_id: String,
    rider_id: String,
    paid_at: DateTime<Utc>,
}

impl PaymentReceipt {
    pub(crate) fn new(intent_id: String, amount: i64, trip_id: String, rider_id: String) -> Self {
        Self {
            intent_id,
            amount,
            trip_id,
            rider_id,
            paid_at: Utc::now(),
        }
    }

    pub fn intent_id(&self) -> &str {
        &self.intent_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn rider_id(&self) -> &str {
        &self.rider_id
    }

    pub fn paid_at(&self) -> DateTime<Utc> {
        self.paid_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded(PaymentReceipt),
    /// Provider-reported failure; the message is meant for the rider.
    Failed { reason: String },
    /// Sheet dismissed without paying.
    Cancelled,
}

/// Result of a completed seat commit and ticket generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedBooking {
    pub trip_id: String,
    pub rider_id: String,
    pub intent_id: String,
    pub seat_numbers: Vec<String>,
    pub amount: i64,
    pub commit: serde_json::Value,
    pub tickets: serde_json::Value,
}
