pub mod backend;
pub mod identity;
pub mod payment;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{BookingBackend, IntentRequest, IntentSecrets, SeatStatus, SeatStatusUpdate, TicketBatch, TicketRequest};
pub use identity::{rider_from_token, IdentityError};
pub use payment::{PaymentError, PaymentGateway, PaymentIntent, PaymentSheet, SheetError, SheetErrorCode, SheetGateway, SheetSetup};

use taptravel_catalog::SeatMapError;
use taptravel_shared::BackendError;

/// Error taxonomy surfaced to the booking front end.
///
/// Validation errors are local and recoverable. Network errors are transient
/// and may be retried by repeating the same step. Payment errors keep the
/// session for another attempt. Reconciliation errors are terminal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error(transparent)]
    PaymentError(#[from] PaymentError),
    #[error(transparent)]
    ReconciliationError(#[from] ReconciliationError),
    #[error(transparent)]
    IdentityError(#[from] IdentityError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    Payment,
    Reconciliation,
    Identity,
}

impl CoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::ValidationError(_) => ErrorCategory::Validation,
            CoreError::NetworkError(_) | CoreError::NotFoundError(_) => ErrorCategory::Network,
            CoreError::PaymentError(_) => ErrorCategory::Payment,
            CoreError::ReconciliationError(_) => ErrorCategory::Reconciliation,
            CoreError::IdentityError(_) => ErrorCategory::Identity,
        }
    }

    /// Whether repeating the failed step is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::NetworkError(_) | CoreError::PaymentError(_)
        )
    }
}

impl From<BackendError> for CoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => CoreError::NotFoundError(what),
            other => CoreError::NetworkError(other.to_string()),
        }
    }
}

impl From<SeatMapError> for CoreError {
    fn from(err: SeatMapError) -> Self {
        match err {
            SeatMapError::Backend(inner) => inner.into(),
            other => CoreError::ValidationError(other.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Payment succeeded but a follow-up call failed. Never retried automatically:
/// the backend may have applied part of the call, and repeating it risks a
/// double booking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconciliationError {
    #[error("Payment {intent_id} succeeded but seats not reserved on trip {trip_id}: {cause}")]
    SeatsNotReserved {
        trip_id: String,
        intent_id: String,
        seat_numbers: Vec<String>,
        cause: String,
    },

    #[error("Seats reserved on trip {trip_id} but ticket pending for payment {intent_id}: {cause}")]
    TicketPending {
        trip_id: String,
        intent_id: String,
        seat_numbers: Vec<String>,
        cause: String,
    },
}

impl ReconciliationError {
    pub fn seats_reserved(&self) -> bool {
        matches!(self, ReconciliationError::TicketPending { .. })
    }

    pub fn intent_id(&self) -> &str {
        match self {
            ReconciliationError::SeatsNotReserved { intent_id, .. }
            | ReconciliationError::TicketPending { intent_id, .. } => intent_id,
        }
    }

    pub fn seat_numbers(&self) -> &[String] {
        match self {
            ReconciliationError::SeatsNotReserved { seat_numbers, .. }
            | ReconciliationError::TicketPending { seat_numbers, .. } => seat_numbers,
        }
    }
}
