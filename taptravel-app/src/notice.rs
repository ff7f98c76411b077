use std::fmt;
use taptravel_core::{CoreError, IdentityError, PaymentError, ReconciliationError};

/// Short message shown to the rider for a failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl Notice {
    fn new(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
        }
    }
}

pub fn notice(err: &CoreError) -> Notice {
    match err {
        CoreError::ValidationError(detail) => Notice::new("Check your selection", detail.clone()),
        CoreError::NotFoundError(_) => {
            Notice::new("Not found", "This trip is no longer available.")
        }
        CoreError::NetworkError(_) => Notice::new(
            "Connection problem",
            "Could not reach Tap & Travel. Check your connection and try again.",
        ),
        CoreError::PaymentError(PaymentError::Declined(reason)) => {
            Notice::new("Payment failed", reason.clone())
        }
        CoreError::PaymentError(PaymentError::InitializationFailed(_)) => Notice::new(
            "Payment failed",
            "Payment could not be started. Your seats are still selected; please try again.",
        ),
        CoreError::PaymentError(other) => Notice::new("Payment failed", other.to_string()),
        CoreError::ReconciliationError(rec @ ReconciliationError::SeatsNotReserved { .. }) => {
            Notice::new(
                "Booking incomplete",
                format!(
                    "Your payment went through but your seats could not be reserved. \
                     Please contact support with reference {}.",
                    rec.intent_id()
                ),
            )
        }
        CoreError::ReconciliationError(rec @ ReconciliationError::TicketPending { .. }) => {
            Notice::new(
                "Ticket pending",
                format!(
                    "Your seats are reserved but your ticket could not be issued yet. \
                     Please contact support with reference {}.",
                    rec.intent_id()
                ),
            )
        }
        CoreError::IdentityError(IdentityError::MissingToken) => {
            Notice::new("Sign in required", "Please sign in to book seats.")
        }
        CoreError::IdentityError(_) => Notice::new(
            "Sign in required",
            "Your session is invalid. Please sign in again.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category_reads_differently() {
        let declined = notice(&PaymentError::Declined("Your card was declined.".to_string()).into());
        assert_eq!(declined.title, "Payment failed");
        assert_eq!(declined.message, "Your card was declined.");

        let network = notice(&CoreError::NetworkError("timeout".to_string()));
        assert_eq!(network.title, "Connection problem");
        assert!(!network.message.contains("timeout"));

        let validation = notice(&CoreError::ValidationError("Seat 2: neighbor requires Female".to_string()));
        assert_eq!(validation.to_string(), "Check your selection: Seat 2: neighbor requires Female");
    }

    #[test]
    fn test_reconciliation_names_reference() {
        let err = CoreError::from(ReconciliationError::TicketPending {
            trip_id: "bus-1".to_string(),
            intent_id: "pi_77".to_string(),
            seat_numbers: vec!["R1-1".to_string()],
            cause: "timeout".to_string(),
        });
        let shown = notice(&err);
        assert_eq!(shown.title, "Ticket pending");
        assert!(shown.message.contains("pi_77"));

        let err = CoreError::from(ReconciliationError::SeatsNotReserved {
            trip_id: "bus-1".to_string(),
            intent_id: "pi_78".to_string(),
            seat_numbers: vec![],
            cause: "409".to_string(),
        });
        assert_eq!(notice(&err).title, "Booking incomplete");
    }
}
