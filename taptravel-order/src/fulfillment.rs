use chrono::Utc;
use std::sync::Arc;
use taptravel_core::backend::{BookingBackend, SeatStatus, SeatStatusUpdate, TicketBatch, TicketRequest};
use taptravel_core::ReconciliationError;
use taptravel_shared::models::events::{
    ReconciliationRequiredEvent, SeatsCommittedEvent, TicketsIssuedEvent,
};
use taptravel_shared::{BookingEvent, Gender};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{IssuedBooking, PaymentReceipt};
use crate::session::{BookingSession, SessionError};

/// Everything needed to turn a confirmed payment into booked seats and tickets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceRequest {
    pub session_id: Uuid,
    pub trip_id: String,
    pub rider_id: String,
    pub email: String,
    pub intent_id: String,
    pub amount: i64,
    pub seats: Vec<(String, Gender)>,
}

impl IssuanceRequest {
    /// Requires a receipt, so issuance cannot be requested before payment.
    pub fn from_session(
        session: &BookingSession,
        receipt: &PaymentReceipt,
    ) -> Result<Self, SessionError> {
        session.check_ready()?;
        let seats = session
            .selected_seats()
            .iter()
            .filter_map(|s| s.gender.map(|g| (s.seat_number().to_string(), g)))
            .collect();

        Ok(Self {
            session_id: session.id(),
            trip_id: session.trip_id().to_string(),
            rider_id: session.rider().id.clone(),
            email: session.rider().email.clone(),
            intent_id: receipt.intent_id().to_string(),
            amount: receipt.amount(),
            seats,
        })
    }

    pub fn seat_numbers(&self) -> Vec<String> {
        self.seats.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// An issuance running on its own task.
///
/// Once [`TicketIssuer::join`] has returned a result the handle is spent and
/// must be dropped.
#[derive(Debug)]
pub struct PendingIssuance {
    request: IssuanceRequest,
    handle: JoinHandle<Result<IssuedBooking, ReconciliationError>>,
}

impl PendingIssuance {
    pub fn request(&self) -> &IssuanceRequest {
        &self.request
    }

    pub fn into_request(self) -> IssuanceRequest {
        self.request
    }
}

/// Commits seats, then generates tickets. Each call runs at most once per
/// request; failures surface as [`ReconciliationError`] and are not retried.
#[derive(Clone)]
pub struct TicketIssuer {
    backend: Arc<dyn BookingBackend>,
    events: Option<broadcast::Sender<BookingEvent>>,
}

impl TicketIssuer {
    pub fn new(backend: Arc<dyn BookingBackend>) -> Self {
        Self {
            backend,
            events: None,
        }
    }

    pub fn with_events(mut self, events: broadcast::Sender<BookingEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn issue(&self, request: IssuanceRequest) -> Result<IssuedBooking, ReconciliationError> {
        let seat_numbers = request.seat_numbers();
        let update = SeatStatusUpdate {
            bus_id: request.trip_id.clone(),
            seats_data: request
                .seats
                .iter()
                .map(|(seat_number, gender)| SeatStatus {
                    seat_number: seat_number.clone(),
                    booked: true,
                    email: request.email.clone(),
                    gender: *gender,
                })
                .collect(),
        };

        let commit = match self.backend.update_seat_status(&update).await {
            Ok(body) => body,
            Err(e) => {
                let err = ReconciliationError::SeatsNotReserved {
                    trip_id: request.trip_id.clone(),
                    intent_id: request.intent_id.clone(),
                    seat_numbers,
                    cause: e.to_string(),
                };
                self.report(&request, &err);
                return Err(err);
            }
        };

        tracing::info!(
            trip_id = %request.trip_id,
            intent_id = %request.intent_id,
            seats = ?seat_numbers,
            "Seats committed"
        );
        self.emit(BookingEvent::SeatsCommitted(SeatsCommittedEvent {
            session_id: request.session_id,
            trip_id: request.trip_id.clone(),
            seat_numbers: seat_numbers.clone(),
            timestamp: Utc::now().timestamp(),
        }));

        let batch = TicketBatch {
            tickets: seat_numbers
                .iter()
                .map(|seat_number| TicketRequest {
                    user_id: request.rider_id.clone(),
                    bus_id: request.trip_id.clone(),
                    seat_number: seat_number.clone(),
                })
                .collect(),
        };

        let tickets = match self.backend.generate_tickets(&batch).await {
            Ok(body) => body,
            Err(e) => {
                let err = ReconciliationError::TicketPending {
                    trip_id: request.trip_id.clone(),
                    intent_id: request.intent_id.clone(),
                    seat_numbers,
                    cause: e.to_string(),
                };
                self.report(&request, &err);
                return Err(err);
            }
        };

        tracing::info!(
            trip_id = %request.trip_id,
            rider_id = %request.rider_id,
            tickets = batch.tickets.len(),
            "Tickets issued"
        );
        self.emit(BookingEvent::TicketsIssued(TicketsIssuedEvent {
            session_id: request.session_id,
            trip_id: request.trip_id.clone(),
            rider_id: request.rider_id.clone(),
            seat_numbers: seat_numbers.clone(),
            timestamp: Utc::now().timestamp(),
        }));

        Ok(IssuedBooking {
            trip_id: request.trip_id,
            rider_id: request.rider_id,
            intent_id: request.intent_id,
            seat_numbers,
            amount: request.amount,
            commit,
            tickets,
        })
    }

    /// Start [`issue`](Self::issue) on its own task. The commit and ticket
    /// calls run to completion even if nobody waits for the result.
    pub fn spawn(&self, request: IssuanceRequest) -> PendingIssuance {
        let issuer = self.clone();
        let task_request = request.clone();
        tracing::debug!(intent_id = %request.intent_id, "Issuance started");
        PendingIssuance {
            request,
            handle: tokio::spawn(async move { issuer.issue(task_request).await }),
        }
    }

    /// Wait for a spawned issuance. Cancel safe: if this future is dropped
    /// the task keeps running and `join` can be called again.
    pub async fn join(&self, pending: &mut PendingIssuance) -> Result<IssuedBooking, ReconciliationError> {
        match (&mut pending.handle).await {
            Ok(result) => result,
            Err(join_err) => {
                let err = ReconciliationError::SeatsNotReserved {
                    trip_id: pending.request.trip_id.clone(),
                    intent_id: pending.request.intent_id.clone(),
                    seat_numbers: pending.request.seat_numbers(),
                    cause: format!("issuance task aborted: {}", join_err),
                };
                self.report(&pending.request, &err);
                Err(err)
            }
        }
    }

    fn report(&self, request: &IssuanceRequest, err: &ReconciliationError) {
        tracing::error!(
            session_id = %request.session_id,
            trip_id = %request.trip_id,
            intent_id = %request.intent_id,
            amount = request.amount,
            seats_reserved = err.seats_reserved(),
            error = %err,
            "Payment needs manual reconciliation"
        );
        self.emit(BookingEvent::ReconciliationRequired(ReconciliationRequiredEvent {
            session_id: request.session_id,
            trip_id: request.trip_id.clone(),
            intent_id: request.intent_id.clone(),
            seats_reserved: err.seats_reserved(),
            detail: err.to_string(),
            timestamp: Utc::now().timestamp(),
        }));
    }

    fn emit(&self, event: BookingEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }
}
