use chrono::Utc;
use std::sync::Arc;
use taptravel_catalog::{SeatMap, SelectionChange};
use taptravel_core::backend::BookingBackend;
use taptravel_core::payment::{PaymentError, PaymentGateway};
use taptravel_core::{CoreError, CoreResult, ReconciliationError};
use taptravel_shared::models::events::PaymentSucceededEvent;
use taptravel_shared::{BookingEvent, Gender, RiderIdentity, Trip};
use tokio::sync::broadcast;

use crate::fulfillment::{IssuanceRequest, PendingIssuance, TicketIssuer};
use crate::models::{IssuedBooking, PaymentOutcome, PaymentState};
use crate::orchestrator::PaymentOrchestrator;
use crate::session::{BookingSession, SessionError};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// Seats committed and tickets generated.
    Booked(IssuedBooking),
    /// Rider dismissed the payment sheet; the session is kept.
    Cancelled,
}

/// Owns one rider's booking from seat selection to issued tickets.
///
/// Operations are serialized through `&mut self`. After a reconciliation
/// error the flow is closed: the session stays readable but every further
/// operation returns that error.
///
/// Issuance runs on its own task. If a `pay()` future is dropped after the
/// payment went through, the flow keeps the running issuance; synchronous
/// operations refuse until it is settled by [`pay`](Self::pay),
/// [`settle_issuance`](Self::settle_issuance) or another async operation.
pub struct BookingFlow {
    backend: Arc<dyn BookingBackend>,
    orchestrator: PaymentOrchestrator,
    issuer: TicketIssuer,
    rider: RiderIdentity,
    trip: Option<Trip>,
    seat_map: Option<SeatMap>,
    session: Option<BookingSession>,
    closed: Option<ReconciliationError>,
    issuing: Option<PendingIssuance>,
    events: broadcast::Sender<BookingEvent>,
}

impl BookingFlow {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        gateway: Arc<dyn PaymentGateway>,
        rider: RiderIdentity,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            issuer: TicketIssuer::new(backend.clone()).with_events(events.clone()),
            orchestrator: PaymentOrchestrator::new(gateway),
            backend,
            rider,
            trip: None,
            seat_map: None,
            session: None,
            closed: None,
            issuing: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    pub fn rider(&self) -> &RiderIdentity {
        &self.rider
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn seat_map(&self) -> Option<&SeatMap> {
        self.seat_map.as_ref()
    }

    pub fn session(&self) -> Option<&BookingSession> {
        self.session.as_ref()
    }

    pub fn payment_state(&self) -> &PaymentState {
        self.orchestrator.state()
    }

    /// The reconciliation error that closed this flow, if any.
    pub fn closed(&self) -> Option<&ReconciliationError> {
        self.closed.as_ref()
    }

    /// True while a paid booking is still being committed and ticketed.
    pub fn issuance_pending(&self) -> bool {
        self.issuing.is_some()
    }

    /// Wait for an issuance left running by a dropped [`pay`](Self::pay) and
    /// apply its outcome. `Ok(None)` when nothing was pending.
    pub async fn settle_issuance(&mut self) -> CoreResult<Option<IssuedBooking>> {
        let Some(pending) = self.issuing.as_mut() else {
            return Ok(None);
        };
        let result = self.issuer.join(pending).await;
        let Some(pending) = self.issuing.take() else {
            return Ok(None);
        };
        self.finish_issuance(pending.into_request(), result).map(Some)
    }

    /// Fetch the trip layout. Any pending selection for a previous trip is dropped.
    pub async fn load_trip(&mut self, trip_id: &str) -> CoreResult<&Trip> {
        self.settle_issuance().await?;
        self.ensure_open()?;
        let (trip, seat_map) = SeatMap::load(self.backend.as_ref(), trip_id).await?;

        if self.session.take().is_some() {
            tracing::debug!(trip_id = %trip_id, "Dropping selection for previous trip");
        }
        self.orchestrator.reset();
        self.seat_map = Some(seat_map);
        Ok(&*self.trip.insert(trip))
    }

    /// Select or deselect a seat. The session is created on first use.
    pub fn toggle_seat(&mut self, seat_number: &str) -> CoreResult<SelectionChange> {
        self.ensure_open()?;
        let (Some(trip), Some(seat_map)) = (self.trip.as_ref(), self.seat_map.as_ref()) else {
            return Err(CoreError::ValidationError("no trip loaded".to_string()));
        };

        let session = self.session.get_or_insert_with(|| {
            BookingSession::for_trip(seat_map.trip_id(), trip, self.rider.clone())
        });
        let change = seat_map.toggle_selection(seat_number, &mut *session)?;

        match change {
            SelectionChange::Refused => {
                tracing::debug!(seat_number = %seat_number, "Seat is booked, selection refused");
            }
            _ => {
                tracing::debug!(
                    seat_number = %seat_number,
                    change = ?change,
                    amount = session.compute_amount(),
                    "Selection changed"
                );
                // A prepared intent was scoped to the old amount
                if self.orchestrator.intent().is_some() {
                    self.orchestrator.reset();
                }
            }
        }
        Ok(change)
    }

    pub fn assign_gender(&mut self, seat_number: &str, gender: Gender) -> CoreResult<()> {
        self.ensure_open()?;
        let (Some(seat_map), Some(session)) = (self.seat_map.as_ref(), self.session.as_mut()) else {
            return Err(SessionError::NotSelected(seat_number.to_string()).into());
        };
        session
            .assign_gender(seat_map, seat_number, gender)
            .map_err(|e| {
                tracing::info!(seat_number = %seat_number, error = %e, "Gender assignment rejected");
                CoreError::from(e)
            })
    }

    pub fn amount(&self) -> i64 {
        self.session.as_ref().map_or(0, BookingSession::compute_amount)
    }

    /// Create a fresh payment intent for the current selection and prepare the sheet.
    pub async fn begin_payment(&mut self) -> CoreResult<()> {
        self.settle_issuance().await?;
        self.ensure_open()?;
        let session = self.session.as_ref().ok_or(SessionError::NoSeatsSelected)?;
        session.check_ready()?;
        self.orchestrator.initialize(session).await?;
        Ok(())
    }

    /// Present the payment sheet and, once paid, commit seats and issue tickets.
    ///
    /// Prepares a new intent first unless one is already waiting. A declined
    /// payment keeps the session so the rider can try again. If an earlier
    /// call was dropped while issuing, this waits for that issuance and
    /// returns its outcome instead of taking a new payment.
    pub async fn pay(&mut self) -> CoreResult<BookingOutcome> {
        if let Some(booking) = self.settle_issuance().await? {
            return Ok(BookingOutcome::Booked(booking));
        }
        self.ensure_open()?;
        let prepared = matches!(
            self.orchestrator.state(),
            PaymentState::Ready | PaymentState::Cancelled
        ) && self.orchestrator.intent().is_some();
        if !prepared {
            self.begin_payment().await?;
        }

        let receipt = match self.orchestrator.present().await? {
            PaymentOutcome::Succeeded(receipt) => receipt,
            PaymentOutcome::Cancelled => return Ok(BookingOutcome::Cancelled),
            PaymentOutcome::Failed { reason } => {
                return Err(PaymentError::Declined(reason).into());
            }
        };

        let session = self.session.as_ref().ok_or(SessionError::NoSeatsSelected)?;
        self.emit(BookingEvent::PaymentSucceeded(PaymentSucceededEvent {
            session_id: session.id(),
            trip_id: receipt.trip_id().to_string(),
            rider_id: receipt.rider_id().to_string(),
            intent_id: receipt.intent_id().to_string(),
            amount: receipt.amount(),
            timestamp: receipt.paid_at().timestamp(),
        }));

        let request = IssuanceRequest::from_session(session, &receipt)?;
        self.issuing = Some(self.issuer.spawn(request));
        self.settle_issuance()
            .await?
            .map(BookingOutcome::Booked)
            .ok_or_else(|| CoreError::ValidationError("no issuance was started".to_string()))
    }

    fn finish_issuance(
        &mut self,
        request: IssuanceRequest,
        result: Result<IssuedBooking, ReconciliationError>,
    ) -> CoreResult<IssuedBooking> {
        match result {
            Ok(booking) => {
                if let Some(seat_map) = self.seat_map.as_mut() {
                    for (seat_number, gender) in &request.seats {
                        seat_map.mark_booked(seat_number, *gender)?;
                    }
                }
                self.session = None;
                self.orchestrator.reset();
                tracing::info!(
                    trip_id = %booking.trip_id,
                    seats = booking.seat_numbers.len(),
                    amount = booking.amount,
                    "Booking complete"
                );
                Ok(booking)
            }
            Err(err) => {
                self.closed = Some(err.clone());
                Err(err.into())
            }
        }
    }

    /// Abandon the pending selection. Nothing is reserved before payment, so
    /// there is nothing to release on the backend.
    pub fn cancel(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        if let Some(session) = self.session.take() {
            let now = Utc::now();
            tracing::info!(
                session_id = %session.id(),
                age_secs = (now - session.created_at()).num_seconds(),
                idle_secs = (now - session.updated_at()).num_seconds(),
                "Booking session cancelled"
            );
        }
        self.orchestrator.reset();
        Ok(())
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if let Some(err) = &self.closed {
            return Err(err.clone().into());
        }
        if self.issuing.is_some() {
            return Err(SessionError::IssuanceInProgress.into());
        }
        Ok(())
    }

    fn emit(&self, event: BookingEvent) {
        let _ = self.events.send(event);
    }
}
