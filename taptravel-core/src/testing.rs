//! In-memory stand-ins for the ticketing backend and the hosted payment sheet.
//!
//! Compiled only for tests and with the `testing` feature, which the
//! workspace's dev-dependencies turn on.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use taptravel_catalog::{GenderConstraintResolver, Neighbor, SeatMap, TripSource};
use taptravel_shared::{BackendError, Masked, Trip};

use crate::backend::{BookingBackend, IntentRequest, IntentSecrets, SeatStatusUpdate, TicketBatch};
use crate::payment::{PaymentSheet, SheetError, SheetSetup};

/// A step of the backend that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendStep {
    FetchTrip,
    CreateIntent,
    CommitSeats,
    GenerateTickets,
}

#[derive(Default)]
struct BackendState {
    trips: HashMap<String, Trip>,
    failures: HashMap<BackendStep, VecDeque<BackendError>>,
    intents: Vec<IntentRequest>,
    commits: Vec<SeatStatusUpdate>,
    ticket_batches: Vec<TicketBatch>,
    next_intent: u64,
}

/// Backend holding trips in memory. Seat commits are checked the way the real
/// backend checks them: no booked seat may be re-booked and paired seats may
/// not end up with different genders.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trip(self, trip_id: &str, trip: Trip) -> Self {
        self.insert_trip(trip_id, trip);
        self
    }

    pub fn insert_trip(&self, trip_id: &str, trip: Trip) {
        self.lock().trips.insert(trip_id.to_string(), trip);
    }

    /// Make the next call to `step` fail with `error`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&self, step: BackendStep, error: BackendError) {
        self.lock().failures.entry(step).or_default().push_back(error);
    }

    pub fn trip(&self, trip_id: &str) -> Option<Trip> {
        self.lock().trips.get(trip_id).cloned()
    }

    pub fn intent_requests(&self) -> Vec<IntentRequest> {
        self.lock().intents.clone()
    }

    pub fn commits(&self) -> Vec<SeatStatusUpdate> {
        self.lock().commits.clone()
    }

    pub fn ticket_batches(&self) -> Vec<TicketBatch> {
        self.lock().ticket_batches.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self, step: BackendStep) -> Result<(), BackendError> {
        match self.lock().failures.get_mut(&step).and_then(|q| q.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TripSource for InMemoryBackend {
    async fn fetch_trip(&self, trip_id: &str) -> Result<Trip, BackendError> {
        self.take_failure(BackendStep::FetchTrip)?;
        self.trip(trip_id)
            .ok_or_else(|| BackendError::NotFound(format!("trip {}", trip_id)))
    }
}

#[async_trait]
impl BookingBackend for InMemoryBackend {
    async fn create_payment_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<IntentSecrets, BackendError> {
        self.take_failure(BackendStep::CreateIntent)?;
        let mut state = self.lock();
        state.next_intent += 1;
        let n = state.next_intent;
        state.intents.push(request.clone());
        Ok(IntentSecrets {
            client_secret: Masked::new(format!("pi_mem{}_secret_{}", n, n * 7919)),
            ephemeral_key: Masked::new(format!("ek_mem{}", n)),
            customer: format!("cus_{}", request.user_id),
        })
    }

    async fn update_seat_status(
        &self,
        update: &SeatStatusUpdate,
    ) -> Result<serde_json::Value, BackendError> {
        self.take_failure(BackendStep::CommitSeats)?;
        let mut state = self.lock();
        let trip = state
            .trips
            .get_mut(&update.bus_id)
            .ok_or_else(|| BackendError::NotFound(format!("trip {}", update.bus_id)))?;

        let mut proposed = trip.seats.clone();
        for entry in &update.seats_data {
            let seat = proposed
                .iter_mut()
                .find(|s| s.seat_number == entry.seat_number)
                .ok_or_else(|| BackendError::Rejected {
                    status: 400,
                    message: format!("unknown seat {}", entry.seat_number),
                })?;
            if seat.booked {
                return Err(BackendError::Rejected {
                    status: 409,
                    message: format!("seat {} already booked", entry.seat_number),
                });
            }
            seat.booked = entry.booked;
            seat.gender = Some(entry.gender);
        }

        let map = SeatMap::new(update.bus_id.clone(), proposed.clone()).map_err(|e| {
            BackendError::Rejected { status: 400, message: e.to_string() }
        })?;
        let resolver = GenderConstraintResolver::new();
        for entry in &update.seats_data {
            let Some(seat) = map.seat(&entry.seat_number) else { continue };
            let neighbor = map
                .neighbor_of(&entry.seat_number)
                .filter(|n| n.booked)
                .map(|n| Neighbor { seat: n, gender: n.gender });
            if !resolver.validate_assignment(seat, entry.gender, neighbor).is_accepted() {
                return Err(BackendError::Rejected {
                    status: 409,
                    message: format!("seat {} violates neighbor gender rule", entry.seat_number),
                });
            }
        }

        trip.seats = proposed;
        state.commits.push(update.clone());
        Ok(serde_json::json!({ "message": "Seat status updated", "updated": update.seats_data.len() }))
    }

    async fn generate_tickets(
        &self,
        batch: &TicketBatch,
    ) -> Result<serde_json::Value, BackendError> {
        self.take_failure(BackendStep::GenerateTickets)?;
        let mut state = self.lock();
        state.ticket_batches.push(batch.clone());
        Ok(serde_json::json!({ "created": batch.tickets.len() }))
    }
}

#[derive(Default)]
struct SheetState {
    init_results: VecDeque<Result<(), SheetError>>,
    present_results: VecDeque<Result<(), SheetError>>,
    setups: Vec<SheetSetup>,
    presentations: usize,
}

/// Payment sheet whose outcomes are queued up front. With nothing queued,
/// initialization and presentation succeed.
#[derive(Default)]
pub struct ScriptedSheet {
    state: Mutex<SheetState>,
}

impl ScriptedSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_init(&self, result: Result<(), SheetError>) {
        self.lock().init_results.push_back(result);
    }

    pub fn push_present(&self, result: Result<(), SheetError>) {
        self.lock().present_results.push_back(result);
    }

    pub fn setups(&self) -> Vec<SheetSetup> {
        self.lock().setups.clone()
    }

    pub fn presentations(&self) -> usize {
        self.lock().presentations
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SheetState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PaymentSheet for ScriptedSheet {
    async fn init_payment_sheet(&self, setup: &SheetSetup) -> Result<(), SheetError> {
        let mut state = self.lock();
        state.setups.push(setup.clone());
        state.init_results.pop_front().unwrap_or(Ok(()))
    }

    async fn present_payment_sheet(&self) -> Result<(), SheetError> {
        let mut state = self.lock();
        state.presentations += 1;
        state.present_results.pop_front().unwrap_or(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SeatStatus;
    use taptravel_shared::{Fare, Gender, Seat};

    fn trip() -> Trip {
        Trip {
            id: Some("bus-1".to_string()),
            route: None,
            departure_time: None,
            arrival_time: None,
            bus_details: None,
            fare: Fare { actual_price: 1000, service_fee: 0 },
            seats: vec![Seat::booked("R1-1", Some(Gender::Female)), Seat::open("R1-2"), Seat::open("R1-3")],
        }
    }

    fn commit(seat: &str, gender: Gender) -> SeatStatusUpdate {
        SeatStatusUpdate {
            bus_id: "bus-1".to_string(),
            seats_data: vec![SeatStatus {
                seat_number: seat.to_string(),
                booked: true,
                email: "rider@example.com".to_string(),
                gender,
            }],
        }
    }

    #[tokio::test]
    async fn test_commit_enforces_neighbor_rule() {
        let backend = InMemoryBackend::new().with_trip("bus-1", trip());

        let rejected = backend.update_seat_status(&commit("R1-2", Gender::Male)).await;
        assert!(matches!(rejected, Err(BackendError::Rejected { status: 409, .. })));

        backend.update_seat_status(&commit("R1-2", Gender::Female)).await.unwrap();
        let stored = backend.trip("bus-1").unwrap();
        assert!(stored.seats[1].booked);

        let again = backend.update_seat_status(&commit("R1-2", Gender::Female)).await;
        assert!(matches!(again, Err(BackendError::Rejected { status: 409, .. })));
    }

    #[tokio::test]
    async fn test_each_intent_is_new() {
        let backend = InMemoryBackend::new();
        let request = IntentRequest {
            amount: 100,
            bus_id: "bus-1".to_string(),
            user_id: "rider-1".to_string(),
            admin_id: None,
        };

        let first = backend.create_payment_intent(&request).await.unwrap();
        let second = backend.create_payment_intent(&request).await.unwrap();
        assert_ne!(first.client_secret, second.client_secret);
        assert_eq!(backend.intent_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_queued_failures_are_consumed_in_order() {
        let backend = InMemoryBackend::new().with_trip("bus-1", trip());
        backend.fail_next(BackendStep::FetchTrip, BackendError::Network("timeout".to_string()));

        assert!(backend.fetch_trip("bus-1").await.is_err());
        assert!(backend.fetch_trip("bus-1").await.is_ok());
    }
}
