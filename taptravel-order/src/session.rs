use chrono::{DateTime, Utc};
use taptravel_catalog::position::label;
use taptravel_catalog::{quote, FareQuote, GenderConstraintResolver, Neighbor, SeatMap, SeatSelection, Verdict};
use taptravel_shared::{Fare, Gender, RiderIdentity, Seat, Trip};
use uuid::Uuid;

use crate::models::SelectedSeat;

/// One rider's in-progress booking on one trip.
///
/// Owns the selection and the provisional genders. Nothing here touches the
/// network, and every rejected operation leaves the session as it was.
#[derive(Debug, Clone)]
pub struct BookingSession {
    id: Uuid,
    trip_id: String,
    admin_id: Option<String>,
    rider: RiderIdentity,
    fare: Fare,
    selected: Vec<SelectedSeat>,
    resolver: GenderConstraintResolver,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new(trip_id: impl Into<String>, fare: Fare, rider: RiderIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trip_id: trip_id.into(),
            admin_id: None,
            rider,
            fare,
            selected: Vec::new(),
            resolver: GenderConstraintResolver::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn for_trip(trip_id: impl Into<String>, trip: &Trip, rider: RiderIdentity) -> Self {
        let mut session = Self::new(trip_id, trip.fare, rider);
        session.admin_id = trip.admin_id().map(str::to_string);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn admin_id(&self) -> Option<&str> {
        self.admin_id.as_deref()
    }

    pub fn rider(&self) -> &RiderIdentity {
        &self.rider
    }

    pub fn selected_seats(&self) -> &[SelectedSeat] {
        &self.selected
    }

    pub fn seat_numbers(&self) -> Vec<String> {
        self.selected.iter().map(|s| s.seat_number().to_string()).collect()
    }

    pub fn is_selected(&self, seat_number: &str) -> bool {
        self.position(seat_number).is_some()
    }

    /// Provisional gender of a selected seat.
    pub fn gender_of(&self, seat_number: &str) -> Option<Gender> {
        self.position(seat_number).and_then(|idx| self.selected[idx].gender)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add a seat with no gender yet. Selecting a seat twice is a no-op.
    pub fn select_seat(&mut self, seat: &Seat) -> Result<(), SessionError> {
        if seat.booked {
            return Err(SessionError::AlreadyBooked(seat.seat_number.clone()));
        }
        if self.is_selected(&seat.seat_number) {
            return Ok(());
        }
        self.selected.push(SelectedSeat::new(seat.clone()));
        self.touch();
        Ok(())
    }

    pub fn deselect_seat(&mut self, seat_number: &str) -> bool {
        match self.position(seat_number) {
            Some(idx) => {
                self.selected.remove(idx);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Give a selected seat a rider gender, subject to the neighbor rule.
    pub fn assign_gender(
        &mut self,
        seat_map: &SeatMap,
        seat_number: &str,
        gender: Gender,
    ) -> Result<(), SessionError> {
        let idx = self
            .position(seat_number)
            .ok_or_else(|| SessionError::NotSelected(seat_number.to_string()))?;

        let neighbor = seat_map.neighbor_of(seat_number).map(|seat| Neighbor {
            seat,
            gender: self.occupant_gender(seat),
        });

        match self
            .resolver
            .validate_assignment(&self.selected[idx].seat, gender, neighbor)
        {
            Verdict::Accepted => {
                self.selected[idx].gender = Some(gender);
                self.touch();
                tracing::debug!(
                    session_id = %self.id,
                    seat_number = %seat_number,
                    gender = %gender,
                    "Gender assigned"
                );
                Ok(())
            }
            Verdict::Rejected { reason } => Err(SessionError::GenderConflict {
                seat_number: seat_number.to_string(),
                label: label(seat_number).to_string(),
                reason,
            }),
        }
    }

    pub fn ready_for_payment(&self) -> bool {
        !self.selected.is_empty() && self.selected.iter().all(|s| s.gender.is_some())
    }

    /// Like [`ready_for_payment`](Self::ready_for_payment), but says what is missing.
    pub fn check_ready(&self) -> Result<(), SessionError> {
        if self.selected.is_empty() {
            return Err(SessionError::NoSeatsSelected);
        }
        let missing: Vec<String> = self
            .selected
            .iter()
            .filter(|s| s.gender.is_none())
            .map(|s| s.seat_number().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SessionError::GenderMissing { seats: missing })
        }
    }

    pub fn compute_amount(&self) -> i64 {
        self.quote().total
    }

    pub fn quote(&self) -> FareQuote {
        quote(&self.fare, self.selected.len())
    }

    /// Gender currently holding `seat`: assigned in this session, or booked.
    fn occupant_gender(&self, seat: &Seat) -> Option<Gender> {
        self.gender_of(&seat.seat_number)
            .or(if seat.booked { seat.gender } else { None })
    }

    fn position(&self, seat_number: &str) -> Option<usize> {
        self.selected.iter().position(|s| s.seat_number() == seat_number)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl SeatSelection for BookingSession {
    fn contains_seat(&self, seat_number: &str) -> bool {
        self.is_selected(seat_number)
    }

    fn insert_seat(&mut self, seat: &Seat) -> bool {
        self.select_seat(seat).is_ok()
    }

    fn remove_seat(&mut self, seat_number: &str) -> bool {
        self.deselect_seat(seat_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Seat {0} is already booked")]
    AlreadyBooked(String),

    #[error("Seat {0} is not selected")]
    NotSelected(String),

    #[error("Seat {label}: {reason}")]
    GenderConflict {
        seat_number: String,
        label: String,
        reason: String,
    },

    #[error("No seats selected")]
    NoSeatsSelected,

    #[error("Please assign gender for all selected seats (missing: {})", seats.join(", "))]
    GenderMissing { seats: Vec<String> },

    #[error("Payment received, your seats and tickets are still being issued")]
    IssuanceInProgress,
}

impl From<SessionError> for taptravel_core::CoreError {
    fn from(err: SessionError) -> Self {
        taptravel_core::CoreError::ValidationError(err.to_string())
    }
}
