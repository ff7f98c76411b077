use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use taptravel_shared::{BackendError, Gender, Seat, Trip};

use crate::position::SeatPosition;

/// Source of trip layouts (the `GET /bus/{tripId}` endpoint).
#[async_trait]
pub trait TripSource: Send + Sync {
    async fn fetch_trip(&self, trip_id: &str) -> Result<Trip, BackendError>;
}

/// A pending selection that a seat map can toggle seats in and out of.
pub trait SeatSelection {
    fn contains_seat(&self, seat_number: &str) -> bool;

    /// Add an unbooked seat. Returns false if the selection refused it.
    fn insert_seat(&mut self, seat: &Seat) -> bool;

    fn remove_seat(&mut self, seat_number: &str) -> bool;
}

impl SeatSelection for BTreeSet<String> {
    fn contains_seat(&self, seat_number: &str) -> bool {
        self.contains(seat_number)
    }

    fn insert_seat(&mut self, seat: &Seat) -> bool {
        self.insert(seat.seat_number.clone());
        true
    }

    fn remove_seat(&mut self, seat_number: &str) -> bool {
        self.remove(seat_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected,
    Deselected,
    /// Booked seats cannot be selected; nothing changed.
    Refused,
}

/// Display state of a seat, as used by the seat legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatState {
    Available,
    Selected,
    BookedMale,
    BookedFemale,
    Booked,
}

/// Client-side snapshot of one trip's seats.
///
/// The snapshot is advisory. It is fetched once per session and may be stale
/// by the time seats are committed.
#[derive(Debug, Clone)]
pub struct SeatMap {
    trip_id: String,
    seats: Vec<Seat>,
    by_number: HashMap<String, usize>,
    by_position: HashMap<SeatPosition, usize>,
}

impl SeatMap {
    pub fn new(trip_id: impl Into<String>, seats: Vec<Seat>) -> Result<Self, SeatMapError> {
        let mut by_number = HashMap::with_capacity(seats.len());
        let mut by_position = HashMap::with_capacity(seats.len());

        for (idx, seat) in seats.iter().enumerate() {
            if by_number.insert(seat.seat_number.clone(), idx).is_some() {
                return Err(SeatMapError::DuplicateSeat(seat.seat_number.clone()));
            }
            if let Some(position) = SeatPosition::parse(&seat.seat_number) {
                by_position.insert(position, idx);
            }
        }

        Ok(Self {
            trip_id: trip_id.into(),
            seats,
            by_number,
            by_position,
        })
    }

    /// Fetch the current layout for a trip and index it.
    pub async fn load<S>(source: &S, trip_id: &str) -> Result<(Trip, Self), SeatMapError>
    where
        S: TripSource + ?Sized,
    {
        let trip = source.fetch_trip(trip_id).await?;
        let map = Self::new(trip_id, trip.seats.clone())?;
        tracing::info!(
            trip_id = %trip_id,
            seats = map.seats.len(),
            available = map.available_count(),
            "Loaded seat map"
        );
        Ok((trip, map))
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, seat_number: &str) -> Option<&Seat> {
        self.by_number.get(seat_number).map(|&idx| &self.seats[idx])
    }

    pub fn available_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.booked).count()
    }

    /// Add the seat to `selection`, or take it out if already there.
    /// Booked seats are refused and leave the selection untouched.
    pub fn toggle_selection<S>(
        &self,
        seat_number: &str,
        selection: &mut S,
    ) -> Result<SelectionChange, SeatMapError>
    where
        S: SeatSelection + ?Sized,
    {
        let seat = self
            .seat(seat_number)
            .ok_or_else(|| SeatMapError::UnknownSeat(seat_number.to_string()))?;

        if seat.booked {
            return Ok(SelectionChange::Refused);
        }

        if selection.contains_seat(seat_number) {
            selection.remove_seat(seat_number);
            Ok(SelectionChange::Deselected)
        } else if selection.insert_seat(seat) {
            Ok(SelectionChange::Selected)
        } else {
            Ok(SelectionChange::Refused)
        }
    }

    /// The seat paired with `seat_number` in the same row, if the layout has one.
    pub fn neighbor_of(&self, seat_number: &str) -> Option<&Seat> {
        let position = SeatPosition::parse(seat_number)?;
        self.by_position
            .get(&position.partner()?)
            .map(|&idx| &self.seats[idx])
    }

    pub fn seat_state<S>(&self, seat_number: &str, selection: &S) -> Option<SeatState>
    where
        S: SeatSelection + ?Sized,
    {
        let seat = self.seat(seat_number)?;
        let state = match (seat.booked, seat.gender) {
            (true, Some(Gender::Male)) => SeatState::BookedMale,
            (true, Some(Gender::Female)) => SeatState::BookedFemale,
            (true, None) => SeatState::Booked,
            (false, _) if selection.contains_seat(seat_number) => SeatState::Selected,
            (false, _) => SeatState::Available,
        };
        Some(state)
    }

    /// Reflect a successful seat commit in the local snapshot.
    pub fn mark_booked(&mut self, seat_number: &str, gender: Gender) -> Result<(), SeatMapError> {
        let idx = *self
            .by_number
            .get(seat_number)
            .ok_or_else(|| SeatMapError::UnknownSeat(seat_number.to_string()))?;
        let seat = &mut self.seats[idx];
        seat.booked = true;
        seat.gender = Some(gender);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatMapError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Seat {0} does not exist on this trip")]
    UnknownSeat(String),

    #[error("Seat {0} appears more than once in the layout")]
    DuplicateSeat(String),
}
