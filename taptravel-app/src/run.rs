use std::collections::BTreeSet;
use taptravel_catalog::position::{label, SeatPosition};
use taptravel_catalog::{SeatMap, SeatSelection, SeatState, SelectionChange};
use taptravel_core::{CoreError, CoreResult, ErrorCategory};
use taptravel_order::{BookingFlow, BookingOutcome};
use taptravel_shared::BookingEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::cli::SeatRequest;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub trip_id: String,
    pub seats: Vec<SeatRequest>,
    /// Payment sheet presentations before giving up; at least one.
    pub attempts: u32,
}

/// Select the requested seats, assign genders and pay, offering the sheet
/// again after a dismissal or a declined payment.
pub async fn run_booking(flow: &mut BookingFlow, options: &RunOptions) -> CoreResult<BookingOutcome> {
    let trip = flow.load_trip(&options.trip_id).await?;
    tracing::info!(trip_id = %options.trip_id, summary = %trip.summary(), "Trip loaded");

    for request in &options.seats {
        let already_selected = flow
            .session()
            .is_some_and(|session| session.is_selected(&request.seat_number));
        // Toggling again would drop a seat named twice
        if already_selected {
            tracing::debug!(seat_number = %request.seat_number, "Seat requested more than once");
        } else if flow.toggle_seat(&request.seat_number)? == SelectionChange::Refused {
            return Err(CoreError::ValidationError(format!(
                "Seat {} is already booked",
                label(&request.seat_number)
            )));
        }
        flow.assign_gender(&request.seat_number, request.gender)?;
        tracing::debug!(
            seat_number = %request.seat_number,
            gender = request.gender.code(),
            "Seat requested"
        );
    }
    let seats = flow.session().map_or(0, |session| session.selected_seats().len());
    tracing::info!(seats, amount = flow.amount(), "Seats selected");

    let attempts = options.attempts.max(1);
    let mut attempt = 1;
    loop {
        match flow.pay().await {
            Ok(BookingOutcome::Cancelled) if attempt < attempts => {
                tracing::info!(attempt, "Payment sheet dismissed, offering it again");
            }
            Err(err) if err.category() == ErrorCategory::Payment && attempt < attempts => {
                tracing::warn!(attempt, error = %err, "Payment attempt failed");
            }
            result => return result,
        }
        attempt += 1;
    }
}

/// Log booking lifecycle events until the flow is dropped.
pub fn log_events(mut events: broadcast::Receiver<BookingEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::info!(trip_id = %event.trip_id(), event = %json, "Booking event"),
                    Err(e) => tracing::warn!(error = %e, "Could not encode booking event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Booking event log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Text seat chart, one line per row:
/// `[ ]` free, `[*]` selected, `[M]`/`[F]` booked by gender, `[X]` booked.
pub fn seat_chart<S>(map: &SeatMap, selection: &S) -> String
where
    S: SeatSelection + ?Sized,
{
    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    for seat in map.seats() {
        let row = SeatPosition::parse(&seat.seat_number)
            .map(|p| p.row)
            .unwrap_or_default();
        let cell = match map.seat_state(&seat.seat_number, selection) {
            Some(SeatState::Available) | None => "[ ]",
            Some(SeatState::Selected) => "[*]",
            Some(SeatState::BookedMale) => "[M]",
            Some(SeatState::BookedFemale) => "[F]",
            Some(SeatState::Booked) => "[X]",
        };
        let cell = format!("{}{}", label(&seat.seat_number), cell);
        match rows.iter_mut().find(|(name, _)| *name == row) {
            Some((_, cells)) => cells.push(cell),
            None => rows.push((row, vec![cell])),
        }
    }

    rows.into_iter()
        .map(|(row, cells)| format!("{:<4} {}", row, cells.join(" ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Seat chart with no selection.
pub fn plain_seat_chart(map: &SeatMap) -> String {
    seat_chart(map, &BTreeSet::<String>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taptravel_shared::{Gender, Seat};

    #[test]
    fn test_seat_chart() {
        let map = SeatMap::new(
            "bus-1",
            vec![
                Seat::booked("R1-1", Some(Gender::Female)),
                Seat::open("R1-2"),
                Seat::booked("R2-1", None),
                Seat::booked("R2-2", Some(Gender::Male)),
            ],
        )
        .unwrap();
        let mut selection = BTreeSet::new();
        selection.insert("R1-2".to_string());

        assert_eq!(seat_chart(&map, &selection), "R1   1[F] 2[*]\nR2   1[X] 2[M]");
        assert_eq!(plain_seat_chart(&map).lines().next(), Some("R1   1[F] 2[ ]"));
    }
}
