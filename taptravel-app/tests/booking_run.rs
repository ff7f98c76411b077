use std::sync::Arc;
use taptravel_app::{notice, run_booking, RunOptions, SeatRequest};
use taptravel_core::payment::{SheetError, SheetGateway};
use taptravel_core::testing::{BackendStep, InMemoryBackend, ScriptedSheet};
use taptravel_core::{CoreError, ErrorCategory};
use taptravel_order::{BookingFlow, BookingOutcome};
use taptravel_shared::{BackendError, Fare, Gender, RiderIdentity, RouteInfo, Seat, Trip};

fn trip() -> Trip {
    Trip {
        id: Some("bus-9".to_string()),
        route: Some(RouteInfo {
            start_city: "Lahore".to_string(),
            end_city: "Islamabad".to_string(),
        }),
        departure_time: Some("08:00".to_string()),
        arrival_time: Some("12:30".to_string()),
        bus_details: None,
        fare: Fare { actual_price: 1800, service_fee: 50 },
        seats: vec![
            Seat::booked("R1-1", Some(Gender::Male)),
            Seat::open("R1-2"),
            Seat::open("R1-3"),
            Seat::open("R1-4"),
        ],
    }
}

fn setup() -> (Arc<InMemoryBackend>, Arc<ScriptedSheet>, BookingFlow) {
    let backend = Arc::new(InMemoryBackend::new().with_trip("bus-9", trip()));
    let sheet = Arc::new(ScriptedSheet::new());
    let gateway = Arc::new(SheetGateway::new(backend.clone(), sheet.clone(), "Tap & Travel"));
    let rider = RiderIdentity {
        id: "rider-5".to_string(),
        name: None,
        email: "rider5@example.com".to_string(),
    };
    let flow = BookingFlow::new(backend.clone(), gateway, rider);
    (backend, sheet, flow)
}

fn options(seats: &[&str], attempts: u32) -> RunOptions {
    RunOptions {
        trip_id: "bus-9".to_string(),
        seats: seats.iter().map(|s| s.parse::<SeatRequest>().unwrap()).collect(),
        attempts,
    }
}

#[tokio::test]
async fn test_books_requested_seats() {
    let (backend, _sheet, mut flow) = setup();

    let outcome = run_booking(&mut flow, &options(&["R1-2=M", "R1-3=F"], 3)).await.unwrap();
    let BookingOutcome::Booked(booking) = outcome else {
        panic!("expected a booking");
    };
    assert_eq!(booking.amount, 3600);
    assert_eq!(backend.commits().len(), 1);
    assert_eq!(backend.ticket_batches()[0].tickets.len(), 2);
}

#[tokio::test]
async fn test_conflicting_gender_stops_before_payment() {
    let (backend, sheet, mut flow) = setup();

    let err = run_booking(&mut flow, &options(&["R1-2=F"], 3)).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(notice(&err).message.contains("Male"));
    assert!(backend.intent_requests().is_empty());
    assert_eq!(sheet.presentations(), 0);
}

#[tokio::test]
async fn test_booked_seat_is_refused() {
    let (_backend, _sheet, mut flow) = setup();

    let err = run_booking(&mut flow, &options(&["R1-1=M"], 3)).await.unwrap_err();
    assert_eq!(err, CoreError::ValidationError("Seat 1 is already booked".to_string()));
}

#[tokio::test]
async fn test_retries_declined_payment_with_new_intent() {
    let (backend, sheet, mut flow) = setup();
    sheet.push_present(Err(SheetError::failed("Your card was declined.")));
    sheet.push_present(Err(SheetError::canceled()));

    let outcome = run_booking(&mut flow, &options(&["R1-4=F"], 3)).await.unwrap();
    assert!(matches!(outcome, BookingOutcome::Booked(_)));
    assert_eq!(sheet.presentations(), 3);
    // declined → fresh intent; dismissed → same intent
    assert_eq!(backend.intent_requests().len(), 2);
}

#[tokio::test]
async fn test_gives_up_after_attempts() {
    let (backend, sheet, mut flow) = setup();
    sheet.push_present(Err(SheetError::failed("Your card was declined.")));
    sheet.push_present(Err(SheetError::failed("Your card was declined.")));

    let err = run_booking(&mut flow, &options(&["R1-4=F"], 2)).await.unwrap_err();
    assert_eq!(notice(&err).message, "Your card was declined.");
    assert!(backend.commits().is_empty());
}

#[tokio::test]
async fn test_reconciliation_is_not_retried() {
    let (backend, sheet, mut flow) = setup();
    backend.fail_next(
        BackendStep::CommitSeats,
        BackendError::Rejected { status: 500, message: "oops".to_string() },
    );

    let err = run_booking(&mut flow, &options(&["R1-4=F"], 3)).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Reconciliation);
    assert_eq!(notice(&err).title, "Booking incomplete");
    assert_eq!(sheet.presentations(), 1);
    assert_eq!(backend.intent_requests().len(), 1);
}

#[tokio::test]
async fn test_dismissed_every_time() {
    let (backend, sheet, mut flow) = setup();
    sheet.push_present(Err(SheetError::canceled()));
    sheet.push_present(Err(SheetError::canceled()));

    let outcome = run_booking(&mut flow, &options(&["R1-4=M"], 2)).await.unwrap();
    assert_eq!(outcome, BookingOutcome::Cancelled);
    assert!(backend.commits().is_empty());
    assert!(flow.session().is_some());
}

#[tokio::test]
async fn test_repeated_seat_is_booked_once() {
    let (backend, _sheet, mut flow) = setup();

    let outcome = run_booking(&mut flow, &options(&["R1-4=F", "R1-4=F"], 3)).await.unwrap();
    let BookingOutcome::Booked(booking) = outcome else {
        panic!("expected a booking");
    };
    assert_eq!(booking.seat_numbers, vec!["R1-4"]);
    assert_eq!(booking.amount, 1800);
    assert_eq!(backend.intent_requests()[0].amount, 1800);
    assert_eq!(backend.commits()[0].seats_data.len(), 1);
}

#[tokio::test]
async fn test_repeated_seat_takes_last_gender() {
    let (backend, _sheet, mut flow) = setup();

    run_booking(&mut flow, &options(&["R1-3=M", "R1-3=F"], 3)).await.unwrap();
    assert_eq!(backend.commits()[0].seats_data[0].gender, Gender::Female);
}
