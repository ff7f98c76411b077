use proptest::prelude::*;
use std::collections::BTreeSet;
use taptravel_catalog::{SeatMap, SelectionChange};
use taptravel_shared::{Gender, Seat};

fn arb_layout() -> impl Strategy<Value = Vec<Seat>> {
    // Up to 6 rows of 4 seats, each booked or open
    prop::collection::vec(prop::bool::ANY, 1..24).prop_map(|flags| {
        flags
            .into_iter()
            .enumerate()
            .map(|(i, booked)| {
                let number = format!("R{}-{}", i / 4 + 1, i % 4 + 1);
                if booked {
                    Seat::booked(number, Some(Gender::Male))
                } else {
                    Seat::open(number)
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn booked_seats_never_enter_the_selection(
        seats in arb_layout(),
        toggles in prop::collection::vec(0usize..24, 0..64),
    ) {
        let map = SeatMap::new("bus-1", seats.clone()).unwrap();
        let mut selection = BTreeSet::new();

        for idx in toggles {
            let Some(seat) = seats.get(idx) else { continue };
            let change = map.toggle_selection(&seat.seat_number, &mut selection).unwrap();
            if seat.booked {
                prop_assert_eq!(change, SelectionChange::Refused);
            }
            for selected in &selection {
                prop_assert!(!map.seat(selected).unwrap().booked);
            }
        }
    }

    #[test]
    fn neighbor_relation_is_symmetric(seats in arb_layout()) {
        let map = SeatMap::new("bus-1", seats.clone()).unwrap();

        for seat in &seats {
            if let Some(neighbor) = map.neighbor_of(&seat.seat_number) {
                prop_assert_ne!(&neighbor.seat_number, &seat.seat_number);
                let back = map.neighbor_of(&neighbor.seat_number).unwrap();
                prop_assert_eq!(&back.seat_number, &seat.seat_number);
            }
        }
    }
}
