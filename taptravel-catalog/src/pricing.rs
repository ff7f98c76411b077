use serde::{Deserialize, Serialize};
use taptravel_shared::Fare;

/// Price of a selection: every seat is charged the trip's actual price.
///
/// The service fee is carried for display only; it is not part of the charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareQuote {
    pub seat_count: usize,
    pub unit_price: i64,
    pub service_fee: i64,
    pub total: i64,
}

pub fn quote(fare: &Fare, seat_count: usize) -> FareQuote {
    let count = i64::try_from(seat_count).unwrap_or(i64::MAX);
    FareQuote {
        seat_count,
        unit_price: fare.actual_price,
        service_fee: fare.service_fee,
        total: count.saturating_mul(fare.actual_price),
    }
}
