pub mod position;
pub mod pricing;
pub mod seat_map;
pub mod seating;

pub use position::SeatPosition;
pub use pricing::{quote, FareQuote};
pub use seat_map::{SeatMap, SeatMapError, SeatSelection, SeatState, SelectionChange, TripSource};
pub use seating::{GenderConstraintResolver, Neighbor, Verdict};
