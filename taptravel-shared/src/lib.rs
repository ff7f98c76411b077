pub mod error;
pub mod models;
pub mod pii;

pub use error::BackendError;
pub use models::events::BookingEvent;
pub use models::gender::Gender;
pub use models::rider::RiderIdentity;
pub use models::trip::{BusDetails, Fare, RouteInfo, Seat, Trip};
pub use pii::Masked;
