pub mod events;
pub mod gender;
pub mod rider;
pub mod trip;
