pub mod checkout;
pub mod fulfillment;
pub mod models;
pub mod orchestrator;
pub mod session;

pub use checkout::{BookingFlow, BookingOutcome};
pub use fulfillment::{IssuanceRequest, PendingIssuance, TicketIssuer};
pub use models::{IssuedBooking, PaymentOutcome, PaymentReceipt, PaymentState, SelectedSeat};
pub use orchestrator::PaymentOrchestrator;
pub use session::{BookingSession, SessionError};
