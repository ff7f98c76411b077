pub mod cli;
pub mod console_sheet;
pub mod notice;
pub mod run;

pub use cli::{Cli, SeatRequest};
pub use console_sheet::ConsolePaymentSheet;
pub use notice::{notice, Notice};
pub use run::{log_events, run_booking, seat_chart, RunOptions};
