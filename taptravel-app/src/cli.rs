use clap::Parser;
use std::str::FromStr;
use taptravel_shared::models::gender::UnknownGender;
use taptravel_shared::Gender;

/// Tap & Travel booking client
#[derive(Parser, Debug)]
#[command(name = "taptravel")]
#[command(about = "Book seats on a Tap & Travel bus trip", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Trip (bus) id to book on
    #[arg(short, long)]
    pub trip: String,

    /// Seat to book with the rider's gender, e.g. `R1-2=F`. Repeatable.
    #[arg(short, long = "seat")]
    pub seats: Vec<SeatRequest>,

    /// Session token; takes precedence over `rider.token` in the config
    #[arg(long, env = "TAPTRAVEL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// How many times the payment sheet is offered before giving up
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Print the seat map and exit without booking
    #[arg(long)]
    pub show_seats: bool,
}

/// One `--seat` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRequest {
    pub seat_number: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatRequestError {
    #[error("expected <seat>=<gender>, got `{0}`")]
    Format(String),

    #[error(transparent)]
    Gender(#[from] UnknownGender),
}

impl FromStr for SeatRequest {
    type Err = SeatRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (seat, gender) = s
            .split_once('=')
            .ok_or_else(|| SeatRequestError::Format(s.to_string()))?;
        let seat = seat.trim();
        if seat.is_empty() {
            return Err(SeatRequestError::Format(s.to_string()));
        }
        Ok(Self {
            seat_number: seat.to_string(),
            gender: gender.trim().parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seat_request() {
        let req: SeatRequest = "R1-2=F".parse().unwrap();
        assert_eq!(req.seat_number, "R1-2");
        assert_eq!(req.gender, Gender::Female);

        let req: SeatRequest = "R3-1 = male".parse().unwrap();
        assert_eq!(req.gender, Gender::Male);

        assert!(matches!("R1-2".parse::<SeatRequest>(), Err(SeatRequestError::Format(_))));
        assert!(matches!("=F".parse::<SeatRequest>(), Err(SeatRequestError::Format(_))));
        assert!(matches!("R1-2=X".parse::<SeatRequest>(), Err(SeatRequestError::Gender(_))));
    }

    #[test]
    fn test_cli_args() {
        let cli = Cli::try_parse_from([
            "taptravel", "--trip", "bus-7", "--seat", "R1-2=F", "--seat", "R2-1=M",
        ])
        .unwrap();

        assert_eq!(cli.trip, "bus-7");
        assert_eq!(cli.seats.len(), 2);
        assert_eq!(cli.attempts, 3);
        assert!(!cli.show_seats);

        assert!(Cli::try_parse_from(["taptravel", "--trip", "bus-7", "--seat", "oops"]).is_err());
        assert!(Cli::try_parse_from(["taptravel"]).is_err());
    }
}
