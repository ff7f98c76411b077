use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use taptravel_app::run::plain_seat_chart;
use taptravel_app::{log_events, notice, run_booking, Cli, ConsolePaymentSheet, RunOptions};
use taptravel_core::payment::SheetGateway;
use taptravel_core::{rider_from_token, CoreError, IdentityError};
use taptravel_order::{BookingFlow, BookingOutcome};
use taptravel_shared::Masked;
use taptravel_store::{Config, HttpBookingBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taptravel=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;
    tracing::info!(backend = %config.backend.base_url, "Starting Tap & Travel client");

    let token = cli.token.map(Masked::new).or_else(|| config.rider.token.clone());
    let Some(token) = token else {
        anyhow::bail!("{}", notice(&CoreError::from(IdentityError::MissingToken)));
    };
    let rider = match rider_from_token(token.expose()) {
        Ok(rider) => rider,
        Err(e) => {
            tracing::error!(error = %e, "Session token rejected");
            anyhow::bail!("{}", notice(&e.into()));
        }
    };

    let backend = Arc::new(
        HttpBookingBackend::new(&config.backend, Some(token)).context("Failed to build HTTP client")?,
    );
    let sheet = Arc::new(ConsolePaymentSheet::stdio());
    let gateway = Arc::new(SheetGateway::new(
        backend.clone(),
        sheet,
        config.payment.merchant_display_name.clone(),
    ));

    let mut flow = BookingFlow::new(backend, gateway, rider);
    let events = log_events(flow.subscribe());

    if cli.show_seats {
        let trip = flow.load_trip(&cli.trip).await.map_err(|e| anyhow::anyhow!("{}", notice(&e)))?;
        println!("{}", trip.summary());
        if let Some(map) = flow.seat_map() {
            println!("{}", plain_seat_chart(map));
        }
        return Ok(());
    }

    let options = RunOptions {
        trip_id: cli.trip,
        seats: cli.seats,
        attempts: cli.attempts,
    };
    let result = run_booking(&mut flow, &options).await;

    drop(flow);
    let _ = events.await;

    match result {
        Ok(BookingOutcome::Booked(booking)) => {
            println!(
                "Booked seats {} on trip {} (paid {}).",
                booking.seat_numbers.join(", "),
                booking.trip_id,
                booking.amount
            );
            Ok(())
        }
        Ok(BookingOutcome::Cancelled) => {
            println!("Payment cancelled. No seats were booked.");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, category = ?e.category(), "Booking failed");
            anyhow::bail!("{}", notice(&e))
        }
    }
}
