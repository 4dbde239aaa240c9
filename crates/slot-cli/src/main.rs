//! `slots` CLI: publish availability, list free slots and manage bookings from
//! the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Open two ranges on a date
//! slots publish --talent t-1 --date 2099-01-02 --range 09:00-11:00 --range 14:00-15:00
//!
//! # Free and booked 30-minute slots, as JSON
//! slots free-slots --talent t-1 --duration 30
//!
//! # Book a slot
//! slots book --talent t-1 --user u-1 --card c-1 --card-title "Intro call" \
//!     --duration 30 --date 2099-01-02 --slot 09:00-09:30
//!
//! # Cancel it again
//! slots update-booking --id <BOOKING_ID> --status Cancelled
//! ```
//!
//! State lives in a JSON file (`state_file` in the config); mutating commands hold
//! an exclusive lock on `<state_file>.lock` while they run. Logs go to stderr and
//! are filtered with `RUST_LOG`.

mod config;
mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slot_engine::{
    AvailabilityService, BookingPatch, BookingStatus, DateSlots, EngineError, ErrorKind,
    FixedClock, NewBooking, PaymentStatus, SessionType, TimeRange,
};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Talent availability and booking engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file (ignored if missing)
    #[arg(long, global = true, default_value = "slots.yaml")]
    config: PathBuf,

    /// State file, overriding `state_file` from the configuration
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Treat this local time (YYYY-MM-DDTHH:MM) as the current time
    #[arg(long, global = true)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add availability ranges to a talent's date
    Publish {
        #[arg(long)]
        talent: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Range as HH:MM-HH:MM (repeatable)
        #[arg(long = "range", required = true)]
        ranges: Vec<TimeRange>,
    },
    /// List free and booked slots of a given length for a talent
    FreeSlots {
        #[arg(long)]
        talent: String,
        /// Slot length in minutes
        #[arg(long)]
        duration: i64,
    },
    /// Book one or more slots on a date
    Book {
        #[arg(long)]
        talent: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        card: String,
        #[arg(long)]
        card_title: String,
        /// Length of every booked slot, in minutes
        #[arg(long)]
        duration: u32,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Slot as HH:MM-HH:MM (repeatable)
        #[arg(long = "slot", required = true)]
        slots: Vec<String>,
        /// CoffeeCall or Regular
        #[arg(long, value_parser = parse_variant::<SessionType>)]
        session_type: Option<SessionType>,
        /// Paid or Pending
        #[arg(long, value_parser = parse_variant::<PaymentStatus>)]
        payment_status: Option<PaymentStatus>,
        #[arg(long)]
        special_requests: Option<String>,
    },
    /// Change the status, payment status or notes of a booking
    UpdateBooking {
        #[arg(long)]
        id: String,
        /// Accepted, Declined, Completed or Cancelled
        #[arg(long, value_parser = parse_variant::<BookingStatus>)]
        status: Option<BookingStatus>,
        #[arg(long, value_parser = parse_variant::<PaymentStatus>)]
        payment_status: Option<PaymentStatus>,
        /// New notes; an empty string clears them
        #[arg(long)]
        special_requests: Option<String>,
    },
    /// Show the stored availability windows of a talent
    Windows {
        #[arg(long)]
        talent: String,
    },
    /// List bookings of a talent or of a user
    Bookings {
        #[arg(long, required_unless_present = "user", conflicts_with = "user")]
        talent: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

impl Commands {
    fn mutates_state(&self) -> bool {
        matches!(
            self,
            Commands::Publish { .. } | Commands::Book { .. } | Commands::UpdateBooking { .. }
        )
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration: {}", cli.config.display()))?;
    let state_file = cli.state.unwrap_or_else(|| config.state_file.clone());
    let now = cli.now.as_deref().map(parse_now).transpose()?;

    if cli.command.mutates_state() {
        // Other processes must not interleave between loading and saving.
        state::with_lock(&state_file, || execute(cli.command, &config, &state_file, now))
    } else {
        execute(cli.command, &config, &state_file, now)
    }
}

fn execute(
    command: Commands,
    config: &CliConfig,
    state_file: &Path,
    now: Option<NaiveDateTime>,
) -> Result<()> {
    let store = state::load(state_file)?;
    let mut service = AvailabilityService::in_memory(store.clone(), config.engine.clone())?;
    if let Some(now) = now {
        service = service.with_clock(Arc::new(FixedClock::new(now, config.engine.tz()?)));
    }

    match command {
        Commands::Publish {
            talent,
            date,
            ranges,
        } => {
            let window = service.publish_availability(&talent, &date, &ranges)?;
            state::save(state_file, &store)?;
            print_json(&window)?;
        }
        Commands::FreeSlots { talent, duration } => {
            print_json(&service.query_free_slots(&talent, duration)?)?;
        }
        Commands::Book {
            talent,
            user,
            card,
            card_title,
            duration,
            date,
            slots,
            session_type,
            payment_status,
            special_requests,
        } => {
            let request = NewBooking {
                talent_id: talent,
                user_id: user,
                card_id: card,
                card_title,
                session_type: session_type.unwrap_or_default(),
                payment_status: payment_status.unwrap_or_default(),
                special_requests,
                card_duration: duration,
                slots: vec![DateSlots {
                    booking_date: date,
                    time_slots: slots,
                }],
            };
            let created = service.create_booking(request)?;
            state::save(state_file, &store)?;
            print_json(&created)?;
        }
        Commands::UpdateBooking {
            id,
            status,
            payment_status,
            special_requests,
        } => {
            let patch = BookingPatch {
                status,
                payment_status,
                special_requests,
            };
            let booking = service.update_booking(&id, &patch)?;
            state::save(state_file, &store)?;
            print_json(&booking)?;
        }
        Commands::Windows { talent } => {
            print_json(&service.list_windows(&talent)?)?;
        }
        Commands::Bookings { talent, user } => {
            let bookings = match (talent, user) {
                (Some(talent), _) => service.bookings_for_talent(&talent)?,
                (None, Some(user)) => service.bookings_for_user(&user)?,
                (None, None) => anyhow::bail!("Either --talent or --user is required"),
            };
            print_json(&bookings)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status per engine error class; other failures exit with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EngineError>().map(EngineError::kind) {
        Some(ErrorKind::Validation) => 3,
        Some(ErrorKind::Collision) => 4,
        Some(ErrorKind::NotFound) => 5,
        Some(ErrorKind::Store) => 6,
        None => 1,
    }
}

fn parse_now(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .with_context(|| format!("Invalid --now '{}': expected YYYY-MM-DDTHH:MM", value))
}

/// Parse an enum from its JSON variant name, e.g. `Cancelled` or `CoffeeCall`.
fn parse_variant<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown value '{}'", value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
