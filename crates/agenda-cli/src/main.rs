//! `agenda` CLI: compute availability from business, staff and booking JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Unified schedule for a business + staff scenario
//! agenda merge -i scenario.json
//!
//! # Next 14 days with closure flags
//! agenda days -i scenario.json --from 2025-03-10
//!
//! # Base slot template for a date
//! agenda base-slots -i scenario.json --date 2025-03-14
//!
//! # Materialized slots for a day (owner view with --owner)
//! agenda slots -i scenario.json --date 2025-03-10 --now 2025-03-10T08:00:00
//!
//! # Bookable starts for a 60-minute service over a week
//! agenda availability -i scenario.json --from 2025-03-10 --days 7 --duration 60
//!
//! # Normalized bookings
//! agenda normalize -i scenario.json
//! ```
//!
//! A scenario is a JSON object with `business`, optional `staff` and optional
//! `bookings` (raw stored records). Results are printed as JSON on stdout;
//! logs go to stderr (`-v`, `-vv` or `RUST_LOG`).

use std::io::{self, Read};

use agenda_engine::bookings::{normalize_bookings_with, RawBookingRecord};
use agenda_engine::schedule::{
    merge_schedule_with, BusinessScheduleConfig, StaffScheduleOverride, UnifiedSchedule,
};
use agenda_engine::{time::coerce_to_date, EngineConfig};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "agenda",
    version,
    about = "Appointment availability engine CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with engine defaults
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct Input {
    /// Scenario JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the unified schedule
    Merge {
        #[command(flatten)]
        input: Input,
    },
    /// Enumerate bookable days with closure flags
    Days {
        #[command(flatten)]
        input: Input,
        /// First day (defaults to today in the configured timezone)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Number of days (defaults to the configured days_ahead)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print the base slot template
    BaseSlots {
        #[command(flatten)]
        input: Input,
        /// Apply half-day rest rules for this date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Normalize the scenario's bookings
    Normalize {
        #[command(flatten)]
        input: Input,
    },
    /// Materialize one day's slots
    Slots {
        #[command(flatten)]
        input: Input,
        /// Day to materialize
        #[arg(long)]
        date: NaiveDate,
        /// Current wall-clock time (defaults to now in the configured timezone)
        #[arg(long)]
        now: Option<String>,
        /// Slot step in minutes (defaults to the configured granularity)
        #[arg(long)]
        granularity: Option<u32>,
        /// Owner view: keep closed time visible
        #[arg(long)]
        owner: bool,
    },
    /// Bookable starts for a service over a range of days
    Availability {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        now: Option<String>,
        /// Service duration in minutes
        #[arg(long, default_value_t = 30)]
        duration: u32,
    },
}

/// Input document: business config, optional staff override, raw bookings.
#[derive(Deserialize)]
struct Scenario {
    business: BusinessScheduleConfig,
    #[serde(default)]
    staff: Option<StaffScheduleOverride>,
    #[serde(default)]
    bookings: Vec<RawBookingRecord>,
}

impl Scenario {
    fn schedule(&self, config: &EngineConfig) -> UnifiedSchedule {
        merge_schedule_with(&self.business, self.staff.as_ref(), config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.config.as_deref() {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => EngineConfig::default(),
    };
    tracing::debug!(?config, "engine config");

    let output = match cli.command {
        Commands::Merge { input } => {
            let scenario = read_scenario(&input)?;
            serde_json::to_value(scenario.schedule(&config))?
        }
        Commands::Days { input, from, days } => {
            let scenario = read_scenario(&input)?;
            let from = match from {
                Some(d) => d,
                None => wall_clock_now(&config)?.date(),
            };
            let days = days.unwrap_or(config.days_ahead);
            serde_json::to_value(agenda_engine::generate_day_range(
                &scenario.schedule(&config),
                days,
                from,
            ))?
        }
        Commands::BaseSlots { input, date } => {
            let scenario = read_scenario(&input)?;
            serde_json::to_value(agenda_engine::generate_base_slots(
                &scenario.schedule(&config),
                date,
            ))?
        }
        Commands::Normalize { input } => {
            let scenario = read_scenario(&input)?;
            serde_json::to_value(normalize_bookings_with(
                &scenario.bookings,
                config.default_booking_minutes,
            ))?
        }
        Commands::Slots {
            input,
            date,
            now,
            granularity,
            owner,
        } => {
            let scenario = read_scenario(&input)?;
            let schedule = scenario.schedule(&config);
            let bookings =
                normalize_bookings_with(&scenario.bookings, config.default_booking_minutes);
            let now = resolve_now(now.as_deref(), &config)?;
            let granularity = granularity.unwrap_or(config.slot_granularity_minutes);
            if granularity == 0 {
                anyhow::bail!("--granularity must be at least 1 minute");
            }

            let slots = if owner {
                agenda_engine::owner_day_view(&schedule, date, &bookings, now, granularity)
            } else {
                agenda_engine::materialize_day_slots(&schedule, date, &bookings, now, granularity)
            };
            serde_json::json!({
                "date": date,
                "closed": schedule.is_closed(date),
                "summary": agenda_engine::summarize_day(&slots),
                "slots": slots,
            })
        }
        Commands::Availability {
            input,
            from,
            days,
            now,
            duration,
        } => {
            let scenario = read_scenario(&input)?;
            let schedule = scenario.schedule(&config);
            let bookings =
                normalize_bookings_with(&scenario.bookings, config.default_booking_minutes);
            let now = resolve_now(now.as_deref(), &config)?;
            let range = agenda_engine::generate_day_range(
                &schedule,
                days.unwrap_or(config.days_ahead),
                from.unwrap_or(now.date()),
            );
            if !agenda_engine::has_slot_template(&schedule) {
                tracing::warn!("no availability configured for this schedule");
            }
            serde_json::to_value(agenda_engine::availability_for_range(
                &schedule, &range, &bookings, now, duration,
            ))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Current wall-clock time in the configured timezone.
fn wall_clock_now(config: &EngineConfig) -> Result<NaiveDateTime> {
    let tz = config.tz()?;
    Ok(Utc::now().with_timezone(&tz).naive_local())
}

fn resolve_now(now: Option<&str>, config: &EngineConfig) -> Result<NaiveDateTime> {
    match now {
        Some(raw) => coerce_to_date(&serde_json::Value::String(raw.to_string()))
            .with_context(|| format!("Invalid --now value: {}", raw)),
        None => wall_clock_now(config),
    }
}

fn read_scenario(input: &Input) -> Result<Scenario> {
    let text = match input.input.as_deref() {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("Failed to parse scenario JSON")
}
