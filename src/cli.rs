use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{AppConfig, ConfigStore};
use crate::db;
use crate::models::{BookingDraft, EventDraft, EventId, EventPatch};
use crate::service::EventService;
use crate::store::{MemoryStore, RecordStore};
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(name = "event-booking")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage events and bookings", long_about = None)]
pub struct Cli {
    /// Use a throwaway in-memory store instead of the database
    #[arg(long, global = true)]
    pub memory: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert the sample events if no events exist yet
    Seed,
    /// List all events
    Events,
    /// Show one event by slug
    Event { slug: String },
    /// Create an event from a JSON file of raw attributes
    CreateEvent { file: PathBuf },
    /// Apply a JSON patch file to an event
    UpdateEvent { id: String, file: PathBuf },
    /// Book a seat on an event
    Book {
        event_id: String,
        email: String,
    },
    /// List bookings for an event
    Bookings { event_id: String },
    /// Inspect or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    Show,
    SetTimezone { timezone: String },
    SetDatabase { path: PathBuf },
}

pub async fn run(cli: Cli) -> Result<()> {
    let config_store = ConfigStore::load();
    let config = config_store.read()?;

    telemetry::init_tracing(&config, cli.verbose, cli.json_logs);

    if let Commands::Config { action } = &cli.command {
        return run_config(&config_store, action);
    }

    let service = open_service(&config, cli.memory).await?;
    match cli.command {
        Commands::Seed => {
            let inserted = service.seed_samples().await?;
            print_json(&serde_json::json!({ "inserted": inserted }))
        }
        Commands::Events => print_json(&service.list_events().await?),
        Commands::Event { slug } => {
            let event = service
                .event_by_slug(&slug)
                .await?
                .with_context(|| format!("no event with slug {slug}"))?;
            print_json(&event)
        }
        Commands::CreateEvent { file } => {
            let draft: EventDraft = read_json(&file)?;
            print_json(&service.create_event(draft).await?)
        }
        Commands::UpdateEvent { id, file } => {
            let patch: EventPatch = read_json(&file)?;
            print_json(&service.update_event(&EventId(id), patch).await?)
        }
        Commands::Book { event_id, email } => {
            let booking = service
                .create_booking(BookingDraft { event_id, email })
                .await?;
            print_json(&booking)
        }
        Commands::Bookings { event_id } => {
            print_json(&service.bookings_for_event(&EventId(event_id)).await?)
        }
        Commands::Config { .. } => Ok(()),
    }
}

async fn open_service(config: &AppConfig, memory: bool) -> Result<EventService> {
    let store: Arc<dyn RecordStore> = if memory {
        Arc::new(MemoryStore::new())
    } else {
        db::connect(config)
            .await
            .with_context(|| format!("opening {}", config.database_path().display()))?
    };
    Ok(EventService::new(store, config.timezone()))
}

fn run_config(store: &ConfigStore, action: &ConfigAction) -> Result<()> {
    let updated = match action {
        ConfigAction::Show => store.read()?,
        ConfigAction::SetTimezone { timezone } => {
            timezone
                .parse::<chrono_tz::Tz>()
                .map_err(|err| anyhow::anyhow!("unknown timezone {timezone}: {err}"))?;
            store.update(|config| config.timezone = Some(timezone.clone()))?
        }
        ConfigAction::SetDatabase { path } => {
            store.update(|config| config.database_path = Some(path.clone()))?
        }
    };
    print_json(&updated)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_book_command() {
        let cli = Cli::try_parse_from(["event-booking", "--memory", "book", "abc", "a@b.io"])
            .expect("valid args");
        assert!(cli.memory);
        assert!(matches!(
            cli.command,
            Commands::Book { ref event_id, ref email } if event_id == "abc" && email == "a@b.io"
        ));
    }

    #[test]
    fn parses_config_subcommand() {
        let cli = Cli::try_parse_from(["event-booking", "config", "set-timezone", "Europe/Paris"])
            .expect("valid args");
        assert!(matches!(
            cli.command,
            Commands::Config { action: ConfigAction::SetTimezone { ref timezone } } if timezone == "Europe/Paris"
        ));
    }
}
