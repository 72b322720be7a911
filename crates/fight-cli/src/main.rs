//! Ninja Fight terminal host.
//!
//! Loads a fight book, then either plays one encounter interactively against
//! a scripted opponent or runs automatic encounters between two strategies.
//!
//! ```bash
//! ninja-fight play --battle 1 --player 1 --opponent 2 --strategy turtle
//! ninja-fight simulate --player 1 --opponent 3 --runs 100
//! ninja-fight book
//! RUST_LOG=fight_logic=debug ninja-fight play --instant
//! ```

mod play;
mod simulate;
mod terminal;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fight_logic::{describe_strategy, EncounterConfig, FightBook, Strategy, StrategyBase};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ninja-fight")]
#[command(about = "Resource-gated two-combatant duels in the terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fight one encounter against a scripted opponent
    Play(play::PlayArgs),
    /// Run automatic encounters between two strategies
    Simulate(simulate::SimulateArgs),
    /// List the built-in opponent strategies
    Strategies,
    /// List the combatants and campaign battles of a fight book
    Book {
        #[arg(long)]
        book: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play::run(args),
        Commands::Simulate(args) => simulate::run(args),
        Commands::Strategies => {
            for base in StrategyBase::ALL {
                println!("{:<10} {}", base.as_str(), describe_strategy(&Strategy::new(base)));
            }
            Ok(())
        }
        Commands::Book { book } => {
            let path = book.unwrap_or_else(default_book);
            let (roster, campaign) = load_book(&path)?.into_providers()?;
            for combatant in roster.combatants() {
                println!(
                    "{:>3} {:<12} HP {:<4} CK {:<4} {} / {} / {}",
                    combatant.id,
                    combatant.name,
                    combatant.health.max,
                    combatant.energy.max,
                    combatant.attack.name,
                    combatant.defence.name,
                    combatant.special.name
                );
            }
            for battle in campaign.battles() {
                println!("battle {:>3} {}", battle.id, battle.title);
            }
            Ok(())
        }
    }
}

fn default_book() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data/book.json"))
}

fn load_book(path: &Path) -> Result<FightBook> {
    FightBook::load(path).with_context(|| format!("Failed to load fight book {}", path.display()))
}

/// Read an `EncounterConfig` from JSON, or fall back to the given preset
fn load_config(path: Option<&Path>, fallback: EncounterConfig) -> Result<EncounterConfig> {
    let Some(path) = path else {
        return Ok(fallback);
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_strategy(name: &str) -> Result<Strategy> {
    StrategyBase::from_name(name)
        .map(Strategy::new)
        .with_context(|| format!("Unknown strategy '{}', see `ninja-fight strategies`", name))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
