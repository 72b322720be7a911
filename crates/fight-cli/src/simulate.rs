//! Automatic encounters between two strategies

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fight_logic::{
    run_encounter, CombatantId, EncounterConfig, EncounterResult, EndReason, Outcome, Roster,
    StrategyOracle,
};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Fight book with the roster
    #[arg(long)]
    book: Option<PathBuf>,

    /// Player combatant id
    #[arg(long, default_value_t = 1)]
    player: CombatantId,

    /// Opponent combatant id
    #[arg(long, default_value_t = 2)]
    opponent: CombatantId,

    /// Strategy driving the player
    #[arg(long, default_value = "aggressor")]
    player_strategy: String,

    /// Strategy driving the opponent
    #[arg(long, default_value = "random")]
    opponent_strategy: String,

    /// Seed of the first run; run `i` uses `seed + i`
    #[arg(long)]
    seed: Option<u64>,

    /// Number of encounters to run
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Round cap per encounter
    #[arg(long)]
    max_rounds: Option<u32>,

    /// JSON file with an encounter config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each result as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    won: u32,
    lost: u32,
    draw: u32,
    capped: u32,
    stalled: u32,
    rounds: u64,
}

impl Tally {
    fn record(&mut self, result: &EncounterResult) {
        self.rounds += u64::from(result.round_count());
        match (result.outcome, result.end) {
            (Some(Outcome::Won), _) => self.won += 1,
            (Some(Outcome::Lost), _) => self.lost += 1,
            (Some(Outcome::Draw), _) => self.draw += 1,
            (None, EndReason::Stalled) => self.stalled += 1,
            (None, _) => self.capped += 1,
        }
    }

    fn total(&self) -> u32 {
        self.won + self.lost + self.draw + self.capped + self.stalled
    }
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let book_path = args.book.unwrap_or_else(crate::default_book);
    let (roster, _) = crate::load_book(&book_path)?.into_providers()?;
    let mut config = crate::load_config(args.config.as_deref(), EncounterConfig::instant())?;
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }

    let player = roster
        .combatant(args.player)
        .with_context(|| format!("No combatant {} in the fight book", args.player))?;
    let opponent = roster
        .combatant(args.opponent)
        .with_context(|| format!("No combatant {} in the fight book", args.opponent))?;
    let player_strategy = crate::parse_strategy(&args.player_strategy)?;
    let opponent_strategy = crate::parse_strategy(&args.opponent_strategy)?;
    let seed = args.seed.unwrap_or_else(crate::clock_seed);

    let mut tally = Tally::default();
    for i in 0..args.runs {
        let run_seed = seed.wrapping_add(u64::from(i));
        let mut player_oracle = StrategyOracle::new(player_strategy, run_seed, 0);
        let mut opponent_oracle = StrategyOracle::new(opponent_strategy, run_seed, 1);

        let result = run_encounter(
            player.clone(),
            opponent.clone(),
            &mut player_oracle,
            &mut opponent_oracle,
            &config,
        )?;
        tracing::debug!(seed = run_seed, rounds = result.round_count(), end = ?result.end, "run finished");

        if args.json {
            println!("{}", serde_json::to_string(&result)?);
        }
        tally.record(&result);
    }

    if !args.json {
        println!(
            "{} ({}) vs {} ({}), {} runs from seed {}",
            player.name,
            player_strategy.base.as_str(),
            opponent.name,
            opponent_strategy.base.as_str(),
            tally.total(),
            seed
        );
        println!(
            "won {}  lost {}  draw {}  capped {}  stalled {}",
            tally.won, tally.lost, tally.draw, tally.capped, tally.stalled
        );
        if tally.total() > 0 {
            println!("average rounds {:.1}", tally.rounds as f64 / f64::from(tally.total()));
        }
    }
    Ok(())
}
