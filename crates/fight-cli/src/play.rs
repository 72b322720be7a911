//! Interactive encounter against a scripted opponent

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Args;
use fight_logic::{
    ActionKind, BattleId, CombatantId, Encounter, EncounterConfig, EncounterError, Pacing,
    Session, SessionError, StrategyOracle, TracingSink,
};

use crate::terminal::{self, TerminalSink};

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Fight book with the roster and campaign battles
    #[arg(long)]
    book: Option<PathBuf>,

    /// Campaign battle id; unknown ids start a standalone fight
    #[arg(long, default_value_t = 1)]
    battle: BattleId,

    /// Your combatant's id
    #[arg(long, default_value_t = 1)]
    player: CombatantId,

    /// Opponent's combatant id
    #[arg(long, default_value_t = 2)]
    opponent: CombatantId,

    /// Opponent strategy name
    #[arg(long, default_value = "random")]
    strategy: String,

    /// Random seed for the opponent
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the presentation pauses
    #[arg(long)]
    instant: bool,

    /// JSON file with an encounter config (pacing and round cap)
    #[arg(long)]
    config: Option<PathBuf>,
}

enum Input {
    Move(ActionKind),
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "1" => Input::Move(ActionKind::Attack),
        "2" => Input::Move(ActionKind::Defence),
        "3" => Input::Move(ActionKind::Special),
        "q" | "quit" => Input::Quit,
        other => match ActionKind::from_label(other) {
            Some(kind) if kind != ActionKind::Skip => Input::Move(kind),
            _ => Input::Unknown,
        },
    }
}

pub fn run(args: PlayArgs) -> Result<()> {
    let book_path = args.book.unwrap_or_else(crate::default_book);
    let (roster, campaign) = crate::load_book(&book_path)?.into_providers()?;
    let config = crate::load_config(args.config.as_deref(), EncounterConfig::standard())?;
    let pacing = if args.instant { Pacing::instant() } else { config.pacing };

    let strategy = crate::parse_strategy(&args.strategy)?;
    let seed = args.seed.unwrap_or_else(crate::clock_seed);
    tracing::info!(seed, strategy = strategy.base.as_str(), "opponent ready");

    let encounter = Encounter::from_providers(
        &roster,
        &campaign,
        args.battle,
        args.player,
        args.opponent,
        (TerminalSink::default(), TracingSink),
    )?;
    println!(
        "{}: {} vs {}",
        encounter.battle().title,
        encounter.player().name,
        encounter.opponent().name
    );

    let mut session = Session::new(encounter, StrategyOracle::new(strategy, seed, 1), pacing);
    tracing::info!(
        think_ms = session.pacing().opponent_think_ms,
        round_result_ms = session.pacing().round_result_ms,
        "pacing"
    );
    let clock = Instant::now();
    let mut lines = io::stdin().lock().lines();

    loop {
        session.tick(clock.elapsed())?;
        if session.is_finished() {
            break;
        }
        if let Some(due) = session.next_due() {
            thread::sleep(due.saturating_sub(clock.elapsed()));
            continue;
        }
        if !session.is_accepting() {
            bail!("encounter stopped in {:?} with nothing pending", session.encounter().phase());
        }

        let encounter = session.encounter();
        let affordability = encounter.affordability();
        println!("{}", terminal::status(encounter.player()));
        println!("{}", terminal::status(encounter.opponent()));
        if let Some(note) = terminal::stalled_note(encounter.player(), affordability) {
            println!("{}", note);
            session.abandon();
            break;
        }
        println!("{}", terminal::menu(encounter.player(), affordability));
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            session.abandon();
            break;
        };
        let kind = match parse_input(&line) {
            Input::Move(kind) => kind,
            Input::Quit => {
                session.abandon();
                break;
            }
            Input::Unknown => {
                println!("Choose 1, 2 or 3 (or q to quit).");
                continue;
            }
        };

        match session.submit(kind, clock.elapsed()) {
            Ok(_) => {}
            Err(SessionError::Encounter(err @ EncounterError::InvalidChoice { .. })) => {
                println!("{}", err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if session.is_abandoned() {
        println!("Fight abandoned.");
    }
    Ok(())
}
