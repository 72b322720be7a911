//! Fight Logic for Ninja Fight
//!
//! Core encounter logic for the two-combatant duel.
//! This crate is compiled to:
//! - Native (for the terminal host and simulations)
//! - WASM (for the browser fight screen)

mod action;
mod combatant;
mod config;
mod engine;
mod error;
mod pool;
mod random;
mod roster;
mod schedule;
mod session;
mod sink;
mod strategy;

#[cfg(feature = "wasm")]
mod wasm;

pub use action::{Action, ActionKind, Affordability};
pub use combatant::{Combatant, CombatantId};
pub use config::{EncounterConfig, Pacing};
pub use engine::{
    judge, run_encounter, Encounter, EncounterResult, EncounterState, EndReason, Outcome, Phase,
    RoundReport,
};
pub use error::{BookError, EncounterError, Side};
pub use pool::ResourcePool;
pub use random::SeededRng;
pub use roster::{
    BattleContext, BattleId, Campaign, CampaignBook, CombatantEntry, FightBook, MoveEntry, Roster,
    RosterBook,
};
pub use schedule::{EncounterKey, Scheduler, TaskId};
pub use session::{Session, SessionError, Step};
pub use sink::{
    Conclusion, EncounterEvent, NullSink, PresentationSink, RecordingSink, Route, TracingSink,
};
pub use strategy::{
    describe_strategy, DecisionView, OpponentDecision, Strategy, StrategyBase, StrategyOracle,
    StrategyParams,
};

/// Damage exchanged by one pair of moves
/// Returns (damage_to_opponent, damage_to_player)
///
/// Defence blocks whatever the other side throws; it never stops the
/// defender's own move. Skip neither hits nor blocks.
pub fn exchange(player: &Action, opponent: &Action) -> (u32, u32) {
    (landed(player, opponent), landed(opponent, player))
}

fn landed(attacker: &Action, defender: &Action) -> u32 {
    if attacker.kind.is_offensive() && defender.kind != ActionKind::Defence {
        attacker.damage
    } else {
        0
    }
}
