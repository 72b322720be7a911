//! Error types for encounter play

use crate::action::ActionKind;
use crate::combatant::CombatantId;
use crate::engine::Phase;

/// Which side of the encounter a lookup was for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Opponent => "opponent",
        }
    }
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the encounter engine.
///
/// `InvalidChoice`, `WrongPhase` and `EncounterOver` leave the encounter
/// untouched. `InvalidOpponentDecision` is never returned from an operation:
/// it is reported to the sink and the round continues with a skip.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncounterError {
    #[error("player cannot choose {kind}: {reason}")]
    InvalidChoice { kind: ActionKind, reason: &'static str },

    #[error("opponent oracle returned unrecognized move {label:?}")]
    InvalidOpponentDecision { label: String },

    #[error("{side} combatant {id} not found in roster")]
    NotFound { side: Side, id: CombatantId },

    #[error("operation requires {expected:?} phase, encounter is in {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("encounter already ended ({0:?})")]
    EncounterOver(Phase),
}

/// Errors from loading a fight book
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("failed to read fight book: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid fight book: {0}")]
    Json(#[from] serde_json::Error),

    #[error("combatant id {0} listed twice")]
    DuplicateCombatant(CombatantId),

    #[error("battle id {0} listed twice")]
    DuplicateBattle(u32),
}
