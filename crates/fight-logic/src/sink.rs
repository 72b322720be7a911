//! Presentation sink: where the engine pushes phases, rounds and results

use serde::{Deserialize, Serialize};
use crate::action::{Action, Affordability};
use crate::combatant::CombatantId;
use crate::engine::{Outcome, Phase, RoundReport};
use crate::roster::BattleId;

/// Notification pushed to the presentation layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterEvent {
    /// A phase was entered. Affordability is all-false outside `PlayerChoice`.
    PhaseEntered {
        phase: Phase,
        round: u32,
        affordability: Affordability,
    },
    PlayerChose { round: u32, action: Action },
    OpponentChose { round: u32, action: Action },
    /// The oracle answered with a label nobody understands; played as a skip
    OpponentDecisionRejected { round: u32, label: String },
    RoundResolved(RoundReport),
    Concluded(Conclusion),
}

/// Terminal summary with everything needed to leave the fight screen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conclusion {
    pub battle_id: BattleId,
    pub player_id: CombatantId,
    pub opponent_id: CombatantId,
    pub outcome: Outcome,
    pub rounds: u32,
    pub route: Route,
}

/// Post-encounter destination
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    FightResult {
        battle_id: BattleId,
        player_id: CombatantId,
        opponent_id: CombatantId,
        outcome: Outcome,
    },
    /// The final campaign battle was won
    CampaignEnd,
}

impl Route {
    pub fn for_outcome(
        battle_id: BattleId,
        player_id: CombatantId,
        opponent_id: CombatantId,
        outcome: Outcome,
        last_battle: bool,
    ) -> Self {
        if outcome == Outcome::Won && last_battle {
            Route::CampaignEnd
        } else {
            Route::FightResult {
                battle_id,
                player_id,
                opponent_id,
                outcome,
            }
        }
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Route::CampaignEnd => f.write_str("/story/end"),
            Route::FightResult {
                battle_id,
                player_id,
                opponent_id,
                outcome,
            } => write!(
                f,
                "/story/fight-result/{}/{}/{}/{}",
                battle_id,
                player_id,
                opponent_id,
                outcome.as_str()
            ),
        }
    }
}

/// Receiver of encounter notifications.
///
/// All calls are fire-and-forget: implementations must not block and cannot
/// refuse an event.
pub trait PresentationSink {
    fn notify(&mut self, event: &EncounterEvent);

    /// Play an audio cue
    fn play_cue(&mut self, _cue: &str) {}

    /// Leave the fight screen
    fn navigate(&mut self, _route: &Route) {}
}

impl<S: PresentationSink + ?Sized> PresentationSink for &mut S {
    fn notify(&mut self, event: &EncounterEvent) {
        (**self).notify(event)
    }

    fn play_cue(&mut self, cue: &str) {
        (**self).play_cue(cue)
    }

    fn navigate(&mut self, route: &Route) {
        (**self).navigate(route)
    }
}

impl<S: PresentationSink + ?Sized> PresentationSink for Box<S> {
    fn notify(&mut self, event: &EncounterEvent) {
        (**self).notify(event)
    }

    fn play_cue(&mut self, cue: &str) {
        (**self).play_cue(cue)
    }

    fn navigate(&mut self, route: &Route) {
        (**self).navigate(route)
    }
}

/// Fan-out: both sinks see every call, first one first
impl<A: PresentationSink, B: PresentationSink> PresentationSink for (A, B) {
    fn notify(&mut self, event: &EncounterEvent) {
        self.0.notify(event);
        self.1.notify(event);
    }

    fn play_cue(&mut self, cue: &str) {
        self.0.play_cue(cue);
        self.1.play_cue(cue);
    }

    fn navigate(&mut self, route: &Route) {
        self.0.navigate(route);
        self.1.navigate(route);
    }
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn notify(&mut self, _event: &EncounterEvent) {}
}

/// Keeps everything it is told, in order
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<EncounterEvent>,
    pub cues: Vec<String>,
    pub routes: Vec<Route>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent affordability announced for the player-choice phase
    pub fn last_affordability(&self) -> Option<Affordability> {
        self.events.iter().rev().find_map(|event| match event {
            EncounterEvent::PhaseEntered {
                phase: Phase::PlayerChoice,
                affordability,
                ..
            } => Some(*affordability),
            _ => None,
        })
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events
            .iter()
            .filter_map(|event| match event {
                EncounterEvent::PhaseEntered { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.events.iter().find_map(|event| match event {
            EncounterEvent::Concluded(conclusion) => Some(conclusion),
            _ => None,
        })
    }
}

impl PresentationSink for RecordingSink {
    fn notify(&mut self, event: &EncounterEvent) {
        self.events.push(event.clone());
    }

    fn play_cue(&mut self, cue: &str) {
        self.cues.push(cue.to_string());
    }

    fn navigate(&mut self, route: &Route) {
        self.routes.push(route.clone());
    }
}

/// Writes every notification to the `tracing` subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn notify(&mut self, event: &EncounterEvent) {
        match event {
            EncounterEvent::PhaseEntered { phase, round, affordability } => {
                tracing::info!(round, ?affordability, "{}", phase.title());
            }
            EncounterEvent::PlayerChose { round, action } => {
                tracing::info!(round, kind = %action.kind, "player plays {}", action.name);
            }
            EncounterEvent::OpponentChose { round, action } => {
                tracing::info!(round, kind = %action.kind, "opponent plays {}", action.name);
            }
            EncounterEvent::OpponentDecisionRejected { round, label } => {
                tracing::warn!(round, label = %label, "opponent decision rejected");
            }
            EncounterEvent::RoundResolved(report) => {
                tracing::info!(
                    round = report.round,
                    damage_to_player = report.damage_to_player,
                    damage_to_opponent = report.damage_to_opponent,
                    player_health = %report.player_health,
                    opponent_health = %report.opponent_health,
                    "round resolved"
                );
            }
            EncounterEvent::Concluded(conclusion) => {
                tracing::info!(
                    outcome = conclusion.outcome.as_str(),
                    rounds = conclusion.rounds,
                    route = %conclusion.route,
                    "encounter concluded"
                );
            }
        }
    }

    fn play_cue(&mut self, cue: &str) {
        tracing::debug!(cue, "play cue");
    }

    fn navigate(&mut self, route: &Route) {
        tracing::info!(route = %route, "navigate");
    }
}
