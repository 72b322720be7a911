//! Encounter execution engine

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use crate::action::{Action, ActionKind, Affordability};
use crate::combatant::{Combatant, CombatantId};
use crate::config::EncounterConfig;
use crate::error::{EncounterError, Side};
use crate::exchange;
use crate::pool::ResourcePool;
use crate::roster::{BattleContext, BattleId, Campaign, Roster};
use crate::sink::{Conclusion, EncounterEvent, NullSink, PresentationSink, Route};
use crate::strategy::{DecisionView, OpponentDecision};

/// Terminal result, from the player's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
    Draw,
}

impl Outcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
            Outcome::Draw => "draw",
        }
    }
}

/// Encounter state machine
///
/// `PlayerChoice -> OpponentChoice -> Resolution -> PlayerChoice | Won | Lost | Draw`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    PlayerChoice,
    OpponentChoice,
    Resolution,
    Won,
    Lost,
    Draw,
}

impl Phase {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Phase::Won | Phase::Lost | Phase::Draw)
    }

    pub const fn outcome(&self) -> Option<Outcome> {
        match self {
            Phase::Won => Some(Outcome::Won),
            Phase::Lost => Some(Outcome::Lost),
            Phase::Draw => Some(Outcome::Draw),
            _ => None,
        }
    }

    /// Banner shown while the phase is active
    pub const fn title(&self) -> &'static str {
        match self {
            Phase::PlayerChoice => "Your turn",
            Phase::OpponentChoice => "Opponent's turn",
            Phase::Resolution => "Result of this turn",
            Phase::Won => "You won",
            Phase::Lost => "You lost",
            Phase::Draw => "Draw",
        }
    }
}

impl From<Outcome> for Phase {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won => Phase::Won,
            Outcome::Lost => Phase::Lost,
            Outcome::Draw => Phase::Draw,
        }
    }
}

/// The only mutable state across rounds besides the combatants' pools
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub phase: Phase,
    /// 1-based, advances when a round ends without a result
    pub round: u32,
    pub player_choice: Option<Action>,
    pub opponent_choice: Option<Action>,
}

impl Default for EncounterState {
    fn default() -> Self {
        Self {
            phase: Phase::PlayerChoice,
            round: 1,
            player_choice: None,
            opponent_choice: None,
        }
    }
}

/// What happened in one resolved round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub player_choice: Action,
    pub opponent_choice: Action,
    pub player_spent: u32,
    pub opponent_spent: u32,
    pub damage_to_player: u32,
    pub damage_to_opponent: u32,
    pub player_health: ResourcePool,
    pub player_energy: ResourcePool,
    pub opponent_health: ResourcePool,
    pub opponent_energy: ResourcePool,
    pub outcome: Option<Outcome>,
}

/// Termination rules, first match wins.
///
/// Health is checked before chakra. When both sides run dry together the
/// healthier one wins.
pub fn judge(player: &Combatant, opponent: &Combatant) -> Option<Outcome> {
    match (player.health.is_depleted(), opponent.health.is_depleted()) {
        (true, false) => return Some(Outcome::Lost),
        (false, true) => return Some(Outcome::Won),
        (true, true) => return Some(Outcome::Draw),
        (false, false) => {}
    }

    match (player.energy.is_depleted(), opponent.energy.is_depleted()) {
        (true, false) => Some(Outcome::Lost),
        (false, true) => Some(Outcome::Won),
        (true, true) => Some(match player.health.now.cmp(&opponent.health.now) {
            Ordering::Greater => Outcome::Won,
            Ordering::Less => Outcome::Lost,
            Ordering::Equal => Outcome::Draw,
        }),
        (false, false) => None,
    }
}

/// One encounter between a player and an opponent.
///
/// Every operation is synchronous. Callers serialize access; there is one
/// instance per live encounter.
#[derive(Debug)]
pub struct Encounter<S = NullSink> {
    battle: BattleContext,
    last_battle: bool,
    player: Combatant,
    opponent: Combatant,
    state: EncounterState,
    player_last: Option<ActionKind>,
    opponent_last: Option<ActionKind>,
    conclusion: Option<Conclusion>,
    /// Leave the next round unannounced until `enter_player_choice_phase`
    round_opening_deferred: bool,
    sink: S,
}

impl<S: PresentationSink> Encounter<S> {
    /// Standalone encounter outside any campaign
    pub fn new(player: Combatant, opponent: Combatant, sink: S) -> Self {
        Self::for_battle(BattleContext::standalone(), false, player, opponent, sink)
    }

    /// Encounter for a campaign battle. Opens the first player-choice phase.
    pub fn for_battle(
        battle: BattleContext,
        last_battle: bool,
        player: Combatant,
        opponent: Combatant,
        sink: S,
    ) -> Self {
        tracing::debug!(
            battle = battle.id,
            player = player.id,
            opponent = opponent.id,
            last_battle,
            "encounter created"
        );
        let mut encounter = Self {
            battle,
            last_battle,
            player,
            opponent,
            state: EncounterState::default(),
            player_last: None,
            opponent_last: None,
            conclusion: None,
            round_opening_deferred: false,
            sink,
        };
        encounter.open_player_choice();
        encounter
    }

    /// Build an encounter from roster and campaign lookups.
    ///
    /// A battle id the campaign does not know falls back to a standalone
    /// encounter.
    pub fn from_providers<R, C>(
        roster: &R,
        campaign: &C,
        battle_id: BattleId,
        player_id: CombatantId,
        opponent_id: CombatantId,
        sink: S,
    ) -> Result<Self, EncounterError>
    where
        R: Roster + ?Sized,
        C: Campaign + ?Sized,
    {
        let player = roster.combatant(player_id).ok_or(EncounterError::NotFound {
            side: Side::Player,
            id: player_id,
        })?;
        let opponent = roster.combatant(opponent_id).ok_or(EncounterError::NotFound {
            side: Side::Opponent,
            id: opponent_id,
        })?;

        let (battle, last_battle) = match campaign.battle_context(battle_id) {
            Some(battle) => {
                let last = campaign.is_last_battle(battle.id);
                (battle, last)
            }
            None => {
                tracing::debug!(battle_id, "no battle context, starting standalone encounter");
                (BattleContext::standalone(), false)
            }
        };

        Ok(Self::for_battle(battle, last_battle, player, opponent, sink))
    }

    /// (Re)open the player-choice phase and report what the player can afford.
    ///
    /// Entering mid-round drops any choices made so far; pools are only
    /// touched during resolution so nothing else needs undoing.
    pub fn enter_player_choice_phase(&mut self) -> Result<Affordability, EncounterError> {
        if self.state.phase.is_terminal() {
            return Err(EncounterError::EncounterOver(self.state.phase));
        }
        Ok(self.open_player_choice())
    }

    /// Stop `resolve_round` from announcing the next round's
    /// `PlayerChoice`. The owner announces it later through
    /// [`Encounter::enter_player_choice_phase`], once input really opens.
    pub fn defer_round_opening(&mut self) {
        self.round_opening_deferred = true;
    }

    /// Record the player's move for this round
    pub fn submit_player_choice(&mut self, kind: ActionKind) -> Result<Action, EncounterError> {
        self.ensure_phase(Phase::PlayerChoice)?;

        let action = self
            .player
            .action(kind)
            .cloned()
            .ok_or(EncounterError::InvalidChoice {
                kind,
                reason: "not one of the player's moves",
            })?;
        if !self.player.energy.can_afford(action.cost) {
            return Err(EncounterError::InvalidChoice {
                kind,
                reason: "not enough chakra",
            });
        }

        let round = self.state.round;
        self.state.player_choice = Some(action.clone());
        self.sink.notify(&EncounterEvent::PlayerChose {
            round,
            action: action.clone(),
        });
        if let Some(cue) = &action.cue {
            self.sink.play_cue(cue);
        }
        self.set_phase(Phase::OpponentChoice);

        Ok(action)
    }

    /// Ask the oracle for the opponent's move.
    ///
    /// No answer means a skip. An unrecognized answer is reported, logged
    /// and also played as a skip.
    pub fn resolve_opponent_choice<O>(&mut self, oracle: &mut O) -> Result<Action, EncounterError>
    where
        O: OpponentDecision + ?Sized,
    {
        self.ensure_phase(Phase::OpponentChoice)?;

        let round = self.state.round;
        let view = DecisionView {
            me: &self.opponent,
            foe: &self.player,
            round,
            foe_last: self.player_last,
        };
        let decision = oracle.next_move(&view);

        let kind = match decision {
            None => ActionKind::Skip,
            Some(label) => match ActionKind::from_label(&label) {
                Some(kind) => kind,
                None => {
                    let err = EncounterError::InvalidOpponentDecision { label: label.clone() };
                    tracing::warn!(round, "{}; playing a skip", err);
                    self.sink
                        .notify(&EncounterEvent::OpponentDecisionRejected { round, label });
                    ActionKind::Skip
                }
            },
        };

        let action = self.opponent.action(kind).cloned().unwrap_or_else(Action::skip);
        if !self.opponent.energy.can_afford(action.energy_cost()) {
            tracing::debug!(round, kind = %action.kind, "opponent plays a move it cannot afford");
        }

        self.state.opponent_choice = Some(action.clone());
        self.sink.notify(&EncounterEvent::OpponentChose {
            round,
            action: action.clone(),
        });
        self.set_phase(Phase::Resolution);

        Ok(action)
    }

    /// Resolve the round: pay costs, trade damage, check for a result
    pub fn resolve_round(&mut self) -> Result<RoundReport, EncounterError> {
        self.ensure_phase(Phase::Resolution)?;
        let (Some(player_choice), Some(opponent_choice)) =
            (self.state.player_choice.clone(), self.state.opponent_choice.clone())
        else {
            return Err(EncounterError::WrongPhase {
                expected: Phase::Resolution,
                actual: self.state.phase,
            });
        };

        // Costs are paid whether or not the move lands
        let player_spent = player_choice.energy_cost();
        let opponent_spent = opponent_choice.energy_cost();
        self.player.energy.remove(player_spent);
        self.opponent.energy.remove(opponent_spent);

        let (damage_to_opponent, damage_to_player) = exchange(&player_choice, &opponent_choice);
        self.opponent.health.remove(damage_to_opponent);
        self.player.health.remove(damage_to_player);

        let outcome = judge(&self.player, &self.opponent);
        let report = RoundReport {
            round: self.state.round,
            player_spent,
            opponent_spent,
            damage_to_player,
            damage_to_opponent,
            player_health: self.player.health,
            player_energy: self.player.energy,
            opponent_health: self.opponent.health,
            opponent_energy: self.opponent.energy,
            outcome,
            player_choice,
            opponent_choice,
        };
        tracing::debug!(
            round = report.round,
            player = %report.player_choice.kind,
            opponent = %report.opponent_choice.kind,
            damage_to_player,
            damage_to_opponent,
            "round resolved"
        );

        self.player_last = Some(report.player_choice.kind);
        self.opponent_last = Some(report.opponent_choice.kind);
        self.sink.notify(&EncounterEvent::RoundResolved(report.clone()));

        match outcome {
            Some(outcome) => self.conclude(outcome),
            None => {
                self.state.round += 1;
                if self.round_opening_deferred {
                    self.reset_choices();
                } else {
                    self.open_player_choice();
                }
            }
        }

        Ok(report)
    }

    fn ensure_phase(&self, expected: Phase) -> Result<(), EncounterError> {
        let actual = self.state.phase;
        if actual.is_terminal() {
            return Err(EncounterError::EncounterOver(actual));
        }
        if actual != expected {
            return Err(EncounterError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    /// Reopens a round without telling the sink
    fn reset_choices(&mut self) {
        self.state.phase = Phase::PlayerChoice;
        self.state.player_choice = None;
        self.state.opponent_choice = None;
    }

    fn open_player_choice(&mut self) -> Affordability {
        let affordability = self.player.affordability();
        self.reset_choices();
        self.sink.notify(&EncounterEvent::PhaseEntered {
            phase: Phase::PlayerChoice,
            round: self.state.round,
            affordability,
        });
        affordability
    }

    fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.sink.notify(&EncounterEvent::PhaseEntered {
            phase,
            round: self.state.round,
            affordability: Affordability::NONE,
        });
    }

    fn conclude(&mut self, outcome: Outcome) {
        self.set_phase(Phase::from(outcome));

        let conclusion = Conclusion {
            battle_id: self.battle.id,
            player_id: self.player.id,
            opponent_id: self.opponent.id,
            outcome,
            rounds: self.state.round,
            route: Route::for_outcome(
                self.battle.id,
                self.player.id,
                self.opponent.id,
                outcome,
                self.last_battle,
            ),
        };
        tracing::info!(
            battle = conclusion.battle_id,
            outcome = outcome.as_str(),
            rounds = conclusion.rounds,
            "encounter concluded"
        );
        self.sink.notify(&EncounterEvent::Concluded(conclusion.clone()));
        self.conclusion = Some(conclusion);
    }
}

impl<S> Encounter<S> {
    pub fn state(&self) -> &EncounterState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn opponent(&self) -> &Combatant {
        &self.opponent
    }

    pub fn battle(&self) -> &BattleContext {
        &self.battle
    }

    pub fn is_last_battle(&self) -> bool {
        self.last_battle
    }

    /// What the player can pay for right now; all-false outside `PlayerChoice`
    pub fn affordability(&self) -> Affordability {
        if self.state.phase == Phase::PlayerChoice {
            self.player.affordability()
        } else {
            Affordability::NONE
        }
    }

    /// Previous round's choices as (player, opponent)
    pub fn last_choices(&self) -> (Option<ActionKind>, Option<ActionKind>) {
        (self.player_last, self.opponent_last)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.phase.outcome()
    }

    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Why an automatic encounter stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Reached Won, Lost or Draw
    Finished,
    /// Hit `EncounterConfig::max_rounds`
    RoundCap,
    /// The player still has chakra but cannot pay for any move
    Stalled,
}

/// Result of an automatic encounter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncounterResult {
    pub rounds: Vec<RoundReport>,
    pub outcome: Option<Outcome>,
    pub end: EndReason,
    pub player: Combatant,
    pub opponent: Combatant,
}

impl EncounterResult {
    pub fn round_count(&self) -> u32 {
        self.rounds.len() as u32
    }
}

/// Pick the player's move from an oracle.
///
/// The oracle's answer is used when it names an affordable move; anything
/// else falls back to the first affordable move. `None` when nothing is
/// affordable.
fn auto_player_choice<S, P>(encounter: &Encounter<S>, oracle: &mut P) -> Option<ActionKind>
where
    P: OpponentDecision + ?Sized,
{
    let view = DecisionView {
        me: &encounter.player,
        foe: &encounter.opponent,
        round: encounter.state.round,
        foe_last: encounter.opponent_last,
    };
    let wanted = oracle.next_move(&view).and_then(|label| ActionKind::from_label(&label));
    let affordability = encounter.player.affordability();

    match wanted {
        Some(kind) if affordability.allows(kind) => Some(kind),
        _ => affordability.kinds().first().copied(),
    }
}

/// Run a complete encounter with both sides driven by oracles
///
/// # Arguments
/// * `player` - Player combatant
/// * `opponent` - Opponent combatant
/// * `player_oracle` - Chooses the player's moves (sees the player as `me`)
/// * `opponent_oracle` - Chooses the opponent's moves
/// * `config` - Round cap
///
/// # Returns
/// Round-by-round reports and the outcome, if one was reached
pub fn run_encounter<P, O>(
    player: Combatant,
    opponent: Combatant,
    player_oracle: &mut P,
    opponent_oracle: &mut O,
    config: &EncounterConfig,
) -> Result<EncounterResult, EncounterError>
where
    P: OpponentDecision + ?Sized,
    O: OpponentDecision + ?Sized,
{
    let mut encounter = Encounter::new(player, opponent, NullSink);
    let mut rounds = Vec::new();

    let end = loop {
        if rounds.len() as u32 >= config.max_rounds {
            break EndReason::RoundCap;
        }
        let Some(kind) = auto_player_choice(&encounter, player_oracle) else {
            break EndReason::Stalled;
        };

        encounter.submit_player_choice(kind)?;
        encounter.resolve_opponent_choice(opponent_oracle)?;
        let report = encounter.resolve_round()?;
        let finished = report.outcome.is_some();
        rounds.push(report);

        if finished {
            break EndReason::Finished;
        }
    };

    Ok(EncounterResult {
        rounds,
        outcome: encounter.outcome(),
        end,
        player: encounter.player,
        opponent: encounter.opponent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use crate::strategy::{Strategy, StrategyBase, StrategyOracle};
    use proptest::prelude::*;

    fn fighter(id: CombatantId, health: i32, energy: i32) -> Combatant {
        Combatant::new(
            id,
            format!("Fighter {}", id),
            health,
            energy,
            Action::new(ActionKind::Attack, "Strike", 20, 5).with_cue("strike.mp3"),
            Action::new(ActionKind::Defence, "Guard", 0, 3),
            Action::new(ActionKind::Special, "Jutsu", 40, 8),
        )
    }

    fn says(label: &'static str) -> impl FnMut(&DecisionView<'_>) -> Option<String> {
        move |_: &DecisionView<'_>| Some(label.to_string())
    }

    fn passes() -> impl FnMut(&DecisionView<'_>) -> Option<String> {
        |_: &DecisionView<'_>| None
    }

    fn encounter(player: Combatant, opponent: Combatant) -> Encounter<RecordingSink> {
        Encounter::new(player, opponent, RecordingSink::new())
    }

    fn play(
        enc: &mut Encounter<RecordingSink>,
        player: ActionKind,
        opponent: &'static str,
    ) -> RoundReport {
        enc.submit_player_choice(player).unwrap();
        enc.resolve_opponent_choice(&mut says(opponent)).unwrap();
        enc.resolve_round().unwrap()
    }

    #[test]
    fn test_starts_in_player_choice() {
        let enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        assert_eq!(enc.phase(), Phase::PlayerChoice);
        assert_eq!(enc.round(), 1);
        assert!(enc.state().player_choice.is_none());
        assert_eq!(
            enc.sink().last_affordability(),
            Some(Affordability { attack: true, defence: true, special: true })
        );
    }

    #[test]
    fn test_attack_into_defence() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        let report = play(&mut enc, ActionKind::Attack, "defence");

        assert_eq!(report.damage_to_opponent, 0);
        assert_eq!(enc.opponent().health.now, 100);
        assert_eq!(enc.player().energy.now, 5);
        assert_eq!(enc.opponent().energy.now, 7);
        assert_eq!(report.outcome, None);
        assert_eq!(enc.phase(), Phase::PlayerChoice);
        assert_eq!(enc.round(), 2);
    }

    #[test]
    fn test_defence_blocks_both_offensive_kinds() {
        let mut enc = encounter(fighter(1, 100, 20), fighter(2, 100, 20));
        let report = play(&mut enc, ActionKind::Defence, "attack");
        assert_eq!(report.damage_to_player, 0);
        assert_eq!(report.damage_to_opponent, 0);

        let report = play(&mut enc, ActionKind::Special, "defence");
        assert_eq!(report.damage_to_opponent, 0);
        assert_eq!(report.player_spent, 8);
        assert_eq!(report.opponent_spent, 3);
    }

    #[test]
    fn test_trade_blows() {
        let mut enc = encounter(fighter(1, 100, 20), fighter(2, 100, 20));
        let report = play(&mut enc, ActionKind::Special, "attack");
        assert_eq!(report.damage_to_opponent, 40);
        assert_eq!(report.damage_to_player, 20);
        assert_eq!(enc.player().health.now, 80);
        assert_eq!(enc.opponent().health.now, 60);
    }

    #[test]
    fn test_player_killed() {
        let mut player = fighter(1, 100, 10);
        player.health = ResourcePool::with_now(100, 15);
        let mut enc = encounter(player, fighter(2, 100, 10));

        let report = play(&mut enc, ActionKind::Attack, "attack");
        assert!(enc.player().health.now <= 0);
        assert_eq!(report.outcome, Some(Outcome::Lost));
        assert_eq!(enc.phase(), Phase::Lost);
    }

    #[test]
    fn test_double_knockout_is_draw() {
        let mut player = fighter(1, 100, 10);
        let mut opponent = fighter(2, 100, 10);
        player.health = ResourcePool::with_now(100, 20);
        opponent.health = ResourcePool::with_now(100, 10);
        let mut enc = encounter(player, opponent);

        let report = play(&mut enc, ActionKind::Attack, "attack");
        assert_eq!(report.outcome, Some(Outcome::Draw));
        assert_eq!(enc.opponent().health.now, -10);
        assert_eq!(enc.player().health.now, 0);
    }

    #[test]
    fn test_health_checked_before_energy() {
        // Player drains its chakra but lands the killing blow
        let mut opponent = fighter(2, 100, 10);
        opponent.health = ResourcePool::with_now(100, 20);
        let mut enc = encounter(fighter(1, 100, 5), opponent);

        let report = play(&mut enc, ActionKind::Attack, "skip");
        assert_eq!(enc.player().energy.now, 0);
        assert_eq!(report.outcome, Some(Outcome::Won));
    }

    #[test]
    fn test_player_out_of_chakra_loses() {
        let mut enc = encounter(fighter(1, 100, 5), fighter(2, 100, 10));
        let report = play(&mut enc, ActionKind::Attack, "defence");
        assert_eq!(report.outcome, Some(Outcome::Lost));
    }

    #[test]
    fn test_opponent_out_of_chakra_loses() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 3));
        let report = play(&mut enc, ActionKind::Defence, "defence");
        assert_eq!(report.outcome, Some(Outcome::Won));
    }

    #[test]
    fn test_both_dry_healthier_wins() {
        let mut player = fighter(1, 100, 5);
        player.health = ResourcePool::with_now(100, 50);
        let mut enc = encounter(player, fighter(2, 100, 5));
        // Both drain to 0 chakra trading 20s: 30 vs 80
        let report = play(&mut enc, ActionKind::Attack, "attack");
        assert_eq!(report.outcome, Some(Outcome::Lost));

        let mut enc = encounter(fighter(1, 100, 5), fighter(2, 100, 5));
        let report = play(&mut enc, ActionKind::Attack, "attack");
        assert_eq!(report.outcome, Some(Outcome::Draw));

        let mut enc = encounter(fighter(1, 100, 5), fighter(2, 100, 3));
        let report = play(&mut enc, ActionKind::Attack, "defence");
        assert_eq!(enc.player().health.now, 100);
        assert_eq!(report.outcome, Some(Outcome::Draw));
    }

    #[test]
    fn test_skip_is_free_and_harmless() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        let report = play(&mut enc, ActionKind::Attack, "skip");
        assert_eq!(report.opponent_choice, Action::skip());
        assert_eq!(report.opponent_spent, 0);
        assert_eq!(report.damage_to_player, 0);
        assert_eq!(report.damage_to_opponent, 20);
        assert_eq!(enc.opponent().energy.now, 10);
    }

    #[test]
    fn test_no_answer_equals_skip() {
        let mut explicit = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        let a = play(&mut explicit, ActionKind::Special, "skip");

        let mut silent = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        silent.submit_player_choice(ActionKind::Special).unwrap();
        silent.resolve_opponent_choice(&mut passes()).unwrap();
        let b = silent.resolve_round().unwrap();

        assert_eq!(a, b);
        assert_eq!(explicit.opponent(), silent.opponent());
        assert_eq!(explicit.player(), silent.player());
    }

    #[test]
    fn test_malformed_decision_degrades_to_skip() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        enc.submit_player_choice(ActionKind::Attack).unwrap();
        let chosen = enc.resolve_opponent_choice(&mut says("teleport")).unwrap();
        assert!(chosen.is_skip());
        assert_eq!(enc.phase(), Phase::Resolution);
        assert!(enc.sink().events.contains(&EncounterEvent::OpponentDecisionRejected {
            round: 1,
            label: "teleport".into(),
        }));
        let report = enc.resolve_round().unwrap();
        assert_eq!(report.damage_to_opponent, 20);
    }

    #[test]
    fn test_unaffordable_choice_rejected() {
        let mut enc = encounter(fighter(1, 100, 6), fighter(2, 100, 10));
        let before = enc.state().clone();
        let err = enc.submit_player_choice(ActionKind::Special).unwrap_err();
        assert!(matches!(err, EncounterError::InvalidChoice { kind: ActionKind::Special, .. }));
        assert_eq!(enc.state(), &before);
        assert_eq!(enc.player().energy.now, 6);
    }

    #[test]
    fn test_skip_is_foreign_to_player() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        let err = enc.submit_player_choice(ActionKind::Skip).unwrap_err();
        assert!(matches!(err, EncounterError::InvalidChoice { kind: ActionKind::Skip, .. }));
        assert_eq!(enc.phase(), Phase::PlayerChoice);
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        assert!(matches!(
            enc.resolve_round(),
            Err(EncounterError::WrongPhase { expected: Phase::Resolution, actual: Phase::PlayerChoice })
        ));
        assert!(matches!(
            enc.resolve_opponent_choice(&mut passes()),
            Err(EncounterError::WrongPhase { .. })
        ));
        enc.submit_player_choice(ActionKind::Attack).unwrap();
        assert!(matches!(
            enc.submit_player_choice(ActionKind::Attack),
            Err(EncounterError::WrongPhase { expected: Phase::PlayerChoice, actual: Phase::OpponentChoice })
        ));
    }

    #[test]
    fn test_terminal_is_final() {
        let mut opponent = fighter(2, 100, 10);
        opponent.health = ResourcePool::with_now(100, 5);
        let mut enc = encounter(fighter(1, 100, 10), opponent);
        play(&mut enc, ActionKind::Attack, "attack");
        assert_eq!(enc.phase(), Phase::Won);

        assert_eq!(enc.enter_player_choice_phase(), Err(EncounterError::EncounterOver(Phase::Won)));
        assert_eq!(
            enc.submit_player_choice(ActionKind::Attack).unwrap_err(),
            EncounterError::EncounterOver(Phase::Won)
        );
        assert_eq!(enc.affordability(), Affordability::NONE);
    }

    #[test]
    fn test_reenter_player_choice_drops_choice() {
        let mut enc = encounter(fighter(1, 100, 10), fighter(2, 100, 10));
        enc.submit_player_choice(ActionKind::Attack).unwrap();
        let aff = enc.enter_player_choice_phase().unwrap();
        assert!(aff.attack);
        assert_eq!(enc.phase(), Phase::PlayerChoice);
        assert!(enc.state().player_choice.is_none());
        assert_eq!(enc.player().energy.now, 10);
    }

    #[test]
    fn test_round_resets_choices_and_affordability() {
        let mut enc = encounter(fighter(1, 100, 12), fighter(2, 100, 10));
        play(&mut enc, ActionKind::Attack, "attack");
        assert!(enc.state().player_choice.is_none());
        assert!(enc.state().opponent_choice.is_none());
        // 7 chakra left: special (8) no longer offered
        assert_eq!(
            enc.sink().last_affordability(),
            Some(Affordability { attack: true, defence: true, special: false })
        );
        assert_eq!(enc.last_choices(), (Some(ActionKind::Attack), Some(ActionKind::Attack)));
    }

    #[test]
    fn test_events_and_cues() {
        let mut enc = encounter(fighter(1, 100, 20), fighter(2, 100, 20));
        play(&mut enc, ActionKind::Attack, "defence");
        let sink = enc.sink();
        assert_eq!(sink.cues, vec!["strike.mp3".to_string()]);
        assert_eq!(
            sink.phases(),
            vec![Phase::PlayerChoice, Phase::OpponentChoice, Phase::Resolution, Phase::PlayerChoice]
        );
    }

    #[test]
    fn test_deferred_round_opens_silently() {
        let mut enc = encounter(fighter(1, 100, 20), fighter(2, 100, 20));
        enc.defer_round_opening();
        play(&mut enc, ActionKind::Attack, "defence");

        assert_eq!(enc.phase(), Phase::PlayerChoice);
        assert_eq!(enc.round(), 2);
        assert_eq!(
            enc.sink().phases(),
            vec![Phase::PlayerChoice, Phase::OpponentChoice, Phase::Resolution]
        );

        enc.enter_player_choice_phase().unwrap();
        let sink = enc.into_sink();
        assert_eq!(sink.phases().last(), Some(&Phase::PlayerChoice));
        assert_eq!(
            sink.last_affordability(),
            Some(Affordability { attack: true, defence: true, special: true })
        );
    }

    #[test]
    fn test_resolution_without_choices_expects_resolution() {
        let mut enc = encounter(fighter(1, 100, 20), fighter(2, 100, 20));
        enc.state.phase = Phase::Resolution;
        assert_eq!(
            enc.resolve_round(),
            Err(EncounterError::WrongPhase {
                expected: Phase::Resolution,
                actual: Phase::Resolution,
            })
        );
    }

    #[test]
    fn test_conclusion_route() {
        let campaign = crate::roster::CampaignBook::new(vec![
            BattleContext::new(1, "First"),
            BattleContext::new(2, "Last"),
        ]);
        let mut roster = crate::roster::RosterBook::new();
        roster.insert(fighter(1, 100, 10));
        let mut weak = fighter(2, 100, 10);
        weak.health = ResourcePool::with_now(100, 1);
        roster.insert(weak);

        let mut enc =
            Encounter::from_providers(&roster, &campaign, 2, 1, 2, RecordingSink::new()).unwrap();
        assert!(enc.is_last_battle());
        play(&mut enc, ActionKind::Attack, "skip");
        assert_eq!(enc.conclusion().map(|c| c.route.clone()), Some(Route::CampaignEnd));
        assert_eq!(enc.sink().conclusion().map(|c| c.outcome), Some(Outcome::Won));

        let mut enc =
            Encounter::from_providers(&roster, &campaign, 1, 1, 2, RecordingSink::new()).unwrap();
        play(&mut enc, ActionKind::Attack, "skip");
        assert_eq!(
            enc.conclusion().map(|c| c.route.to_string()),
            Some("/story/fight-result/1/1/2/won".to_string())
        );
    }

    #[test]
    fn test_missing_battle_falls_back_to_standalone() {
        let campaign = crate::roster::CampaignBook::default();
        let mut roster = crate::roster::RosterBook::new();
        roster.insert(fighter(1, 100, 10));
        roster.insert(fighter(2, 100, 10));

        let enc = Encounter::from_providers(&roster, &campaign, 42, 1, 2, NullSink).unwrap();
        assert!(enc.battle().is_standalone());
        assert!(!enc.is_last_battle());
    }

    #[test]
    fn test_missing_combatant() {
        let campaign = crate::roster::CampaignBook::default();
        let mut roster = crate::roster::RosterBook::new();
        roster.insert(fighter(1, 100, 10));

        let err = Encounter::from_providers(&roster, &campaign, 0, 1, 9, NullSink).unwrap_err();
        assert_eq!(err, EncounterError::NotFound { side: Side::Opponent, id: 9 });
        let err = Encounter::from_providers(&roster, &campaign, 0, 8, 1, NullSink).unwrap_err();
        assert_eq!(err, EncounterError::NotFound { side: Side::Player, id: 8 });
    }

    #[test]
    fn test_run_encounter_determinism() {
        let run = || {
            let mut p = StrategyOracle::new(Strategy::new(StrategyBase::Random), 42, 0);
            let mut o = StrategyOracle::new(Strategy::new(StrategyBase::Random), 42, 1);
            run_encounter(
                fighter(1, 100, 60),
                fighter(2, 100, 60),
                &mut p,
                &mut o,
                &EncounterConfig::instant(),
            )
            .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.rounds, b.rounds);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn test_run_encounter_finishes() {
        let mut p = StrategyOracle::new(Strategy::new(StrategyBase::Aggressor), 1, 0);
        let mut o = StrategyOracle::new(Strategy::new(StrategyBase::Brawler), 1, 1);
        let result = run_encounter(
            fighter(1, 100, 100),
            fighter(2, 100, 100),
            &mut p,
            &mut o,
            &EncounterConfig::instant(),
        )
        .unwrap();
        // 40 a round against 20: opponent falls in round 3
        assert_eq!(result.end, EndReason::Finished);
        assert_eq!(result.outcome, Some(Outcome::Won));
        assert_eq!(result.round_count(), 3);
        assert_eq!(result.rounds.last().and_then(|r| r.outcome), Some(Outcome::Won));
    }

    #[test]
    fn test_run_encounter_round_cap() {
        let mut p = says("defence");
        let mut o = passes();
        let mut player = fighter(1, 100, 10);
        player.defence.cost = 0;
        let config = EncounterConfig { max_rounds: 7, ..EncounterConfig::instant() };
        let result = run_encounter(player, fighter(2, 100, 10), &mut p, &mut o, &config).unwrap();
        assert_eq!(result.end, EndReason::RoundCap);
        assert_eq!(result.outcome, None);
        assert_eq!(result.round_count(), 7);
    }

    #[test]
    fn test_run_encounter_stalls_when_nothing_affordable() {
        let mut p = passes();
        let mut o = passes();
        let result = run_encounter(
            fighter(1, 100, 2),
            fighter(2, 100, 10),
            &mut p,
            &mut o,
            &EncounterConfig::instant(),
        )
        .unwrap();
        assert_eq!(result.end, EndReason::Stalled);
        assert!(result.rounds.is_empty());
    }

    #[test]
    fn test_run_encounter_player_falls_back_when_oracle_wants_unaffordable() {
        let mut p = says("special");
        let mut o = passes();
        let result = run_encounter(
            fighter(1, 100, 6),
            fighter(2, 100, 10),
            &mut p,
            &mut o,
            &EncounterConfig::instant(),
        )
        .unwrap();
        assert_eq!(result.rounds[0].player_choice.kind, ActionKind::Attack);
    }

    fn kind_strategy() -> impl proptest::strategy::Strategy<Value = ActionKind> {
        prop_oneof![
            Just(ActionKind::Attack),
            Just(ActionKind::Defence),
            Just(ActionKind::Special),
        ]
    }

    fn opponent_kind_strategy() -> impl proptest::strategy::Strategy<Value = ActionKind> {
        prop_oneof![
            Just(ActionKind::Attack),
            Just(ActionKind::Defence),
            Just(ActionKind::Special),
            Just(ActionKind::Skip),
        ]
    }

    proptest! {
        #[test]
        fn defence_always_blocks(
            opp in opponent_kind_strategy(),
            atk in 0u32..200,
            spc in 0u32..200,
            cost in 0u32..10,
        ) {
            let mut player = fighter(1, 500, 100);
            let mut opponent = fighter(2, 500, 100);
            opponent.attack.damage = atk;
            opponent.special.damage = spc;
            opponent.attack.cost = cost;
            player.defence.cost = cost;
            let mut enc = Encounter::new(player, opponent, NullSink);

            enc.submit_player_choice(ActionKind::Defence).unwrap();
            enc.resolve_opponent_choice(&mut |_: &DecisionView<'_>| Some(opp.as_str().to_string())).unwrap();
            let report = enc.resolve_round().unwrap();

            prop_assert_eq!(report.damage_to_player, 0);
            prop_assert_eq!(enc.player().health.now, 500);
            prop_assert_eq!(enc.player().energy.now, 100 - cost as i32);
        }

        #[test]
        fn round_accounting_is_exact(
            player_kind in kind_strategy(),
            opp_kind in opponent_kind_strategy(),
            health in 1i32..120,
            energy in 8i32..40,
        ) {
            let mut enc = Encounter::new(fighter(1, health, energy), fighter(2, health, energy), NullSink);
            let player_action = enc.submit_player_choice(player_kind).unwrap();
            let opp_action = enc
                .resolve_opponent_choice(&mut |_: &DecisionView<'_>| Some(opp_kind.as_str().to_string()))
                .unwrap();
            let report = enc.resolve_round().unwrap();

            prop_assert_eq!(enc.player().energy.now, energy - player_action.cost as i32);
            prop_assert_eq!(enc.opponent().energy.now, energy - opp_action.energy_cost() as i32);
            prop_assert_eq!(enc.player().health.now, health - report.damage_to_player as i32);
            prop_assert_eq!(enc.opponent().health.now, health - report.damage_to_opponent as i32);
            prop_assert_eq!(report.outcome, judge(enc.player(), enc.opponent()));
            if opp_kind == ActionKind::Skip {
                prop_assert_eq!(report.damage_to_player, 0);
                prop_assert_eq!(report.opponent_spent, 0);
            }
            match report.outcome {
                Some(outcome) => prop_assert_eq!(enc.phase(), Phase::from(outcome)),
                None => {
                    prop_assert_eq!(enc.phase(), Phase::PlayerChoice);
                    prop_assert!(enc.state().player_choice.is_none());
                    prop_assert!(enc.state().opponent_choice.is_none());
                }
            }
        }

        #[test]
        fn both_dry_compares_health(ph in -50i32..100, oh in -50i32..100) {
            let mut player = fighter(1, 100, 0);
            let mut opponent = fighter(2, 100, 0);
            player.health = ResourcePool::with_now(100, ph);
            opponent.health = ResourcePool::with_now(100, oh);
            let outcome = judge(&player, &opponent);
            let expected = match (ph <= 0, oh <= 0) {
                (true, false) => Outcome::Lost,
                (false, true) => Outcome::Won,
                (true, true) => Outcome::Draw,
                (false, false) => match ph.cmp(&oh) {
                    Ordering::Greater => Outcome::Won,
                    Ordering::Less => Outcome::Lost,
                    Ordering::Equal => Outcome::Draw,
                },
            };
            prop_assert_eq!(outcome, Some(expected));
        }
    }
}
