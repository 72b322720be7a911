//! Opponent decision oracles and the built-in strategies

use serde::{Deserialize, Serialize};
use crate::action::ActionKind;
use crate::combatant::Combatant;
use crate::random::SeededRng;

/// What an oracle gets to look at before choosing
#[derive(Clone, Copy, Debug)]
pub struct DecisionView<'a> {
    /// The side the oracle is choosing for
    pub me: &'a Combatant,
    pub foe: &'a Combatant,
    /// 1-based round number
    pub round: u32,
    /// What the other side chose last round
    pub foe_last: Option<ActionKind>,
}

/// External source of a side's move.
///
/// Returns a move label (`attack`, `defence`, `special`, `skip`) or `None`
/// for "no action". The engine treats the provider as a black box: unknown
/// labels are tolerated and downgraded to a skip.
pub trait OpponentDecision {
    fn next_move(&mut self, view: &DecisionView<'_>) -> Option<String>;
}

impl<F> OpponentDecision for F
where
    F: FnMut(&DecisionView<'_>) -> Option<String>,
{
    fn next_move(&mut self, view: &DecisionView<'_>) -> Option<String> {
        self(view)
    }
}

/// Base strategy type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyBase {
    /// Special whenever affordable, otherwise attack.
    Aggressor,
    /// Plain attacks only.
    Brawler,
    /// Guards when hurt, attacks otherwise.
    Turtle,
    /// Repeats the player's previous move. Opens with an attack.
    Mirror,
    /// Uniform pick among affordable moves.
    Random,
    /// Goes for the kill when it can, guards when it could be killed.
    Finisher,
}

impl StrategyBase {
    pub const ALL: [StrategyBase; 6] = [
        StrategyBase::Aggressor,
        StrategyBase::Brawler,
        StrategyBase::Turtle,
        StrategyBase::Mirror,
        StrategyBase::Random,
        StrategyBase::Finisher,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            StrategyBase::Aggressor => "Aggressor",
            StrategyBase::Brawler => "Brawler",
            StrategyBase::Turtle => "Turtle",
            StrategyBase::Mirror => "Mirror",
            StrategyBase::Random => "Random",
            StrategyBase::Finisher => "Finisher",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|base| base.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Strategy parameters for fine-tuning behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Turtle guards while own health percent is below this (0-100)
    pub guard_below: u8,
    /// Percentage chance to pass the round regardless of base (0-100)
    pub pass_percent: u8,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            guard_below: 30,
            pass_percent: 0,
        }
    }
}

/// Complete strategy with base type and parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub base: StrategyBase,
    #[serde(default)]
    pub params: StrategyParams,
}

impl Strategy {
    /// Create a new strategy with default parameters
    pub fn new(base: StrategyBase) -> Self {
        Self {
            base,
            params: StrategyParams::default(),
        }
    }

    pub fn with_params(base: StrategyBase, params: StrategyParams) -> Self {
        Self { base, params }
    }

    /// Choose a move for `view.me`, or `None` to pass
    pub fn decide(&self, view: &DecisionView<'_>, rng: &mut SeededRng) -> Option<ActionKind> {
        if self.params.pass_percent > 0 && rng.next_percent() < self.params.pass_percent {
            return None;
        }

        let me = view.me;
        match self.base {
            StrategyBase::Aggressor => {
                first_affordable(me, &[ActionKind::Special, ActionKind::Attack])
            }
            StrategyBase::Brawler => first_affordable(me, &[ActionKind::Attack]),
            StrategyBase::Turtle => decide_turtle(view, &self.params),
            StrategyBase::Mirror => decide_mirror(view),
            StrategyBase::Random => decide_random(me, rng),
            StrategyBase::Finisher => decide_finisher(view),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(StrategyBase::Aggressor)
    }
}

fn first_affordable(me: &Combatant, order: &[ActionKind]) -> Option<ActionKind> {
    order.iter().copied().find(|kind| me.can_afford(*kind))
}

/// Turtle: guard while hurt, otherwise swing
fn decide_turtle(view: &DecisionView<'_>, params: &StrategyParams) -> Option<ActionKind> {
    if view.me.health.percent() < params.guard_below && view.me.can_afford(ActionKind::Defence) {
        return Some(ActionKind::Defence);
    }
    first_affordable(
        view.me,
        &[ActionKind::Attack, ActionKind::Special, ActionKind::Defence],
    )
}

/// Mirror: copy the other side's last move
fn decide_mirror(view: &DecisionView<'_>) -> Option<ActionKind> {
    let wanted = match view.foe_last {
        None | Some(ActionKind::Skip) => ActionKind::Attack,
        Some(kind) => kind,
    };
    view.me.can_afford(wanted).then_some(wanted)
}

fn decide_random(me: &Combatant, rng: &mut SeededRng) -> Option<ActionKind> {
    let choices = me.affordability().kinds();
    if choices.is_empty() {
        return None;
    }
    let pick = rng.next_range(choices.len() as u32) as usize;
    Some(choices[pick])
}

/// Finisher: lethal move first, guard against a lethal reply, else attack
fn decide_finisher(view: &DecisionView<'_>) -> Option<ActionKind> {
    let (me, foe) = (view.me, view.foe);
    let foe_health = i64::from(foe.health.now);

    for kind in [ActionKind::Attack, ActionKind::Special] {
        let lethal = me
            .action(kind)
            .is_some_and(|action| i64::from(action.damage) >= foe_health);
        if lethal && me.can_afford(kind) {
            return Some(kind);
        }
    }

    let threatened = i64::from(foe.best_affordable_damage()) >= i64::from(me.health.now);
    if threatened && me.can_afford(ActionKind::Defence) {
        return Some(ActionKind::Defence);
    }

    first_affordable(me, &[ActionKind::Attack, ActionKind::Special, ActionKind::Defence])
}

/// A strategy bound to its own random stream
#[derive(Clone, Debug)]
pub struct StrategyOracle {
    strategy: Strategy,
    rng: SeededRng,
}

impl StrategyOracle {
    pub fn new(strategy: Strategy, seed: u64, stream: u32) -> Self {
        Self {
            strategy,
            rng: SeededRng::new(seed, stream),
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }
}

impl OpponentDecision for StrategyOracle {
    fn next_move(&mut self, view: &DecisionView<'_>) -> Option<String> {
        // Rolls depend only on seed, stream and round
        let mut rng = self.rng.for_round(view.round);
        let choice = self.strategy.decide(view, &mut rng);
        tracing::debug!(
            strategy = self.strategy.base.as_str(),
            round = view.round,
            combatant = view.me.id,
            "strategy chose {:?}",
            choice
        );
        choice.map(|kind| kind.as_str().to_string())
    }
}

/// Get a human-readable description of a strategy
pub fn describe_strategy(strategy: &Strategy) -> String {
    let base_desc = match strategy.base {
        StrategyBase::Aggressor => "Uses its special whenever it has the chakra, otherwise attacks.",
        StrategyBase::Brawler => "Only ever throws plain attacks.",
        StrategyBase::Turtle => "Guards while badly hurt, attacks otherwise.",
        StrategyBase::Mirror => "Repeats your previous move. Opens with an attack.",
        StrategyBase::Random => "Picks any affordable move at random.",
        StrategyBase::Finisher => "Strikes when the blow is lethal, guards when you could finish it.",
    };

    let mut desc = base_desc.to_string();

    if strategy.base == StrategyBase::Turtle {
        desc.push_str(&format!(" Guards below {}% health.", strategy.params.guard_below));
    }

    if strategy.params.pass_percent > 0 {
        desc.push_str(&format!(" {}% chance to hesitate.", strategy.params.pass_percent));
    }

    desc
}
