//! Encounter participants

use serde::{Deserialize, Serialize};
use crate::action::{Action, ActionKind, Affordability};
use crate::pool::ResourcePool;

/// Roster identifier of a combatant
pub type CombatantId = u32;

/// One side of an encounter: two pools and three named moves
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub health: ResourcePool,
    /// Chakra
    pub energy: ResourcePool,
    pub attack: Action,
    pub defence: Action,
    pub special: Action,
}

impl Combatant {
    /// Create a combatant with full pools.
    ///
    /// Each move is filed under its slot regardless of the kind it was built
    /// with, so `attack.kind` is always `Attack` and so on.
    pub fn new(
        id: CombatantId,
        name: impl Into<String>,
        health: i32,
        energy: i32,
        attack: Action,
        defence: Action,
        special: Action,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            health: ResourcePool::new(health),
            energy: ResourcePool::new(energy),
            attack: Action { kind: ActionKind::Attack, ..attack },
            defence: Action { kind: ActionKind::Defence, ..defence },
            special: Action { kind: ActionKind::Special, ..special },
        }
    }

    /// The named move for `kind`. Skip belongs to nobody.
    pub fn action(&self, kind: ActionKind) -> Option<&Action> {
        match kind {
            ActionKind::Attack => Some(&self.attack),
            ActionKind::Defence => Some(&self.defence),
            ActionKind::Special => Some(&self.special),
            ActionKind::Skip => None,
        }
    }

    pub fn can_afford(&self, kind: ActionKind) -> bool {
        self.action(kind)
            .is_some_and(|action| self.energy.can_afford(action.cost))
    }

    /// Which named moves the current chakra pays for
    pub fn affordability(&self) -> Affordability {
        Affordability {
            attack: self.can_afford(ActionKind::Attack),
            defence: self.can_afford(ActionKind::Defence),
            special: self.can_afford(ActionKind::Special),
        }
    }

    /// Largest damage among the offensive moves this combatant can pay for
    pub fn best_affordable_damage(&self) -> u32 {
        [&self.attack, &self.special]
            .into_iter()
            .filter(|action| self.energy.can_afford(action.cost))
            .map(|action| action.damage)
            .max()
            .unwrap_or(0)
    }
}
