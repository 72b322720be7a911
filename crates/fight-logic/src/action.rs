//! Action kinds and per-combatant moves

use serde::{Deserialize, Serialize};

/// The four kinds of thing a side can do in a round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Attack,
    Defence,
    Special,
    /// The opponent chose not to act. Never offered to the player.
    Skip,
}

impl ActionKind {
    /// The three kinds a combatant carries a named move for
    pub const NAMED: [ActionKind; 3] = [ActionKind::Attack, ActionKind::Defence, ActionKind::Special];

    /// Stable lowercase label used by label-based oracles
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Defence => "defence",
            ActionKind::Special => "special",
            ActionKind::Skip => "skip",
        }
    }

    /// Whether this kind deals damage when not blocked
    pub const fn is_offensive(&self) -> bool {
        matches!(self, ActionKind::Attack | ActionKind::Special)
    }

    /// Parse an oracle label. Case and surrounding whitespace are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "attack" => Some(ActionKind::Attack),
            "defence" | "defense" => Some(ActionKind::Defence),
            "special" => Some(ActionKind::Special),
            "skip" => Some(ActionKind::Skip),
            _ => None,
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete move: what it is called, what it costs and what it hits for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub damage: u32,
    #[serde(default)]
    pub cost: u32,
    /// Audio cue played when the move is chosen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind, name: impl Into<String>, damage: u32, cost: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            damage,
            cost,
            cue: None,
        }
    }

    pub fn with_cue(mut self, cue: impl Into<String>) -> Self {
        self.cue = Some(cue.into());
        self
    }

    /// The shared "did nothing" sentinel: zero cost, zero damage, empty name
    pub fn skip() -> Self {
        Self::new(ActionKind::Skip, "", 0, 0)
    }

    pub fn is_skip(&self) -> bool {
        self.kind == ActionKind::Skip
    }

    /// Resource this action consumes when performed
    pub fn energy_cost(&self) -> u32 {
        if self.is_skip() {
            0
        } else {
            self.cost
        }
    }
}

/// Which of the three named moves the player can currently pay for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordability {
    pub attack: bool,
    pub defence: bool,
    pub special: bool,
}

impl Affordability {
    /// Nothing can be chosen (used outside the player-choice phase)
    pub const NONE: Affordability = Affordability {
        attack: false,
        defence: false,
        special: false,
    };

    pub fn allows(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Attack => self.attack,
            ActionKind::Defence => self.defence,
            ActionKind::Special => self.special,
            ActionKind::Skip => false,
        }
    }

    pub fn any(&self) -> bool {
        self.attack || self.defence || self.special
    }

    /// Affordable kinds in attack, defence, special order
    pub fn kinds(&self) -> Vec<ActionKind> {
        ActionKind::NAMED
            .into_iter()
            .filter(|kind| self.allows(*kind))
            .collect()
    }
}
