//! Roster and campaign providers, plus the JSON fight book that backs them

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use crate::action::{Action, ActionKind};
use crate::combatant::{Combatant, CombatantId};
use crate::error::BookError;

pub type BattleId = u32;

/// Looks combatants up by id. Every lookup hands out a fresh copy.
pub trait Roster {
    fn combatant(&self, id: CombatantId) -> Option<Combatant>;
}

/// Supplies battle context for campaign encounters
pub trait Campaign {
    fn battle_context(&self, battle_id: BattleId) -> Option<BattleContext>;
    fn is_last_battle(&self, battle_id: BattleId) -> bool;
}

/// Where an encounter sits in the campaign
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleContext {
    pub id: BattleId,
    #[serde(default)]
    pub title: String,
}

impl BattleContext {
    /// Id used for encounters fought outside any campaign
    pub const STANDALONE_ID: BattleId = 0;

    pub fn new(id: BattleId, title: impl Into<String>) -> Self {
        Self { id, title: title.into() }
    }

    /// Context for an encounter with no campaign battle behind it
    pub fn standalone() -> Self {
        Self::new(Self::STANDALONE_ID, "")
    }

    pub fn is_standalone(&self) -> bool {
        self.id == Self::STANDALONE_ID
    }
}

/// In-memory roster
#[derive(Clone, Debug, Default)]
pub struct RosterBook {
    combatants: HashMap<CombatantId, Combatant>,
}

impl RosterBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a combatant, replacing any previous entry with the same id
    pub fn insert(&mut self, combatant: Combatant) {
        self.combatants.insert(combatant.id, combatant);
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Combatants sorted by id
    pub fn combatants(&self) -> Vec<&Combatant> {
        let mut all: Vec<_> = self.combatants.values().collect();
        all.sort_by_key(|c| c.id);
        all
    }
}

impl Roster for RosterBook {
    fn combatant(&self, id: CombatantId) -> Option<Combatant> {
        self.combatants.get(&id).cloned()
    }
}

/// In-memory campaign: an ordered list of battles, the last one ends it
#[derive(Clone, Debug, Default)]
pub struct CampaignBook {
    battles: Vec<BattleContext>,
}

impl CampaignBook {
    pub fn new(battles: Vec<BattleContext>) -> Self {
        Self { battles }
    }

    pub fn battles(&self) -> &[BattleContext] {
        &self.battles
    }
}

impl Campaign for CampaignBook {
    fn battle_context(&self, battle_id: BattleId) -> Option<BattleContext> {
        self.battles.iter().find(|b| b.id == battle_id).cloned()
    }

    fn is_last_battle(&self, battle_id: BattleId) -> bool {
        self.battles.last().is_some_and(|b| b.id == battle_id)
    }
}

/// A move as written in a fight book; the slot decides its kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub name: String,
    #[serde(default)]
    pub damage: u32,
    #[serde(default)]
    pub cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
}

impl MoveEntry {
    fn into_action(self, kind: ActionKind) -> Action {
        Action {
            kind,
            name: self.name,
            damage: self.damage,
            cost: self.cost,
            cue: self.cue,
        }
    }
}

/// A combatant as written in a fight book
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantEntry {
    pub id: CombatantId,
    pub name: String,
    pub health: i32,
    #[serde(alias = "energy")]
    pub chakra: i32,
    pub attack: MoveEntry,
    pub defence: MoveEntry,
    pub special: MoveEntry,
}

impl From<CombatantEntry> for Combatant {
    fn from(entry: CombatantEntry) -> Self {
        Combatant::new(
            entry.id,
            entry.name,
            entry.health,
            entry.chakra,
            entry.attack.into_action(ActionKind::Attack),
            entry.defence.into_action(ActionKind::Defence),
            entry.special.into_action(ActionKind::Special),
        )
    }
}

/// JSON document listing the roster and the campaign battles in order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightBook {
    pub combatants: Vec<CombatantEntry>,
    #[serde(default)]
    pub battles: Vec<BattleContext>,
}

impl FightBook {
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Split into providers, rejecting duplicate ids
    pub fn into_providers(self) -> Result<(RosterBook, CampaignBook), BookError> {
        let mut roster = RosterBook::new();
        for entry in self.combatants {
            if roster.combatants.contains_key(&entry.id) {
                return Err(BookError::DuplicateCombatant(entry.id));
            }
            roster.insert(entry.into());
        }

        let mut seen = Vec::with_capacity(self.battles.len());
        for battle in &self.battles {
            if seen.contains(&battle.id) {
                return Err(BookError::DuplicateBattle(battle.id));
            }
            seen.push(battle.id);
        }

        tracing::debug!(
            combatants = roster.len(),
            battles = self.battles.len(),
            "fight book loaded"
        );
        Ok((roster, CampaignBook::new(self.battles)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"{
        "combatants": [
            {
                "id": 1, "name": "Naruto", "health": 100, "chakra": 10,
                "attack": {"name": "Punch", "damage": 20, "cost": 5, "cue": "punch.mp3"},
                "defence": {"name": "Block", "cost": 3},
                "special": {"name": "Rasengan", "damage": 45, "cost": 8}
            },
            {
                "id": 2, "name": "Sasuke", "health": 90, "energy": 12,
                "attack": {"name": "Kick", "damage": 18, "cost": 4},
                "defence": {"name": "Sharingan", "cost": 2},
                "special": {"name": "Chidori", "damage": 50, "cost": 9}
            }
        ],
        "battles": [
            {"id": 1, "title": "Academy"},
            {"id": 2, "title": "Valley of the End"}
        ]
    }"#;

    #[test]
    fn test_load_book() {
        let (roster, campaign) = FightBook::from_json(BOOK).unwrap().into_providers().unwrap();
        assert_eq!(roster.len(), 2);

        let naruto = roster.combatant(1).unwrap();
        assert_eq!(naruto.name, "Naruto");
        assert_eq!(naruto.energy.now, 10);
        assert_eq!(naruto.attack.cue.as_deref(), Some("punch.mp3"));
        assert_eq!(naruto.defence.kind, ActionKind::Defence);
        assert_eq!(naruto.defence.damage, 0);

        let sasuke = roster.combatant(2).unwrap();
        assert_eq!(sasuke.energy.max, 12);

        assert!(roster.combatant(3).is_none());
        assert_eq!(campaign.battle_context(2).map(|b| b.title), Some("Valley of the End".into()));
        assert!(campaign.battle_context(9).is_none());
    }

    #[test]
    fn test_listing_is_ordered() {
        let (roster, campaign) = FightBook::from_json(BOOK).unwrap().into_providers().unwrap();

        let names: Vec<_> = roster.combatants().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Naruto", "Sasuke"]);

        let ids: Vec<_> = campaign.battles().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(campaign.is_last_battle(2));
        assert!(!campaign.is_last_battle(1));
    }

    #[test]
    fn test_last_battle() {
        let (_, campaign) = FightBook::from_json(BOOK).unwrap().into_providers().unwrap();
        assert!(!campaign.is_last_battle(1));
        assert!(campaign.is_last_battle(2));
        assert!(!campaign.is_last_battle(BattleContext::STANDALONE_ID));
        assert!(!CampaignBook::default().is_last_battle(1));
    }

    #[test]
    fn test_roster_hands_out_copies() {
        let (roster, _) = FightBook::from_json(BOOK).unwrap().into_providers().unwrap();
        let mut first = roster.combatant(1).unwrap();
        first.health.remove(50);
        assert_eq!(roster.combatant(1).unwrap().health.now, 100);
    }

    #[test]
    fn test_duplicate_combatant_rejected() {
        let mut book = FightBook::from_json(BOOK).unwrap();
        let copy = book.combatants[0].clone();
        book.combatants.push(copy);
        assert!(matches!(book.into_providers(), Err(BookError::DuplicateCombatant(1))));
    }

    #[test]
    fn test_duplicate_battle_rejected() {
        let mut book = FightBook::from_json(BOOK).unwrap();
        book.battles.push(BattleContext::new(1, "Again"));
        assert!(matches!(book.into_providers(), Err(BookError::DuplicateBattle(1))));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(FightBook::from_json("{\"combatants\": 3}"), Err(BookError::Json(_))));
    }

    #[test]
    fn test_standalone_context() {
        let ctx = BattleContext::standalone();
        assert!(ctx.is_standalone());
        assert!(!BattleContext::new(3, "x").is_standalone());
    }
}
