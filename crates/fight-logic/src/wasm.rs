//! WASM bindings for the browser fight screen

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;
use crate::{describe_strategy, run_encounter, Strategy, StrategyBase, StrategyOracle};
use crate::{ActionKind, Combatant, CombatantEntry, Encounter, EncounterConfig, FightBook, RecordingSink};

/// Parse a strategy from JSON.
///
/// Accepts two formats:
/// - Full: `{"base": "Turtle", "params": {...}}`
/// - Bare: `"Turtle"`
fn parse_strategy(json: &str) -> Result<Strategy, String> {
    if let Ok(strategy) = serde_json::from_str::<Strategy>(json) {
        return Ok(strategy);
    }
    let name: String = serde_json::from_str(json)
        .map_err(|e| format!("Invalid strategy: {}", e))?;
    StrategyBase::from_name(&name)
        .map(Strategy::new)
        .ok_or_else(|| format!("Unknown strategy: {}", name))
}

fn parse_combatant(json: &str) -> Result<Combatant, String> {
    let entry: CombatantEntry = serde_json::from_str(json)
        .map_err(|e| format!("Invalid combatant: {}", e))?;
    Ok(entry.into())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Replay an automatic encounter with full round-by-round details
///
/// # Arguments
/// * `player_json` / `opponent_json` - Fight-book combatant entries
/// * `player_strategy_json` / `opponent_strategy_json` - Strategies for each side
/// * `seed` - Randomness seed
/// * `max_rounds` - Round cap
///
/// # Returns
/// JSON serialized EncounterResult
#[wasm_bindgen]
pub fn replay_encounter(
    player_json: &str,
    opponent_json: &str,
    player_strategy_json: &str,
    opponent_strategy_json: &str,
    seed: u64,
    max_rounds: u32,
) -> Result<JsValue, JsError> {
    let player = parse_combatant(player_json)
        .map_err(|e| JsError::new(&format!("Invalid player: {}", e)))?;
    let opponent = parse_combatant(opponent_json)
        .map_err(|e| JsError::new(&format!("Invalid opponent: {}", e)))?;
    let player_strategy = parse_strategy(player_strategy_json)
        .map_err(|e| JsError::new(&format!("Invalid player strategy: {}", e)))?;
    let opponent_strategy = parse_strategy(opponent_strategy_json)
        .map_err(|e| JsError::new(&format!("Invalid opponent strategy: {}", e)))?;

    let mut player_oracle = StrategyOracle::new(player_strategy, seed, 0);
    let mut opponent_oracle = StrategyOracle::new(opponent_strategy, seed, 1);
    let config = EncounterConfig { max_rounds, ..EncounterConfig::instant() };

    let result = run_encounter(player, opponent, &mut player_oracle, &mut opponent_oracle, &config)
        .map_err(|e| JsError::new(&e.to_string()))?;

    to_js(&result)
}

/// Get human-readable description of a strategy
#[wasm_bindgen]
pub fn get_strategy_description(strategy_json: &str) -> Result<String, JsError> {
    let strategy = parse_strategy(strategy_json).map_err(|e| JsError::new(&e))?;
    Ok(describe_strategy(&strategy))
}

#[derive(serde::Serialize)]
struct StrategyInfo {
    id: String,
    description: String,
}

/// Get all available strategy base types
#[wasm_bindgen]
pub fn get_strategy_types() -> Result<JsValue, JsError> {
    let types: Vec<StrategyInfo> = StrategyBase::ALL
        .into_iter()
        .map(|base| StrategyInfo {
            id: base.as_str().to_string(),
            description: describe_strategy(&Strategy::new(base)),
        })
        .collect();

    to_js(&types)
}

/// Create a strategy JSON from base type
#[wasm_bindgen]
pub fn create_strategy(base: &str) -> Result<String, JsError> {
    let base = StrategyBase::from_name(base)
        .ok_or_else(|| JsError::new(&format!("Unknown strategy: {}", base)))?;

    serde_json::to_string(&Strategy::new(base))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct Sides<'a> {
    player: &'a Combatant,
    opponent: &'a Combatant,
}

/// A live encounter driven step by step from the fight screen
#[wasm_bindgen]
pub struct WasmEncounter {
    inner: Encounter<RecordingSink>,
    oracle: StrategyOracle,
}

#[wasm_bindgen]
impl WasmEncounter {
    /// Start an encounter from a fight book.
    ///
    /// An unknown battle id starts a standalone encounter.
    #[wasm_bindgen(constructor)]
    pub fn new(
        book_json: &str,
        battle_id: u32,
        player_id: u32,
        opponent_id: u32,
        strategy_json: &str,
        seed: u64,
    ) -> Result<WasmEncounter, JsError> {
        let (roster, campaign) = FightBook::from_json(book_json)
            .and_then(FightBook::into_providers)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let strategy = parse_strategy(strategy_json).map_err(|e| JsError::new(&e))?;

        let inner = Encounter::from_providers(
            &roster,
            &campaign,
            battle_id,
            player_id,
            opponent_id,
            RecordingSink::new(),
        )
        .map_err(|e| JsError::new(&e.to_string()))?;

        Ok(Self {
            inner,
            oracle: StrategyOracle::new(strategy, seed, 1),
        })
    }

    /// Current phase name, e.g. `PlayerChoice` or `Won`
    pub fn phase(&self) -> String {
        format!("{:?}", self.inner.phase())
    }

    pub fn title(&self) -> String {
        self.inner.phase().title().to_string()
    }

    /// `{attack, defence, special}` booleans for the choice buttons
    pub fn affordability(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.affordability())
    }

    /// Both combatants as `{player, opponent}`
    pub fn combatants(&self) -> Result<JsValue, JsError> {
        to_js(&Sides {
            player: self.inner.player(),
            opponent: self.inner.opponent(),
        })
    }

    pub fn enter_player_choice(&mut self) -> Result<JsValue, JsError> {
        let affordability = self
            .inner
            .enter_player_choice_phase()
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&affordability)
    }

    /// Submit `attack`, `defence` or `special`
    pub fn submit(&mut self, kind: &str) -> Result<(), JsError> {
        let kind = ActionKind::from_label(kind)
            .ok_or_else(|| JsError::new(&format!("Unknown move: {}", kind)))?;
        self.inner
            .submit_player_choice(kind)
            .map(|_| ())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn resolve_opponent(&mut self) -> Result<JsValue, JsError> {
        let action = self
            .inner
            .resolve_opponent_choice(&mut self.oracle)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&action)
    }

    pub fn resolve_round(&mut self) -> Result<JsValue, JsError> {
        let report = self
            .inner
            .resolve_round()
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&report)
    }

    /// Drain the notifications recorded since the last call
    pub fn take_events(&mut self) -> Result<JsValue, JsError> {
        let events = std::mem::take(&mut self.inner.sink_mut().events);
        to_js(&events)
    }

    /// Drain the audio cues requested since the last call
    pub fn take_cues(&mut self) -> js_sys::Array {
        std::mem::take(&mut self.inner.sink_mut().cues)
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    /// Post-encounter path once the encounter is over
    pub fn route(&self) -> Option<String> {
        self.inner.conclusion().map(|c| c.route.to_string())
    }
}
