//! Encounter configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Presentation pauses between phases, in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Opponent "thinking" time before its move is resolved
    pub opponent_think_ms: u64,
    /// How long a round's result stays up before the next round opens
    pub round_result_ms: u64,
    /// How long the final result stays up before navigating away
    pub result_display_ms: u64,
}

impl Pacing {
    /// Fight screen timings
    pub const fn standard() -> Self {
        Self {
            opponent_think_ms: 2000,
            round_result_ms: 4000,
            result_display_ms: 2000,
        }
    }

    /// No pauses at all
    pub const fn instant() -> Self {
        Self {
            opponent_think_ms: 0,
            round_result_ms: 0,
            result_display_ms: 0,
        }
    }

    pub fn opponent_think(&self) -> Duration {
        Duration::from_millis(self.opponent_think_ms)
    }

    pub fn round_result(&self) -> Duration {
        Duration::from_millis(self.round_result_ms)
    }

    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::standard()
    }
}

/// Configuration for one encounter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub pacing: Pacing,
    /// Round cap for automatic encounters; interactive play is uncapped
    pub max_rounds: u32,
}

impl EncounterConfig {
    pub const fn standard() -> Self {
        Self {
            pacing: Pacing::standard(),
            max_rounds: 200,
        }
    }

    /// Standard limits without pauses (simulation and tests)
    pub const fn instant() -> Self {
        Self {
            pacing: Pacing::instant(),
            max_rounds: 200,
        }
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self::standard()
    }
}
