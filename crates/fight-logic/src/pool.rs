//! Capped resource counters (health and chakra)

use serde::{Deserialize, Serialize};

/// A capped counter drained during play.
///
/// `now` has no floor: a removal may drive it below zero and the engine
/// reads any value `<= 0` as depleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub max: i32,
    pub now: i32,
}

impl ResourcePool {
    /// Create a full pool
    pub fn new(max: i32) -> Self {
        Self { max, now: max }
    }

    /// Create a pool with an explicit current value
    pub fn with_now(max: i32, now: i32) -> Self {
        Self { max, now }
    }

    /// Subtract `amount` from the current value
    pub fn remove(&mut self, amount: u32) {
        self.now = self.now.saturating_sub_unsigned(amount);
    }

    pub fn is_depleted(&self) -> bool {
        self.now <= 0
    }

    /// Whether the pool currently holds at least `cost`
    pub fn can_afford(&self, cost: u32) -> bool {
        i64::from(self.now) >= i64::from(cost)
    }

    /// Current value as a percentage of `max`, clamped to 0-100
    pub fn percent(&self) -> u8 {
        if self.max <= 0 {
            return 0;
        }
        let pct = i64::from(self.now) * 100 / i64::from(self.max);
        pct.clamp(0, 100) as u8
    }
}

impl core::fmt::Display for ResourcePool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.now, self.max)
    }
}
