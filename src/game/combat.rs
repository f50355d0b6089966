//! Combat rules - damage, blocking, combos and cooldowns

use serde::{Deserialize, Serialize};

/// Which strike landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeKind {
    Basic,
    Special,
}

/// Hit result from a successful strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitResult {
    pub kind: StrikeKind,
    /// Damage handed to the target before its defense is applied
    pub raw_damage: i32,
    /// Health actually removed from the target
    pub dealt: i32,
    pub blocked: bool,
    pub stunned: bool,
    /// Attacker's combo count after this hit
    pub combo: u32,
    pub target_defeated: bool,
}

/// Combat system for damage and timing rules
pub struct CombatSystem;

impl CombatSystem {
    /// Damage remaining after defense. Always at least 1.
    pub fn effective_damage(amount: i32, defense: i32) -> i32 {
        amount.saturating_sub(defense).max(1)
    }

    /// Apply damage to health, returns (new_health, is_defeated)
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = current_health.saturating_sub(damage).max(0);
        (new_health, new_health == 0)
    }

    /// A guarded basic attack deals half, rounded down, never below 1
    pub fn blocked_damage(damage: i32) -> i32 {
        damage.div_euclid(2).max(1)
    }

    /// Combo count after an unblocked hit at `now_ms`.
    ///
    /// The gap is measured against the attacker's previous attack; an
    /// attacker with no previous attack starts from zero.
    pub fn next_combo(combo: u32, previous_attack_ms: Option<u64>, now_ms: u64, window_ms: u64) -> u32 {
        match previous_attack_ms {
            Some(prev) if now_ms.saturating_sub(prev) < window_ms => combo + 1,
            _ => 0,
        }
    }

    /// Bonus damage granted at a given combo count
    pub fn combo_bonus(combo: u32) -> i32 {
        2 * combo as i32
    }

    /// Check whether a cooldown started at `last_ms` has run out
    pub fn cooldown_elapsed(last_ms: Option<u64>, now_ms: u64, cooldown_ms: u64) -> bool {
        Self::cooldown_remaining_ms(last_ms, now_ms, cooldown_ms) == 0
    }

    pub fn cooldown_remaining_ms(last_ms: Option<u64>, now_ms: u64, cooldown_ms: u64) -> u64 {
        match last_ms {
            Some(last) => cooldown_ms.saturating_sub(now_ms.saturating_sub(last)),
            None => 0,
        }
    }
}
