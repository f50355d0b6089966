//! Opponent decision-maker.
//!
//! The decision-maker never calls fighter methods. Every so often it picks an
//! [`AiAction`] from the distance to its target and a tier-specific set of
//! chance gates, then keeps emitting the input frame that action implies
//! until its timer runs out. The match feeds that frame to the fighter the
//! same way it feeds a human player's keys.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fighter::Fighter;
use super::input::{Action, InputFrame};

/// Beyond this gap the opponent closes in
const FAR_RANGE: f32 = 200.0;
/// At or below this gap the opponent fights
const NEAR_RANGE: f32 = 80.0;

/// Opponent difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn profile(self) -> &'static AiProfile {
        match self {
            Difficulty::Easy => &PROFILES[0],
            Difficulty::Medium => &PROFILES[1],
            Difficulty::Hard => &PROFILES[2],
            Difficulty::Expert => &PROFILES[3],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown difficulty '{0}' (expected easy, medium, hard or expert)")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDifficultyError(s.to_string()))
    }
}

/// Timing and chance parameters for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    /// Minimum time between decisions
    pub decision_interval_ms: u64,
    /// Carried for tuning displays, not consulted by the decision logic
    pub reaction_ms: u64,
    pub accuracy: f64,
    pub block_chance: f64,
    pub special_chance: f64,
    /// Carried for tuning displays, not consulted by the decision logic
    pub combo_chance: f64,
    pub dodge_chance: f64,
    pub dash_chance: f64,
}

static PROFILES: [AiProfile; 4] = [
    AiProfile {
        decision_interval_ms: 1000,
        reaction_ms: 500,
        accuracy: 0.3,
        block_chance: 0.2,
        special_chance: 0.1,
        combo_chance: 0.1,
        dodge_chance: 0.2,
        dash_chance: 0.1,
    },
    AiProfile {
        decision_interval_ms: 600,
        reaction_ms: 300,
        accuracy: 0.5,
        block_chance: 0.4,
        special_chance: 0.3,
        combo_chance: 0.3,
        dodge_chance: 0.4,
        dash_chance: 0.3,
    },
    AiProfile {
        decision_interval_ms: 300,
        reaction_ms: 150,
        accuracy: 0.7,
        block_chance: 0.6,
        special_chance: 0.5,
        combo_chance: 0.5,
        dodge_chance: 0.6,
        dash_chance: 0.5,
    },
    AiProfile {
        decision_interval_ms: 150,
        reaction_ms: 50,
        accuracy: 0.9,
        block_chance: 0.8,
        special_chance: 0.7,
        combo_chance: 0.7,
        dodge_chance: 0.8,
        dash_chance: 0.7,
    },
];

/// What the opponent is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    MoveLeft,
    MoveRight,
    /// Walk toward the target, direction resolved every tick
    Approach,
    /// Walk away from the target, direction resolved every tick
    Retreat,
    Jump,
    Block,
    Attack,
    SpecialAttack,
    Dash,
    Wait,
}

/// Synthesizes input for one fighter
#[derive(Debug, Clone)]
pub struct DecisionMaker {
    difficulty: Difficulty,
    current_action: Option<AiAction>,
    action_ticks: u32,
    /// `None` until the first decision after construction or a reset
    last_decision_ms: Option<u64>,
    /// Set when a new action is chosen so its key is pressed exactly once
    pending_press: bool,
    rng: ChaCha8Rng,
}

impl DecisionMaker {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            current_action: None,
            action_ticks: 0,
            last_decision_ms: None,
            pending_press: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &'static AiProfile {
        self.difficulty.profile()
    }

    pub fn current_action(&self) -> Option<AiAction> {
        self.current_action.filter(|_| self.action_ticks > 0)
    }

    /// Forget the current action; the next update decides straight away
    pub fn reset(&mut self) {
        self.current_action = None;
        self.action_ticks = 0;
        self.pending_press = false;
        self.last_decision_ms = None;
    }

    /// Advance one tick and return the synthesized frame for `me`.
    ///
    /// `None` means no action is active and the host input passes through.
    pub fn update(&mut self, me: &Fighter, target: &Fighter, now_ms: u64) -> Option<InputFrame> {
        self.action_ticks = self.action_ticks.saturating_sub(1);

        let interval = self.profile().decision_interval_ms;
        let due = self
            .last_decision_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= interval);
        if due {
            self.decide(me, target, now_ms);
            self.last_decision_ms = Some(now_ms);
        }

        self.emit(me, target)
    }

    fn gate(&mut self, chance: f64) -> bool {
        self.rng.gen::<f64>() < chance
    }

    fn decide(&mut self, me: &Fighter, target: &Fighter, now_ms: u64) {
        let profile = *self.profile();
        let distance = me.distance_to(target);

        let (action, ticks) = if distance > FAR_RANGE {
            if me.can_dash(now_ms) && self.gate(profile.dash_chance) {
                (AiAction::Dash, 10)
            } else {
                let toward = if target.x > me.x {
                    AiAction::MoveRight
                } else {
                    AiAction::MoveLeft
                };
                (toward, self.rng.gen_range(30..=90))
            }
        } else if distance > NEAR_RANGE {
            let mut candidates = vec![AiAction::Approach, AiAction::Jump, AiAction::Wait];
            if self.gate(profile.special_chance) && me.has_special_energy() {
                candidates.push(AiAction::SpecialAttack);
            }
            if me.can_dash(now_ms) && self.gate(profile.dash_chance) {
                candidates.push(AiAction::Dash);
            }
            let action = candidates
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(AiAction::Wait);
            (action, self.rng.gen_range(20..=60))
        } else if target.is_attacking && self.gate(profile.block_chance) {
            (AiAction::Block, 20)
        } else if self.gate(profile.accuracy) {
            if self.gate(profile.special_chance) && me.has_special_energy() {
                (AiAction::SpecialAttack, 15)
            } else {
                (AiAction::Attack, 15)
            }
        } else if self.gate(profile.dodge_chance) {
            if me.can_dash(now_ms) && self.gate(profile.dash_chance) {
                (AiAction::Dash, 30)
            } else if self.gate(0.5) {
                (AiAction::Jump, 30)
            } else {
                (AiAction::Retreat, 30)
            }
        } else {
            (AiAction::Wait, 10)
        };

        debug!(
            fighter = %me.name,
            difficulty = %self.difficulty,
            distance,
            ?action,
            ticks,
            "Opponent decision"
        );

        self.current_action = Some(action);
        self.action_ticks = ticks;
        self.pending_press = true;
    }

    fn emit(&mut self, me: &Fighter, target: &Fighter) -> Option<InputFrame> {
        let action = self.current_action()?;

        let logical = match action {
            AiAction::MoveLeft => Some(Action::Left),
            AiAction::MoveRight => Some(Action::Right),
            AiAction::Approach if target.x > me.x => Some(Action::Right),
            AiAction::Approach => Some(Action::Left),
            AiAction::Retreat if target.x > me.x => Some(Action::Left),
            AiAction::Retreat => Some(Action::Right),
            AiAction::Jump => Some(Action::Jump),
            AiAction::Block => Some(Action::Block),
            AiAction::Attack => Some(Action::Attack),
            AiAction::SpecialAttack => Some(Action::Special),
            AiAction::Dash => Some(Action::Dash),
            AiAction::Wait => None,
        };

        // special key is released once the energy is spent
        let logical = logical.filter(|&a| a != Action::Special || me.has_special_energy());
        let fresh = std::mem::take(&mut self.pending_press);

        let mut frame = InputFrame::new();
        if let Some(logical) = logical {
            let key = me.controls.key(logical);
            if fresh {
                frame.press(key);
            } else {
                frame.hold(key);
            }
        }
        Some(frame)
    }
}
