//! A single combatant: movement, strikes, dash and status timers

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::combat::{CombatSystem, HitResult, StrikeKind};
use super::input::{Controls, FighterInput};
use super::physics::{FighterStats, PhysicsSystem};

/// Idle animation advances one frame every this many ticks
const ANIM_TICKS_PER_FRAME: u8 = 10;
const ANIM_FRAMES: u8 = 4;

/// Visual state the renderer tints a fighter with, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorState {
    Stunned,
    Blocking,
    Attacking,
    Dashing,
    Normal,
}

/// Fighter state (authoritative)
#[derive(Debug, Clone)]
pub struct Fighter {
    pub name: String,
    pub controls: Controls,
    pub stats: FighterStats,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub vel_y: f32,
    pub on_ground: bool,
    pub facing_right: bool,

    // Combat
    health: i32,
    pub combo_count: u32,
    pub last_attack_ms: Option<u64>,
    pub is_attacking: bool,
    pub attack_anim_ticks: u32,
    pub is_blocking: bool,

    // Special
    special_energy: i32,

    // Dash
    pub last_dash_ms: Option<u64>,
    pub is_dashing: bool,
    pub dash_anim_ticks: u32,

    // Status
    pub stunned: bool,
    pub stun_ticks: u32,

    // Idle animation
    pub anim_frame: u8,
    anim_timer: u8,
}

impl Fighter {
    pub fn new(
        name: impl Into<String>,
        controls: Controls,
        stats: FighterStats,
        start_x: f32,
        ground_y: f32,
    ) -> Self {
        Self {
            name: name.into(),
            controls,
            stats,
            x: PhysicsSystem::clamp_x(start_x, stats.width),
            y: ground_y - stats.height,
            vel_y: 0.0,
            on_ground: true,
            facing_right: true,
            health: stats.max_health,
            combo_count: 0,
            last_attack_ms: None,
            is_attacking: false,
            attack_anim_ticks: 0,
            is_blocking: false,
            special_energy: 0,
            last_dash_ms: None,
            is_dashing: false,
            dash_anim_ticks: 0,
            stunned: false,
            stun_ticks: 0,
            anim_frame: 0,
            anim_timer: 0,
        }
    }

    /// Restore the fighter to its round-start state
    pub fn reset(&mut self, start_x: f32, ground_y: f32) {
        *self = Self::new(
            std::mem::take(&mut self.name),
            self.controls,
            self.stats,
            start_x,
            ground_y,
        );
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.stats.max_health
    }

    /// Set health, clamped to `[0, max_health]`
    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, self.stats.max_health);
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }

    pub fn special_energy(&self) -> i32 {
        self.special_energy
    }

    /// Set special energy, clamped to `[0, max_special_energy]`
    pub fn set_special_energy(&mut self, energy: i32) {
        self.special_energy = energy.clamp(0, self.stats.max_special_energy);
    }

    pub fn has_special_energy(&self) -> bool {
        self.special_energy >= self.stats.special_energy_cost
    }

    pub fn distance_to(&self, other: &Fighter) -> f32 {
        PhysicsSystem::horizontal_distance(self.x, other.x)
    }

    /// Advance one tick with the held-style part of `input`
    pub fn update(&mut self, input: &FighterInput, ground_y: f32) {
        if self.stunned {
            self.stun_ticks = self.stun_ticks.saturating_sub(1);
            if self.stun_ticks == 0 {
                self.stunned = false;
            }
            return;
        }

        if self.is_dashing {
            self.dash_anim_ticks = self.dash_anim_ticks.saturating_sub(1);
            if self.dash_anim_ticks == 0 {
                self.is_dashing = false;
            }
        }

        let can_move = !self.is_attacking && !self.is_dashing;

        if input.left && can_move {
            self.x = PhysicsSystem::clamp_x(self.x - self.stats.speed, self.stats.width);
            self.facing_right = false;
        }
        if input.right && can_move {
            self.x = PhysicsSystem::clamp_x(self.x + self.stats.speed, self.stats.width);
            self.facing_right = true;
        }

        if input.jump && self.on_ground && can_move {
            self.vel_y = -self.stats.jump_power;
            self.on_ground = false;
        }

        self.is_blocking = input.block && !self.is_dashing;

        if !self.on_ground {
            let fall = PhysicsSystem::fall(
                self.y,
                self.vel_y,
                self.stats.gravity,
                ground_y - self.stats.height,
            );
            self.y = fall.y;
            self.vel_y = fall.vel_y;
            self.on_ground = fall.landed;
        }

        if self.is_attacking {
            self.attack_anim_ticks = self.attack_anim_ticks.saturating_sub(1);
            if self.attack_anim_ticks == 0 {
                self.is_attacking = false;
            }
        }

        self.anim_timer += 1;
        if self.anim_timer >= ANIM_TICKS_PER_FRAME {
            self.anim_frame = (self.anim_frame + 1) % ANIM_FRAMES;
            self.anim_timer = 0;
        }
    }

    /// Basic attack. Returns true only if the attack executed.
    pub fn attack(&mut self, target: &mut Fighter, now_ms: u64) -> bool {
        self.strike(target, now_ms).is_some()
    }

    /// Basic attack with the details of the hit
    pub fn strike(&mut self, target: &mut Fighter, now_ms: u64) -> Option<HitResult> {
        if !CombatSystem::cooldown_elapsed(self.last_attack_ms, now_ms, self.stats.attack_cooldown_ms) {
            return None;
        }
        if self.is_attacking || self.stunned || self.is_dashing {
            return None;
        }
        if self.distance_to(target) > self.stats.attack_range {
            return None;
        }

        let previous_attack = self.last_attack_ms.replace(now_ms);
        self.is_attacking = true;
        self.attack_anim_ticks = self.stats.attack_anim_ticks;

        let blocked = target.is_blocking;
        let raw_damage = if blocked {
            CombatSystem::blocked_damage(self.stats.attack_power)
        } else {
            self.combo_count = CombatSystem::next_combo(
                self.combo_count,
                previous_attack,
                now_ms,
                self.stats.combo_window_ms,
            );
            self.stats.attack_power + CombatSystem::combo_bonus(self.combo_count)
        };

        let dealt = target.take_damage(raw_damage);
        self.set_special_energy(self.special_energy + self.stats.energy_per_hit);

        trace!(attacker = %self.name, target = %target.name, dealt, blocked, combo = self.combo_count, "Basic attack landed");

        Some(HitResult {
            kind: StrikeKind::Basic,
            raw_damage,
            dealt,
            blocked,
            stunned: false,
            combo: self.combo_count,
            target_defeated: target.is_defeated(),
        })
    }

    /// Special attack. Returns true only if the attack executed.
    pub fn special_attack(&mut self, target: &mut Fighter, now_ms: u64) -> bool {
        self.special_strike(target, now_ms).is_some()
    }

    /// Special attack with the details of the hit.
    ///
    /// Blocking prevents the stun but not the damage.
    pub fn special_strike(&mut self, target: &mut Fighter, now_ms: u64) -> Option<HitResult> {
        if !self.has_special_energy() || self.stunned || self.is_dashing {
            return None;
        }
        if self.distance_to(target) > self.stats.special_range {
            return None;
        }

        self.special_energy -= self.stats.special_energy_cost;
        self.is_attacking = true;
        self.attack_anim_ticks = self.stats.special_anim_ticks;

        let raw_damage = self.stats.attack_power * 2;
        let blocked = target.is_blocking;
        if !blocked {
            target.stunned = true;
            target.stun_ticks = self.stats.special_stun_ticks;
        }
        let dealt = target.take_damage(raw_damage);

        trace!(attacker = %self.name, target = %target.name, dealt, blocked, now_ms, "Special attack landed");

        Some(HitResult {
            kind: StrikeKind::Special,
            raw_damage,
            dealt,
            blocked,
            stunned: !blocked,
            combo: self.combo_count,
            target_defeated: target.is_defeated(),
        })
    }

    /// Short teleport along the facing direction
    pub fn dash(&mut self, now_ms: u64) -> bool {
        if !self.can_dash(now_ms) {
            return false;
        }

        self.last_dash_ms = Some(now_ms);
        self.is_dashing = true;
        self.dash_anim_ticks = self.stats.dash_anim_ticks;

        let offset = if self.facing_right {
            self.stats.dash_distance
        } else {
            -self.stats.dash_distance
        };
        self.x = PhysicsSystem::clamp_x(self.x + offset, self.stats.width);
        true
    }

    pub fn can_dash(&self, now_ms: u64) -> bool {
        CombatSystem::cooldown_elapsed(self.last_dash_ms, now_ms, self.stats.dash_cooldown_ms)
            && !self.stunned
            && !self.is_attacking
            && !self.is_dashing
    }

    /// Seconds until the dash is off cooldown, never negative
    pub fn dash_cooldown_remaining(&self, now_ms: u64) -> f32 {
        CombatSystem::cooldown_remaining_ms(self.last_dash_ms, now_ms, self.stats.dash_cooldown_ms) as f32
            / 1000.0
    }

    /// Apply incoming damage after defense, returns the health removed
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let damage = CombatSystem::effective_damage(amount, self.stats.defense);
        let before = self.health;
        let (health, _) = CombatSystem::apply_damage(self.health, damage);
        self.health = health;
        before - health
    }

    pub fn color_state(&self) -> ColorState {
        if self.stunned {
            ColorState::Stunned
        } else if self.is_blocking {
            ColorState::Blocking
        } else if self.is_attacking {
            ColorState::Attacking
        } else if self.is_dashing {
            ColorState::Dashing
        } else {
            ColorState::Normal
        }
    }
}
