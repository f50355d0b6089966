//! Fighter stats and arena kinematics

/// Arena dimensions in pixels
pub const ARENA_WIDTH: f32 = 1024.0;
pub const ARENA_HEIGHT: f32 = 768.0;
/// Y coordinate of the floor surface
pub const GROUND_Y: f32 = ARENA_HEIGHT - 100.0;

/// Starting x positions for the two sides
pub const PLAYER_ONE_START_X: f32 = 200.0;
pub const PLAYER_TWO_START_X: f32 = 600.0;

/// Per-fighter tuning. Durations in ticks are at 60 Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FighterStats {
    /// Hitbox width
    pub width: f32,
    /// Hitbox height
    pub height: f32,
    pub max_health: i32,
    /// Horizontal pixels per tick
    pub speed: f32,
    /// Initial upward velocity of a jump
    pub jump_power: f32,
    /// Downward acceleration per tick while airborne
    pub gravity: f32,

    pub attack_power: i32,
    pub defense: i32,
    pub attack_cooldown_ms: u64,
    pub attack_range: f32,
    pub attack_anim_ticks: u32,
    /// Gap within which consecutive unblocked hits chain into a combo
    pub combo_window_ms: u64,

    pub max_special_energy: i32,
    pub special_energy_cost: i32,
    /// Energy gained per landed basic attack
    pub energy_per_hit: i32,
    pub special_range: f32,
    pub special_anim_ticks: u32,
    pub special_stun_ticks: u32,

    pub dash_distance: f32,
    pub dash_cooldown_ms: u64,
    pub dash_anim_ticks: u32,
}

impl Default for FighterStats {
    fn default() -> Self {
        Self {
            width: 60.0,
            height: 80.0,
            max_health: 100,
            speed: 5.0,
            jump_power: 15.0,
            gravity: 0.8,
            attack_power: 10,
            defense: 5,
            attack_cooldown_ms: 300,
            attack_range: 80.0,
            attack_anim_ticks: 15,
            combo_window_ms: 1000,
            max_special_energy: 100,
            special_energy_cost: 25,
            energy_per_hit: 15,
            special_range: 120.0,
            special_anim_ticks: 30,
            special_stun_ticks: 60,
            dash_distance: 100.0,
            dash_cooldown_ms: 3000,
            dash_anim_ticks: 10,
        }
    }
}

/// Result of one airborne integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fall {
    pub y: f32,
    pub vel_y: f32,
    pub landed: bool,
}

/// Physics helpers shared by fighter movement
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Keep a body of `width` fully inside the arena
    pub fn clamp_x(x: f32, width: f32) -> f32 {
        x.clamp(0.0, ARENA_WIDTH - width)
    }

    /// Apply gravity and integrate one tick.
    /// `rest_y` is the top-left y at which the body stands on the floor.
    pub fn fall(y: f32, vel_y: f32, gravity: f32, rest_y: f32) -> Fall {
        let vel_y = vel_y + gravity;
        let y = y + vel_y;

        if y >= rest_y {
            Fall {
                y: rest_y,
                vel_y: 0.0,
                landed: true,
            }
        } else {
            Fall {
                y,
                vel_y,
                landed: false,
            }
        }
    }

    /// Horizontal gap used for every range check
    pub fn horizontal_distance(x1: f32, x2: f32) -> f32 {
        (x1 - x2).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_body_on_screen() {
        assert_eq!(PhysicsSystem::clamp_x(-12.0, 60.0), 0.0);
        assert_eq!(PhysicsSystem::clamp_x(2000.0, 60.0), ARENA_WIDTH - 60.0);
        assert_eq!(PhysicsSystem::clamp_x(300.0, 60.0), 300.0);
    }

    #[test]
    fn fall_accelerates_then_lands() {
        let step = PhysicsSystem::fall(100.0, -15.0, 0.8, 588.0);
        assert!(!step.landed);
        assert!((step.vel_y - (-14.2)).abs() < 1e-4);
        assert!((step.y - 85.8).abs() < 1e-4);

        let landing = PhysicsSystem::fall(587.0, 3.0, 0.8, 588.0);
        assert!(landing.landed);
        assert_eq!(landing.y, 588.0);
        assert_eq!(landing.vel_y, 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(PhysicsSystem::horizontal_distance(200.0, 600.0), 400.0);
        assert_eq!(PhysicsSystem::horizontal_distance(600.0, 200.0), 400.0);
    }
}
