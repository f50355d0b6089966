//! Match state and authoritative tick

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{tick_delta, Clock};

use super::ai::{DecisionMaker, Difficulty};
use super::combat::HitResult;
use super::fighter::Fighter;
use super::input::{Controls, FighterInput, InputFrame};
use super::physics::{FighterStats, GROUND_Y, PLAYER_ONE_START_X, PLAYER_TWO_START_X};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Round in progress
    Active,
    /// Round decided, waiting for a reset
    Over,
}

/// One of the two fighters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "side", rename_all = "snake_case")]
pub enum Outcome {
    Winner(Side),
    Draw,
}

/// Who controls fighter two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "difficulty", rename_all = "snake_case")]
pub enum MatchMode {
    /// Both fighters read host input
    Versus,
    /// Fighter two is driven by a decision-maker
    VersusAi(Difficulty),
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Hit { attacker: Side, hit: HitResult },
    Dashed { side: Side },
    RoundOver { round: u32, outcome: Outcome },
}

/// Round and fighter configuration
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub round_time_secs: f32,
    /// Rounds in a series; a side needs a majority to take it
    pub max_rounds: u32,
    pub ai_seed: u64,
    pub stats: FighterStats,
    pub player_one_name: String,
    pub player_two_name: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            round_time_secs: 180.0,
            max_rounds: 3,
            ai_seed: 0,
            stats: FighterStats::default(),
            player_one_name: "Player 1".to_string(),
            player_two_name: "Player 2".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("round {0} is still in progress")]
    RoundInProgress(u32),
}

/// The authoritative two-fighter match
pub struct GameMatch {
    id: Uuid,
    clock: Arc<dyn Clock>,
    config: MatchConfig,
    mode: MatchMode,
    phase: MatchPhase,
    tick: u64,
    fighters: [Fighter; 2],
    opponent: Option<DecisionMaker>,
    remaining_time_secs: f32,
    outcome: Option<Outcome>,
    round: u32,
    round_wins: [u32; 2],
}

impl GameMatch {
    /// Create a match with its first round already running
    pub fn new(config: MatchConfig, mode: MatchMode, clock: Arc<dyn Clock>) -> Self {
        let fighters = [
            Fighter::new(
                config.player_one_name.clone(),
                Controls::player_one(),
                config.stats,
                PLAYER_ONE_START_X,
                GROUND_Y,
            ),
            Fighter::new(
                Self::player_two_name(&config, mode),
                Controls::player_two(),
                config.stats,
                PLAYER_TWO_START_X,
                GROUND_Y,
            ),
        ];

        let mut game_match = Self {
            id: Uuid::new_v4(),
            clock,
            remaining_time_secs: config.round_time_secs,
            opponent: None,
            config,
            mode,
            phase: MatchPhase::Active,
            tick: 0,
            fighters,
            outcome: None,
            round: 1,
            round_wins: [0, 0],
        };
        game_match.opponent = game_match.build_opponent();

        info!(match_id = %game_match.id, ?mode, "Match created");
        game_match
    }

    fn player_two_name(config: &MatchConfig, mode: MatchMode) -> String {
        match mode {
            MatchMode::Versus => config.player_two_name.clone(),
            MatchMode::VersusAi(difficulty) => format!("CPU ({difficulty})"),
        }
    }

    fn build_opponent(&self) -> Option<DecisionMaker> {
        match self.mode {
            MatchMode::Versus => None,
            MatchMode::VersusAi(difficulty) => {
                let seed = self.config.ai_seed.wrapping_add(u64::from(self.round));
                Some(DecisionMaker::new(difficulty, seed))
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn round_wins(&self) -> [u32; 2] {
        self.round_wins
    }

    pub fn max_rounds(&self) -> u32 {
        self.config.max_rounds
    }

    pub fn remaining_time_secs(&self) -> f32 {
        self.remaining_time_secs
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn fighter(&self, side: Side) -> &Fighter {
        &self.fighters[side.index()]
    }

    pub fn fighter_mut(&mut self, side: Side) -> &mut Fighter {
        &mut self.fighters[side.index()]
    }

    pub fn opponent(&self) -> Option<&DecisionMaker> {
        self.opponent.as_ref()
    }

    /// Side holding a majority of the series, if any
    pub fn series_winner(&self) -> Option<Side> {
        let needed = self.config.max_rounds / 2 + 1;
        [Side::One, Side::Two]
            .into_iter()
            .find(|side| self.round_wins[side.index()] >= needed)
    }

    /// Run a single simulation tick with the host's input frame
    pub fn advance(&mut self, host: &InputFrame) -> Vec<MatchEvent> {
        if self.phase == MatchPhase::Over {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        self.tick += 1;

        let [one, two] = &mut self.fighters;

        let synthetic = self
            .opponent
            .as_mut()
            .and_then(|ai| ai.update(two, one, now));

        let input_one = one.controls.decode(host);
        // host presses never reach an AI-driven fighter, only its held keys pass through
        let frame_two = if self.opponent.is_some() {
            InputFrame::merge(&host.without_presses(&two.controls), synthetic.as_ref(), &two.controls)
        } else {
            InputFrame::merge(host, synthetic.as_ref(), &two.controls)
        };
        let input_two = two.controls.decode(&frame_two);

        one.update(&input_one, GROUND_Y);
        two.update(&input_two, GROUND_Y);

        let mut events = Self::resolve_triggers(Side::One, one, two, &input_one, now);
        events.extend(Self::resolve_triggers(Side::Two, two, one, &input_two, now));

        self.remaining_time_secs = (self.remaining_time_secs - tick_delta()).max(0.0);

        if let Some(outcome) = self.check_outcome() {
            events.push(self.finish_round(outcome));
        }

        events
    }

    /// Perform the edge-triggered actions asserted this tick
    fn resolve_triggers(
        side: Side,
        me: &mut Fighter,
        foe: &mut Fighter,
        input: &FighterInput,
        now_ms: u64,
    ) -> Vec<MatchEvent> {
        let mut events = Vec::new();

        if input.attack {
            if let Some(hit) = me.strike(foe, now_ms) {
                events.push(MatchEvent::Hit { attacker: side, hit });
            }
        }
        if input.special {
            if let Some(hit) = me.special_strike(foe, now_ms) {
                events.push(MatchEvent::Hit { attacker: side, hit });
            }
        }
        if input.dash && me.dash(now_ms) {
            events.push(MatchEvent::Dashed { side });
        }

        for event in &events {
            debug!(fighter = %me.name, ?event, "Action resolved");
        }
        events
    }

    /// Check win condition
    fn check_outcome(&self) -> Option<Outcome> {
        let [one, two] = &self.fighters;

        if one.is_defeated() {
            Some(Outcome::Winner(Side::Two))
        } else if two.is_defeated() {
            Some(Outcome::Winner(Side::One))
        } else if self.remaining_time_secs <= 0.0 {
            Some(match one.health().cmp(&two.health()) {
                std::cmp::Ordering::Greater => Outcome::Winner(Side::One),
                std::cmp::Ordering::Less => Outcome::Winner(Side::Two),
                std::cmp::Ordering::Equal => Outcome::Draw,
            })
        } else {
            None
        }
    }

    fn finish_round(&mut self, outcome: Outcome) -> MatchEvent {
        self.phase = MatchPhase::Over;
        self.outcome = Some(outcome);
        if let Outcome::Winner(side) = outcome {
            self.round_wins[side.index()] += 1;
        }

        info!(
            match_id = %self.id,
            round = self.round,
            ?outcome,
            tick = self.tick,
            wins_one = self.round_wins[0],
            wins_two = self.round_wins[1],
            "Round over"
        );

        MatchEvent::RoundOver {
            round: self.round,
            outcome,
        }
    }

    /// Start the next round, or a fresh series once the current one is decided
    pub fn reset(&mut self) -> Result<(), MatchError> {
        if self.phase == MatchPhase::Active {
            return Err(MatchError::RoundInProgress(self.round));
        }

        if self.series_winner().is_some() || self.round >= self.config.max_rounds {
            self.round = 1;
            self.round_wins = [0, 0];
        } else {
            self.round += 1;
        }

        self.fighters[0].reset(PLAYER_ONE_START_X, GROUND_Y);
        self.fighters[1].reset(PLAYER_TWO_START_X, GROUND_Y);
        self.remaining_time_secs = self.config.round_time_secs;
        self.outcome = None;
        self.phase = MatchPhase::Active;

        if let Some(ai) = self.opponent.as_mut() {
            ai.reset();
        }

        info!(match_id = %self.id, round = self.round, "Round started");
        Ok(())
    }

    /// Switch who controls fighter two. Starts a fresh series.
    pub fn set_mode(&mut self, mode: MatchMode) -> Result<(), MatchError> {
        if self.phase == MatchPhase::Active {
            return Err(MatchError::RoundInProgress(self.round));
        }

        self.mode = mode;
        self.fighters[1].name = Self::player_two_name(&self.config, mode);
        self.round = self.config.max_rounds;
        self.round_wins = [0, 0];
        self.reset()?;
        self.opponent = self.build_opponent();

        info!(match_id = %self.id, ?mode, "Match mode changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::keys;
    use crate::util::time::ManualClock;

    fn versus(config: MatchConfig) -> (GameMatch, ManualClock) {
        let clock = ManualClock::new(10_000);
        let game_match = GameMatch::new(config, MatchMode::Versus, Arc::new(clock.clone()));
        (game_match, clock)
    }

    fn idle() -> InputFrame {
        InputFrame::new()
    }

    fn run_until_over(game_match: &mut GameMatch, clock: &ManualClock, max_ticks: u32) {
        for _ in 0..max_ticks {
            if game_match.phase() == MatchPhase::Over {
                return;
            }
            clock.advance(16);
            game_match.advance(&idle());
        }
    }

    #[test]
    fn new_match_starts_active_at_start_positions() {
        let (m, _) = versus(MatchConfig::default());
        assert_eq!(m.phase(), MatchPhase::Active);
        assert_eq!(m.fighter(Side::One).x, PLAYER_ONE_START_X);
        assert_eq!(m.fighter(Side::Two).x, PLAYER_TWO_START_X);
        assert_eq!(m.remaining_time_secs(), 180.0);
        assert!(m.opponent().is_none());
    }

    #[test]
    fn attack_then_immediate_retry_lands_once() {
        let (mut m, clock) = versus(MatchConfig::default());
        m.fighter_mut(Side::Two).x = PLAYER_ONE_START_X + 50.0;

        let mut frame = InputFrame::new();
        frame.press(keys::F);
        let events = m.advance(&frame);
        assert_eq!(m.fighter(Side::Two).health(), 95);
        assert!(matches!(
            events.as_slice(),
            [MatchEvent::Hit { attacker: Side::One, .. }]
        ));

        clock.advance(100);
        let mut again = InputFrame::new();
        again.press(keys::F);
        let events = m.advance(&again);
        assert!(events.is_empty());
        assert_eq!(m.fighter(Side::Two).health(), 95);
    }

    #[test]
    fn holding_attack_does_not_repeat() {
        let (mut m, clock) = versus(MatchConfig::default());
        m.fighter_mut(Side::Two).x = PLAYER_ONE_START_X + 50.0;

        let mut frame = InputFrame::new();
        frame.press(keys::F);
        m.advance(&frame);

        let mut held = InputFrame::new();
        held.hold(keys::F);
        for _ in 0..60 {
            clock.advance(16);
            m.advance(&held);
        }
        assert_eq!(m.fighter(Side::Two).health(), 95);
    }

    #[test]
    fn clock_expiry_awards_higher_health() {
        let (mut m, clock) = versus(MatchConfig {
            round_time_secs: 0.1,
            ..Default::default()
        });
        m.fighter_mut(Side::One).set_health(60);
        m.fighter_mut(Side::Two).set_health(40);

        run_until_over(&mut m, &clock, 20);
        assert_eq!(m.phase(), MatchPhase::Over);
        assert_eq!(m.outcome(), Some(Outcome::Winner(Side::One)));
        assert_eq!(m.round_wins(), [1, 0]);
        assert_eq!(m.remaining_time_secs(), 0.0);
    }

    #[test]
    fn clock_expiry_with_equal_health_is_a_draw() {
        let (mut m, clock) = versus(MatchConfig {
            round_time_secs: 0.1,
            ..Default::default()
        });
        m.fighter_mut(Side::One).set_health(70);
        m.fighter_mut(Side::Two).set_health(70);

        run_until_over(&mut m, &clock, 20);
        assert_eq!(m.phase(), MatchPhase::Over);
        assert_eq!(m.outcome(), Some(Outcome::Draw));
        assert_eq!(m.round_wins(), [0, 0]);
    }

    #[test]
    fn knockout_ends_round_and_freezes_simulation() {
        let (mut m, clock) = versus(MatchConfig::default());
        m.fighter_mut(Side::Two).x = PLAYER_ONE_START_X + 50.0;
        m.fighter_mut(Side::Two).set_health(3);

        let mut frame = InputFrame::new();
        frame.press(keys::F);
        let events = m.advance(&frame);
        assert_eq!(m.phase(), MatchPhase::Over);
        assert_eq!(m.outcome(), Some(Outcome::Winner(Side::One)));
        assert!(events
            .iter()
            .any(|e| matches!(e, MatchEvent::RoundOver { round: 1, .. })));

        let tick = m.tick();
        clock.advance(16);
        assert!(m.advance(&idle()).is_empty());
        assert_eq!(m.tick(), tick);
    }

    #[test]
    fn reset_is_refused_mid_round() {
        let (mut m, _) = versus(MatchConfig::default());
        assert!(matches!(m.reset(), Err(MatchError::RoundInProgress(1))));
        assert!(m.set_mode(MatchMode::VersusAi(Difficulty::Easy)).is_err());
    }

    #[test]
    fn reset_restores_fighters_and_clock() {
        let (mut m, clock) = versus(MatchConfig {
            round_time_secs: 0.05,
            ..Default::default()
        });
        m.fighter_mut(Side::One).set_health(10);
        m.fighter_mut(Side::One).set_special_energy(50);
        m.fighter_mut(Side::Two).x = 900.0;
        run_until_over(&mut m, &clock, 20);

        m.reset().unwrap();
        assert_eq!(m.phase(), MatchPhase::Active);
        assert_eq!(m.round(), 2);
        assert_eq!(m.outcome(), None);
        assert_eq!(m.fighter(Side::One).health(), 100);
        assert_eq!(m.fighter(Side::One).special_energy(), 0);
        assert_eq!(m.fighter(Side::Two).x, PLAYER_TWO_START_X);
        assert_eq!(m.remaining_time_secs(), 0.05);
    }

    #[test]
    fn series_is_decided_by_majority_then_restarts() {
        let (mut m, clock) = versus(MatchConfig {
            round_time_secs: 0.05,
            ..Default::default()
        });

        for round in 1..=2 {
            assert_eq!(m.round(), round);
            m.fighter_mut(Side::Two).set_health(20);
            run_until_over(&mut m, &clock, 20);
            assert_eq!(m.outcome(), Some(Outcome::Winner(Side::One)));
            if round == 1 {
                assert_eq!(m.series_winner(), None);
                m.reset().unwrap();
            }
        }
        assert_eq!(m.series_winner(), Some(Side::One));

        m.reset().unwrap();
        assert_eq!(m.round(), 1);
        assert_eq!(m.round_wins(), [0, 0]);
    }

    #[test]
    fn ai_mode_drives_fighter_two() {
        let clock = ManualClock::new(0);
        let config = MatchConfig {
            ai_seed: 99,
            ..Default::default()
        };
        let mut m = GameMatch::new(
            config,
            MatchMode::VersusAi(Difficulty::Expert),
            Arc::new(clock.clone()),
        );
        assert!(m.fighter(Side::Two).name.contains("expert"));

        let start = m.fighter(Side::Two).x;
        for _ in 0..120 {
            clock.advance(16);
            m.advance(&idle());
        }
        // far apart at the start, so the opponent closes in
        assert!(m.fighter(Side::Two).x < start);
        assert!(m.opponent().is_some());
    }

    #[test]
    fn host_strike_keys_do_not_fire_for_ai_fighter() {
        let clock = ManualClock::new(0);
        let mut m = GameMatch::new(
            MatchConfig {
                ai_seed: 3,
                ..Default::default()
            },
            MatchMode::VersusAi(Difficulty::Easy),
            Arc::new(clock.clone()),
        );

        // let the opening decision play out while staying inside the 1 s decision interval
        for _ in 0..100 {
            clock.advance(5);
            m.advance(&idle());
        }
        assert_eq!(m.opponent().and_then(|ai| ai.current_action()), None);

        let two = m.fighter_mut(Side::Two);
        two.x = PLAYER_ONE_START_X + 50.0;
        two.set_special_energy(100);

        for key in [keys::PERIOD, keys::SLASH, keys::RIGHT_SHIFT] {
            clock.advance(5);
            let mut frame = InputFrame::new();
            frame.press(key);
            let events = m.advance(&frame);
            assert!(events.is_empty(), "{key:?} fired for the opponent: {events:?}");
        }
        assert_eq!(m.fighter(Side::One).health(), 100);
        assert_eq!(m.fighter(Side::Two).special_energy(), 100);
    }

    #[test]
    fn set_mode_swaps_controller_and_restarts_series() {
        let (mut m, clock) = versus(MatchConfig {
            round_time_secs: 0.05,
            ..Default::default()
        });
        m.fighter_mut(Side::Two).set_health(1);
        run_until_over(&mut m, &clock, 20);
        assert_eq!(m.round_wins(), [1, 0]);

        m.set_mode(MatchMode::VersusAi(Difficulty::Hard)).unwrap();
        assert_eq!(m.mode(), MatchMode::VersusAi(Difficulty::Hard));
        assert_eq!(m.round(), 1);
        assert_eq!(m.round_wins(), [0, 0]);
        assert_eq!(m.phase(), MatchPhase::Active);
        assert_eq!(
            m.opponent().map(|ai| ai.difficulty()),
            Some(Difficulty::Hard)
        );
    }

    #[test]
    fn health_and_energy_stay_in_bounds_under_ai_pressure() {
        let clock = ManualClock::new(0);
        let mut m = GameMatch::new(
            MatchConfig {
                ai_seed: 5,
                round_time_secs: 30.0,
                ..Default::default()
            },
            MatchMode::VersusAi(Difficulty::Expert),
            Arc::new(clock.clone()),
        );

        for tick in 0..1_800u64 {
            clock.advance(16);
            let mut frame = InputFrame::new();
            frame.hold(keys::D);
            if tick % 20 == 0 {
                frame.press(keys::F);
            }
            if tick % 90 == 0 {
                frame.press(keys::G);
            }
            m.advance(&frame);

            for side in [Side::One, Side::Two] {
                let f = m.fighter(side);
                assert!((0..=f.max_health()).contains(&f.health()));
                assert!((0..=f.stats.max_special_energy).contains(&f.special_energy()));
            }
            if m.phase() == MatchPhase::Over {
                break;
            }
        }
    }
}
