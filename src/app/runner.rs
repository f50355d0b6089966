//! Fixed-timestep host loop driving a match and feeding the render sink

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::Config;
use crate::game::ai::{DecisionMaker, Difficulty};
use crate::game::input::InputFrame;
use crate::game::r#match::{GameMatch, MatchError, MatchPhase, Side};
use crate::game::snapshot::{RenderSink, SinkError, SnapshotBuilder};
use crate::util::time::{ticks_to_ms, Clock, ManualClock, SystemClock, TICK_DURATION_MICROS};

/// How ticks are spaced in time
#[derive(Debug, Clone)]
pub enum Pacing {
    /// One tick per 1/60 s of wall time
    Realtime,
    /// Back-to-back ticks; the match clock is derived from the tick count
    FlatOut(ManualClock),
}

impl Pacing {
    /// Pacing together with the clock the match must observe
    pub fn from_config(config: &Config) -> (Self, Arc<dyn Clock>) {
        if config.realtime {
            (Pacing::Realtime, Arc::new(SystemClock::new()))
        } else {
            let clock = ManualClock::new(0);
            (Pacing::FlatOut(clock.clone()), Arc::new(clock))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Match(#[from] MatchError),
}

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub rounds_played: u32,
    pub round_wins: [u32; 2],
    pub series_winner: Option<Side>,
}

/// Drives one match until its series is decided
pub struct MatchRunner<S: RenderSink> {
    game_match: GameMatch,
    sink: S,
    snapshot_builder: SnapshotBuilder,
    /// Synthesizes fighter one's keys when nobody is at the keyboard
    autopilot: Option<DecisionMaker>,
    pacing: Pacing,
    max_ticks: Option<u64>,
    ticks_run: u64,
    rounds_played: u32,
}

impl<S: RenderSink> MatchRunner<S> {
    pub fn new(game_match: GameMatch, sink: S, pacing: Pacing, snapshot_every: u32) -> Self {
        Self {
            game_match,
            sink,
            snapshot_builder: SnapshotBuilder::new(snapshot_every),
            autopilot: None,
            pacing,
            max_ticks: None,
            ticks_run: 0,
            rounds_played: 0,
        }
    }

    pub fn with_autopilot(mut self, difficulty: Difficulty, seed: u64) -> Self {
        self.autopilot = Some(DecisionMaker::new(difficulty, seed));
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Run the fixed-timestep loop
    pub async fn run(mut self) -> Result<RunSummary, RunnerError> {
        info!(match_id = %self.game_match.id(), mode = ?self.game_match.mode(), "Match started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            match &self.pacing {
                Pacing::Realtime => {
                    tick_interval.tick().await;
                }
                Pacing::FlatOut(_) => tokio::task::yield_now().await,
            }

            if self.step()? {
                break;
            }
        }

        let summary = RunSummary {
            ticks: self.ticks_run,
            rounds_played: self.rounds_played,
            round_wins: self.game_match.round_wins(),
            series_winner: self.game_match.series_winner(),
        };
        info!(
            match_id = %self.game_match.id(),
            ticks = summary.ticks,
            rounds = summary.rounds_played,
            winner = ?summary.series_winner,
            "Match finished"
        );
        Ok(summary)
    }

    /// Run one tick. Returns true once the run should stop.
    fn step(&mut self) -> Result<bool, RunnerError> {
        if let Pacing::FlatOut(clock) = &self.pacing {
            clock.set(ticks_to_ms(self.ticks_run));
        }
        self.ticks_run += 1;

        let host = self.host_input();
        let events = self.game_match.advance(&host);
        self.snapshot_builder.record(events);

        if self.snapshot_builder.should_send() {
            let frame = self.snapshot_builder.build(&self.game_match);
            self.sink.present(&frame)?;
        }

        if self.game_match.phase() == MatchPhase::Over {
            self.rounds_played += 1;

            let series_done = self.game_match.series_winner().is_some()
                || self.game_match.round() >= self.game_match.max_rounds();
            if series_done {
                return Ok(true);
            }

            self.game_match.reset()?;
            if let Some(pilot) = self.autopilot.as_mut() {
                pilot.reset();
            }
        }

        if self.max_ticks.is_some_and(|max| self.ticks_run >= max) {
            warn!(match_id = %self.game_match.id(), ticks = self.ticks_run, "Tick limit reached before the series was decided");
            return Ok(true);
        }

        Ok(false)
    }

    /// Keys the host reports this tick
    fn host_input(&mut self) -> InputFrame {
        let now = self.game_match.now_ms();
        let me = self.game_match.fighter(Side::One);
        let target = self.game_match.fighter(Side::Two);

        self.autopilot
            .as_mut()
            .and_then(|pilot| pilot.update(me, target, now))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::r#match::{MatchConfig, MatchEvent, MatchMode};
    use crate::game::snapshot::FrameSnapshot;

    #[derive(Default)]
    struct CollectingSink {
        frames: Vec<FrameSnapshot>,
    }

    impl RenderSink for &mut CollectingSink {
        fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SinkError> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    fn flat_out_match(config: MatchConfig, mode: MatchMode) -> (GameMatch, Pacing) {
        let clock = ManualClock::new(0);
        let game_match = GameMatch::new(config, mode, Arc::new(clock.clone()));
        (game_match, Pacing::FlatOut(clock))
    }

    #[test]
    fn idle_series_ends_in_draws() {
        let (game_match, pacing) = flat_out_match(
            MatchConfig {
                round_time_secs: 1.0,
                max_rounds: 3,
                ..Default::default()
            },
            MatchMode::Versus,
        );
        let mut sink = CollectingSink::default();
        let runner = MatchRunner::new(game_match, &mut sink, pacing, 30);

        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.rounds_played, 3);
        assert_eq!(summary.round_wins, [0, 0]);
        assert_eq!(summary.series_winner, None);
        // three one-second rounds at 60 Hz
        assert!((178..=184).contains(&summary.ticks), "ticks = {}", summary.ticks);

        let round_overs = sink
            .frames
            .iter()
            .filter(|f| f.phase == MatchPhase::Over)
            .count();
        assert_eq!(round_overs, 3);
    }

    #[test]
    fn autopilot_against_ai_plays_a_full_series() {
        let (game_match, pacing) = flat_out_match(
            MatchConfig {
                round_time_secs: 20.0,
                max_rounds: 3,
                ai_seed: 17,
                ..Default::default()
            },
            MatchMode::VersusAi(Difficulty::Expert),
        );
        let mut sink = CollectingSink::default();
        let runner = MatchRunner::new(game_match, &mut sink, pacing, 60)
            .with_autopilot(Difficulty::Expert, 23)
            .with_max_ticks(Some(10_000));

        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert!(summary.rounds_played >= 2);
        assert!(summary.ticks <= 10_000);

        let hits = sink
            .frames
            .iter()
            .flat_map(|f| &f.events)
            .filter(|e| matches!(e, MatchEvent::Hit { .. }))
            .count();
        assert!(hits > 0, "two expert opponents never traded a blow");
    }

    #[test]
    fn tick_limit_stops_the_run() {
        let (game_match, pacing) = flat_out_match(MatchConfig::default(), MatchMode::Versus);
        let mut sink = CollectingSink::default();
        let runner = MatchRunner::new(game_match, &mut sink, pacing, 10).with_max_ticks(Some(50));

        let summary = tokio_test::block_on(runner.run()).unwrap();
        assert_eq!(summary.ticks, 50);
        assert_eq!(summary.rounds_played, 0);
        assert_eq!(sink.frames.len(), 5);
    }
}
