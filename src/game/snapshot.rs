//! Snapshot building and delivery to the render sink

use std::io::Write;

use serde::Serialize;
use tracing::debug;

use super::fighter::{ColorState, Fighter};
use super::r#match::{GameMatch, MatchEvent, MatchPhase, Outcome, Side};

/// Read-only view of one fighter for drawing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FighterView {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub facing_right: bool,
    pub color_state: ColorState,
    pub anim_frame: u8,
    pub health: i32,
    pub health_ratio: f32,
    pub energy_ratio: f32,
    /// 1.0 when the dash is ready, rising from 0.0 while it cools down
    pub dash_ready_ratio: f32,
    pub dash_cooldown_secs: f32,
    pub combo_count: u32,
}

impl FighterView {
    pub fn capture(fighter: &Fighter, now_ms: u64) -> Self {
        let cooldown_secs = fighter.dash_cooldown_remaining(now_ms);
        let full_cooldown_secs = fighter.stats.dash_cooldown_ms as f32 / 1000.0;
        let dash_ready_ratio = if full_cooldown_secs > 0.0 {
            1.0 - cooldown_secs / full_cooldown_secs
        } else {
            1.0
        };

        Self {
            name: fighter.name.clone(),
            x: fighter.x,
            y: fighter.y,
            width: fighter.stats.width,
            height: fighter.stats.height,
            facing_right: fighter.facing_right,
            color_state: fighter.color_state(),
            anim_frame: fighter.anim_frame,
            health: fighter.health(),
            health_ratio: ratio(fighter.health(), fighter.max_health()),
            energy_ratio: ratio(fighter.special_energy(), fighter.stats.max_special_energy),
            dash_ready_ratio,
            dash_cooldown_secs: cooldown_secs,
            combo_count: fighter.combo_count,
        }
    }
}

fn ratio(value: i32, max: i32) -> f32 {
    if max <= 0 {
        return 0.0;
    }
    value as f32 / max as f32
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub remaining_time_secs: f32,
    pub phase: MatchPhase,
    pub outcome: Option<Outcome>,
    pub round: u32,
    pub round_wins: [u32; 2],
    pub fighters: [FighterView; 2],
    /// Events since the previous delivered snapshot
    pub events: Vec<MatchEvent>,
}

/// Consumer of per-frame snapshots
pub trait RenderSink {
    fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes one JSON document per frame
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs a one-line summary per frame
#[derive(Debug, Default)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn present(&mut self, frame: &FrameSnapshot) -> Result<(), SinkError> {
        let [one, two] = &frame.fighters;
        debug!(
            tick = frame.tick,
            time = frame.remaining_time_secs,
            p1_health = one.health,
            p1_x = one.x,
            p2_health = two.health,
            p2_x = two.x,
            events = frame.events.len(),
            "Frame"
        );
        Ok(())
    }
}

/// Decides when a snapshot goes out and collects events in between
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    pending_events: Vec<MatchEvent>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            pending_events: Vec::new(),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for round endings)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    pub fn record(&mut self, events: Vec<MatchEvent>) {
        if events
            .iter()
            .any(|e| matches!(e, MatchEvent::RoundOver { .. }))
        {
            self.force_next();
        }
        self.pending_events.extend(events);
    }

    /// Build a snapshot, handing over the events recorded since the last one
    pub fn build(&mut self, game_match: &GameMatch) -> FrameSnapshot {
        let now = game_match.now_ms();
        FrameSnapshot {
            tick: game_match.tick(),
            remaining_time_secs: game_match.remaining_time_secs(),
            phase: game_match.phase(),
            outcome: game_match.outcome(),
            round: game_match.round(),
            round_wins: game_match.round_wins(),
            fighters: [
                FighterView::capture(game_match.fighter(Side::One), now),
                FighterView::capture(game_match.fighter(Side::Two), now),
            ],
            events: std::mem::take(&mut self.pending_events),
        }
    }
}
