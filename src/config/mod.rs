//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::game::ai::Difficulty;
use crate::game::r#match::{MatchConfig, MatchMode};

/// Render sink selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSinkKind {
    /// Summary line per frame through tracing
    Log,
    /// One JSON document per frame on stdout
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Versus a second host player, or versus the decision-maker
    pub mode: MatchMode,
    /// Optional decision-maker steering fighter one in the headless runner
    pub autopilot: Option<Difficulty>,

    /// Round length in seconds
    pub round_time_secs: f32,
    /// Rounds per series
    pub max_rounds: u32,
    /// Seed for opponent randomness, random per process when unset
    pub ai_seed: u64,

    /// Where snapshots go
    pub frame_sink: FrameSinkKind,
    /// Ticks between snapshots delivered to the render sink
    pub snapshot_every: u32,
    /// Pace ticks against the wall clock (false runs flat out)
    pub realtime: bool,
    /// Stop after this many ticks even if the series is undecided
    pub max_ticks: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let difficulty = match env::var("AI_DIFFICULTY") {
            Ok(raw) => parse_difficulty("AI_DIFFICULTY", &raw)?,
            Err(_) => Difficulty::default(),
        };

        let mode = match env::var("MATCH_MODE")
            .unwrap_or_else(|_| "ai".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "ai" | "pve" => MatchMode::VersusAi(difficulty),
            "versus" | "pvp" => MatchMode::Versus,
            _ => return Err(ConfigError::Invalid("MATCH_MODE")),
        };

        let autopilot = match env::var("AUTOPILOT") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_difficulty("AUTOPILOT", &raw)?),
            _ => None,
        };

        let round_time_secs: f32 = parse_or("ROUND_TIME_SECS", 180.0)?;
        if round_time_secs.is_nan() || round_time_secs <= 0.0 {
            return Err(ConfigError::Invalid("ROUND_TIME_SECS"));
        }

        let max_rounds: u32 = parse_or("MAX_ROUNDS", 3)?;
        if max_rounds == 0 {
            return Err(ConfigError::Invalid("MAX_ROUNDS"));
        }

        let frame_sink = match env::var("FRAME_SINK")
            .unwrap_or_else(|_| "log".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "log" => FrameSinkKind::Log,
            "json" => FrameSinkKind::Json,
            _ => return Err(ConfigError::Invalid("FRAME_SINK")),
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            mode,
            autopilot,
            round_time_secs,
            max_rounds,
            ai_seed: parse_or("AI_SEED", rand::random::<u64>())?,
            frame_sink,
            snapshot_every: parse_or("SNAPSHOT_EVERY", 30)?,
            realtime: parse_or("REALTIME", true)?,
            max_ticks: match env::var("MAX_TICKS") {
                Ok(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::Invalid("MAX_TICKS"))?),
                Err(_) => None,
            },
        })
    }

    /// Match settings derived from this configuration
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            round_time_secs: self.round_time_secs,
            max_rounds: self.max_rounds,
            ai_seed: self.ai_seed,
            ..Default::default()
        }
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn parse_difficulty(key: &'static str, raw: &str) -> Result<Difficulty, ConfigError> {
    raw.parse()
        .map_err(|source| ConfigError::Difficulty { key, source })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid difficulty in {key}: {source}")]
    Difficulty {
        key: &'static str,
        source: crate::game::ai::ParseDifficultyError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u32 = parse_or("ARENA_TEST_SURELY_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn difficulty_errors_name_the_key() {
        let err = parse_difficulty("AUTOPILOT", "impossible").unwrap_err();
        assert!(err.to_string().contains("AUTOPILOT"));
        assert_eq!(parse_difficulty("AUTOPILOT", "HARD").unwrap(), Difficulty::Hard);
    }

    #[test]
    fn match_config_carries_round_settings() {
        let config = Config {
            log_level: "info".into(),
            mode: MatchMode::Versus,
            autopilot: None,
            round_time_secs: 60.0,
            max_rounds: 5,
            ai_seed: 9,
            frame_sink: FrameSinkKind::Log,
            snapshot_every: 30,
            realtime: false,
            max_ticks: None,
        };
        let match_config = config.match_config();
        assert_eq!(match_config.round_time_secs, 60.0);
        assert_eq!(match_config.max_rounds, 5);
        assert_eq!(match_config.ai_seed, 9);
    }
}
