//! Host-side driving of a match

pub mod runner;

pub use runner::{MatchRunner, Pacing, RunSummary, RunnerError};
