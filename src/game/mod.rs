//! Game simulation modules

pub mod ai;
pub mod combat;
pub mod fighter;
pub mod input;
pub mod r#match;
pub mod physics;
pub mod snapshot;

pub use r#match::GameMatch;
pub use snapshot::{JsonLinesSink, RenderSink, TracingSink};
