//! Arena Brawl - authoritative simulation core for a two-fighter arena brawler

pub mod app;
pub mod config;
pub mod game;
pub mod util;
