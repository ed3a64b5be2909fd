//! Tournament runner for bracket_core
//!
//! This crate provides infrastructure for:
//! - Simulating a stage end to end with a seeded RNG
//! - Reporting schedules, brackets and standings
//! - Saving stage reports as JSON
//!
//! # Usage
//!
//! ```bash
//! # Round robin for five teams, simulated with seed 7
//! cargo run -p tournament -- round-robin Aces Dinkers Lobsters Volleys Smash --seed 7
//!
//! # Double elimination for twelve generated teams, snapshot saved for later checks
//! cargo run -p tournament -- bracket double --teams 12 --store stop1.json
//! ```

mod report;
mod simulate;

pub use report::*;
pub use simulate::*;
