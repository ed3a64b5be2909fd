//! Bracket engine for multi-stop team tournaments
//!
//! This crate provides:
//! - Round-robin pairing by the circle method
//! - Single and double elimination brackets with seeded byes
//! - Match evaluation from discipline games, with decider activation
//! - Advancement of winners and losers through bracket links
//! - Standings, integrity diagnostics and a corrective repair pass
//!
//! # Usage
//!
//! ```no_run
//! use bracket_core::{BracketEngine, CompetitionMode, EngineConfig, Entrant, MemoryStore};
//!
//! let mut engine = BracketEngine::new(MemoryStore::new(), EngineConfig::default())?;
//! let entrants = ["Aces", "Dinkers", "Lobsters", "Volleys"]
//!     .iter()
//!     .map(|name| Entrant::named(name))
//!     .collect();
//! let stage = engine.build_bracket("Stop 1", entrants, CompetitionMode::DoubleElimination)?;
//! let standings = engine.compute_standings(&stage.id)?;
//! # Ok::<(), bracket_core::EngineError>(())
//! ```

mod advancement;
mod bracket;
mod clock;
mod config;
mod engine;
mod error;
mod evaluator;
mod graph;
mod integrity;
mod model;
mod pairing;
mod seeding;
mod standings;
mod store;
mod types;

pub use bracket::{is_reset_final, minimum_entrants, BracketLayout};
pub use clock::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use evaluator::*;
pub use graph::*;
pub use integrity::{check_integrity, detect_duplicate_rounds, DuplicateRoundGroup, RepairReport};
pub use model::*;
pub use pairing::{generate_round_robin, Pairing};
pub use seeding::*;
pub use standings::*;
pub use store::*;
pub use types::*;
