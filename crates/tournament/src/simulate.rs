//! Seeded match simulation
//!
//! Plays every ready match of a stage through the engine, one game at a time,
//! so decisions, decider activation and advancement all happen exactly as
//! they would with real scores. The same seed always produces the same stage.

use bracket_core::{
    BracketEngine, Clock, GameSlot, MatchDecision, MatchId, Side, StageId, Store,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    /// Chance that a match is conceded instead of played
    pub forfeit_rate: f64,
    /// Score the winner of a game reaches
    pub winning_score: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            forfeit_rate: 0.0,
            winning_score: 11,
        }
    }
}

/// What a simulation run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub matches_played: u32,
    pub games_recorded: u32,
    pub forfeits: u32,
    pub deciders: u32,
}

pub struct Simulator {
    rng: StdRng,
    config: SimConfig,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Random game score with a strict winner
    fn game_score(&mut self) -> (u32, u32) {
        let winning = self.config.winning_score.max(2);
        let losing = self.rng.gen_range(0..winning - 1);
        if self.rng.gen_bool(0.5) {
            (winning, losing)
        } else {
            (losing, winning)
        }
    }

    /// Play one ready match to a decision
    pub fn play_match<S: Store, C: Clock>(
        &mut self,
        engine: &mut BracketEngine<S, C>,
        match_id: &MatchId,
        summary: &mut SimulationSummary,
    ) -> bracket_core::Result<MatchDecision> {
        summary.matches_played += 1;

        if self.config.forfeit_rate > 0.0 && self.rng.gen_bool(self.config.forfeit_rate.min(1.0)) {
            let side = if self.rng.gen_bool(0.5) { Side::A } else { Side::B };
            summary.forfeits += 1;
            debug!(%match_id, %side, "simulated forfeit");
            return engine.record_forfeit(match_id, side);
        }

        let mut decision = MatchDecision::default();
        for slot in engine.config().disciplines.clone() {
            let (a, b) = self.game_score();
            decision = engine.record_game(match_id, slot, a, b)?;
            summary.games_recorded += 1;
            if decision.decided {
                return Ok(decision);
            }
        }

        if decision.needs_decider {
            let (a, b) = self.game_score();
            decision = engine.record_game(match_id, GameSlot::Tiebreaker, a, b)?;
            summary.games_recorded += 1;
            summary.deciders += 1;
        }
        Ok(decision)
    }

    /// Play a stage until no match is ready, in schedule order
    pub fn run_stage<S: Store, C: Clock>(
        &mut self,
        engine: &mut BracketEngine<S, C>,
        stage_id: &StageId,
    ) -> bracket_core::Result<SimulationSummary> {
        let mut summary = SimulationSummary::default();
        loop {
            let graph = engine.stage_graph(stage_id)?;
            let next = graph
                .rounds()
                .iter()
                .flat_map(|round| graph.round_matches(&round.id))
                .find(|m| m.is_ready())
                .map(|m| m.id);

            match next {
                Some(id) => {
                    self.play_match(engine, &id, &mut summary)?;
                }
                None => break,
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "simulate_tests.rs"]
mod simulate_tests;
