//! Stage operations facade.
//!
//! Each public operation loads one stage, applies every effect to the
//! in-memory [`StageGraph`], and commits a single batch. On error nothing is
//! written, so a match is never stored as decided without its advancement.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::advancement;
use crate::bracket::{self, is_reset_final};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EntityKind, Result, Violation};
use crate::evaluator::{self, forfeit_score, MatchDecision};
use crate::graph::StageGraph;
use crate::integrity::{self, DuplicateRoundGroup, RepairReport};
use crate::model::{Entrant, RoundKey, Stage};
use crate::pairing;
use crate::standings::{self, StandingRow};
use crate::store::Store;
use crate::types::{BracketSide, CompetitionMode, EntrantId, GameSlot, MatchId, Side, StageId};

pub struct BracketEngine<S: Store, C: Clock = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
}

impl<S: Store> BracketEngine<S, SystemClock> {
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: Store, C: Clock> BracketEngine<S, C> {
    pub fn with_clock(store: S, clock: C, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read-only snapshot of a stage
    pub fn stage_graph(&self, stage_id: &StageId) -> Result<StageGraph> {
        StageGraph::load(&self.store, stage_id)
    }

    fn graph_for_match(&self, match_id: &MatchId) -> Result<StageGraph> {
        let stage_id = self
            .store
            .match_stage(match_id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Match, match_id))?;
        StageGraph::load(&self.store, &stage_id)
    }

    fn commit(&mut self, graph: &mut StageGraph) -> Result<()> {
        if graph.has_changes() {
            let batch = graph.take_batch();
            debug!(rows = batch.len(), "committing stage batch");
            self.store.commit(batch)?;
        }
        Ok(())
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a round-robin stage. Bye pairings are decided immediately.
    pub fn generate_round_robin(&mut self, name: &str, entrants: Vec<Entrant>) -> Result<Stage> {
        self.create_stage(name, entrants, CompetitionMode::RoundRobin)
    }

    /// Create an elimination stage with entrants in seeding order.
    pub fn build_bracket(
        &mut self,
        name: &str,
        entrants: Vec<Entrant>,
        mode: CompetitionMode,
    ) -> Result<Stage> {
        if !mode.is_elimination() {
            return Err(EngineError::Input(format!(
                "{} is not an elimination format",
                mode
            )));
        }
        self.create_stage(name, entrants, mode)
    }

    fn create_stage(&mut self, name: &str, entrants: Vec<Entrant>, mode: CompetitionMode) -> Result<Stage> {
        check_entrants(&entrants)?;
        let mut graph = StageGraph::new(Stage {
            id: StageId::new(),
            name: name.to_string(),
            mode,
            entrants,
            rounds: Vec::new(),
        });

        match mode {
            CompetitionMode::RoundRobin => pairing::build_round_robin(&mut graph, &self.config),
            _ => {
                bracket::build_elimination(&mut graph, &self.config)?;
            }
        }
        integrity::ensure_unique_rounds(&graph)?;
        let byes = advancement::resolve_byes(&mut graph, &self.clock)?;

        let stage = graph.stage().clone();
        self.commit(&mut graph)?;
        info!(
            stage = %stage.name,
            id = %stage.id,
            %mode,
            rounds = stage.rounds.len(),
            byes,
            "stage created"
        );
        Ok(stage)
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Evaluate a match from its stored games and apply the outcome.
    ///
    /// A newly decided match is stamped and advanced in the same batch; an
    /// even split activates the decider game.
    pub fn evaluate_match(&mut self, match_id: &MatchId) -> Result<MatchDecision> {
        let mut graph = self.graph_for_match(match_id)?;
        let decision = self.apply_decision(&mut graph, match_id)?;
        self.commit(&mut graph)?;
        Ok(decision)
    }

    /// Advance a decided match. Safe to repeat.
    pub fn propagate(&mut self, match_id: &MatchId) -> Result<Vec<MatchId>> {
        let mut graph = self.graph_for_match(match_id)?;
        let targeted = advancement::propagate(&mut graph, match_id, &self.clock)?;
        self.commit(&mut graph)?;
        Ok(targeted)
    }

    /// Record a completed game score, then evaluate the match.
    pub fn record_game(
        &mut self,
        match_id: &MatchId,
        slot: GameSlot,
        score_a: u32,
        score_b: u32,
    ) -> Result<MatchDecision> {
        if score_a == score_b {
            return Err(EngineError::Input(format!(
                "game {} cannot end tied at {}-{}",
                slot, score_a, score_b
            )));
        }
        let mut graph = self.graph_for_match(match_id)?;
        let m = graph.get_match(match_id)?;
        if m.is_bye {
            return Err(EngineError::Input(format!("match {} is a bye", match_id)));
        }
        if m.slot_a.is_none() || m.slot_b.is_none() {
            return Err(EngineError::Input(format!(
                "match {} is still waiting for entrants",
                match_id
            )));
        }
        if m.is_decided() {
            return Err(EngineError::Input(format!(
                "match {} is already decided; reopen it first",
                match_id
            )));
        }
        if slot.is_decider() && !m.decider_active {
            return Err(EngineError::Input(format!(
                "decider of match {} is not active",
                match_id
            )));
        }
        if !self.config.game_slots().contains(&slot) {
            return Err(EngineError::Input(format!("{} is not a configured discipline", slot)));
        }

        let game = graph.game_mut(match_id, slot)?;
        game.score_a = Some(score_a);
        game.score_b = Some(score_b);
        game.complete = true;
        debug!(%match_id, %slot, score_a, score_b, "game recorded");

        let decision = self.apply_decision(&mut graph, match_id)?;
        self.commit(&mut graph)?;
        Ok(decision)
    }

    /// Concede a match for one side, fill its unplayed disciplines and advance.
    pub fn record_forfeit(&mut self, match_id: &MatchId, forfeiting: Side) -> Result<MatchDecision> {
        let mut graph = self.graph_for_match(match_id)?;
        let m = graph.get_match(match_id)?;
        if m.is_bye {
            return Err(EngineError::Input(format!("match {} is a bye", match_id)));
        }
        if m.slot_a.is_none() || m.slot_b.is_none() {
            return Err(EngineError::Input(format!(
                "match {} is still waiting for entrants",
                match_id
            )));
        }
        if m.is_decided() {
            return Err(EngineError::Input(format!(
                "match {} is already decided; reopen it first",
                match_id
            )));
        }

        graph.match_mut(match_id)?.forfeit = Some(forfeiting);
        let (score_a, score_b) = forfeit_score(forfeiting.other());
        for &slot in &self.config.disciplines {
            let game = graph.game_mut(match_id, slot)?;
            if !game.complete {
                game.score_a = Some(score_a);
                game.score_b = Some(score_b);
                game.complete = true;
                game.filler = true;
            }
        }
        info!(%match_id, side = %forfeiting, "forfeit recorded");

        let decision = self.apply_decision(&mut graph, match_id)?;
        self.commit(&mut graph)?;
        Ok(decision)
    }

    /// Clear a decision and withdraw everything it advanced.
    pub fn reopen_match(&mut self, match_id: &MatchId) -> Result<Vec<MatchId>> {
        let mut graph = self.graph_for_match(match_id)?;
        let touched = advancement::reopen(&mut graph, match_id)?;
        self.commit(&mut graph)?;
        info!(%match_id, touched = touched.len(), "match reopened");
        Ok(touched)
    }

    fn apply_decision(&self, graph: &mut StageGraph, match_id: &MatchId) -> Result<MatchDecision> {
        let m = graph.get_match(match_id)?;
        let decision = evaluator::evaluate(m, &graph.games_of(match_id), &self.config)?;

        let decided_entrant = decision.winner_side.and_then(|side| m.slot(side).cloned());
        match (&m.winner, &decided_entrant) {
            (Some(stored), Some(now)) if stored == now => return Ok(decision),
            (Some(stored), _) => {
                return Err(EngineError::Input(format!(
                    "match {} is stored as won by {} but its games say otherwise; reopen it first",
                    match_id, stored
                )));
            }
            (None, _) => {}
        }

        let now = self.clock.now();
        let m = graph.match_mut(match_id)?;
        match decided_entrant {
            Some(winner) if decision.decided => {
                info!(%match_id, %winner, method = ?decision.method, "match decided");
                m.winner = Some(winner);
                m.decided_by = decision.method;
                m.decided_at = Some(now);
                m.decider_active = false;
                advancement::propagate(graph, match_id, &self.clock)?;
            }
            _ => {
                if decision.needs_decider && !m.decider_active {
                    info!(%match_id, "disciplines split evenly, decider activated");
                }
                m.decider_active = decision.needs_decider;
            }
        }
        Ok(decision)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn compute_standings(&self, stage_id: &StageId) -> Result<Vec<StandingRow>> {
        let graph = self.stage_graph(stage_id)?;
        Ok(standings::compute_standings(&graph, &self.config))
    }

    /// Winner of the stage's deciding match, if it has been played
    pub fn champion(&self, stage_id: &StageId) -> Result<Option<EntrantId>> {
        let graph = self.stage_graph(stage_id)?;
        if !graph.stage().mode.is_elimination() {
            return Ok(None);
        }

        let grand_final = graph.match_at(RoundKey::Bracket(BracketSide::Finals, 0), 0);
        let first_final = graph.match_at(RoundKey::Bracket(BracketSide::Finals, 1), 0);
        let winner_final = graph.match_at(RoundKey::Bracket(BracketSide::Winner, 0), 0);

        let deciding = match (first_final, grand_final) {
            // Reset format: the first final settles it unless the reset is filled
            (Some(first), Some(reset)) if is_reset_final(reset) => {
                if reset.filled_slots() == 0 && first.winner_side() == Some(Side::A) {
                    Some(first)
                } else {
                    Some(reset)
                }
            }
            (_, Some(grand_final)) => Some(grand_final),
            _ => winner_final,
        };
        Ok(deciding.and_then(|m| m.winner.clone()))
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    pub fn detect_duplicate_rounds(&self, stage_id: &StageId) -> Result<Vec<DuplicateRoundGroup>> {
        let graph = self.stage_graph(stage_id)?;
        let groups = integrity::detect_duplicate_rounds(&graph);
        for group in &groups {
            warn!(stage = %graph.stage().name, key = %group.key, count = group.rounds.len(), "duplicate rounds");
        }
        Ok(groups)
    }

    pub fn check_integrity(&self, stage_id: &StageId) -> Result<Vec<Violation>> {
        let graph = self.stage_graph(stage_id)?;
        Ok(integrity::check_integrity(&graph, &self.config))
    }

    /// Explicit corrective pass over one stage.
    pub fn repair_stage(&mut self, stage_id: &StageId) -> Result<RepairReport> {
        let mut graph = self.stage_graph(stage_id)?;
        let report = integrity::repair(&mut graph, &self.config)?;
        self.commit(&mut graph)?;
        if !report.is_empty() {
            info!(
                stage = %graph.stage().name,
                rounds_removed = report.rounds_removed.len(),
                matches_removed = report.matches_removed.len(),
                links_repaired = report.links_repaired.len(),
                games_created = report.games_created.len(),
                "stage repaired"
            );
        }
        Ok(report)
    }
}

/// Reject entrant sets that cannot be scheduled
fn check_entrants(entrants: &[Entrant]) -> Result<()> {
    let mut seen = HashSet::new();
    for e in entrants {
        if e.id.as_str().trim().is_empty() {
            return Err(EngineError::Input("entrant id cannot be empty".into()));
        }
        if !seen.insert(&e.id) {
            return Err(EngineError::Input(format!("entrant {} listed twice", e.id)));
        }
    }
    Ok(())
}
