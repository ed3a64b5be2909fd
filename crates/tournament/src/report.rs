//! Stage snapshots and text reports

use anyhow::{Context, Result};
use bracket_core::{
    BracketEngine, BracketSide, Clock, CompetitionMode, DecisionMethod, EntrantId, GameSlot,
    Round, RoundKey, Stage, StageId, StandingRow, Store,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::simulate::SimulationSummary;

/// Complete picture of one stage at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub name: String,
    pub mode: CompetitionMode,
    pub generated_at: DateTime<Utc>,
    /// Rounds in schedule order
    pub rounds: Vec<RoundEntry>,
    pub standings: Vec<StandingRow>,
    pub champion: Option<String>,
    /// Present when the stage was played by the simulator
    #[serde(default)]
    pub simulation: Option<SimulationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEntry {
    pub label: String,
    pub matches: Vec<MatchEntry>,
}

/// A single match line in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    pub position: u32,
    pub entrant_a: Option<String>,
    pub entrant_b: Option<String>,
    pub is_bye: bool,
    pub winner: Option<String>,
    pub method: Option<DecisionMethod>,
    /// Discipline games won by each side
    pub games: (u32, u32),
    pub decider_played: bool,
}

fn display_name(stage: &Stage, id: Option<&EntrantId>) -> Option<String> {
    id.map(|id| {
        stage
            .entrant(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    })
}

/// Human label for a round
pub fn round_label(round: &Round) -> String {
    match round.key() {
        RoundKey::Schedule(idx) => format!("Round {}", idx + 1),
        RoundKey::Bracket(BracketSide::Winner, 0) => "Winner final".to_string(),
        RoundKey::Bracket(BracketSide::Loser, 0) => "Loser final".to_string(),
        RoundKey::Bracket(BracketSide::Finals, 0) => "Grand final".to_string(),
        RoundKey::Bracket(BracketSide::Finals, _) => "Grand final (first)".to_string(),
        RoundKey::Bracket(BracketSide::Winner, depth) => format!("Winner bracket, depth {}", depth),
        RoundKey::Bracket(BracketSide::Loser, depth) => format!("Loser bracket, depth {}", depth),
    }
}

impl StageReport {
    /// Build a report from the current stored state of a stage
    pub fn from_engine<S: Store, C: Clock>(
        engine: &BracketEngine<S, C>,
        stage_id: &StageId,
        generated_at: DateTime<Utc>,
    ) -> bracket_core::Result<Self> {
        let graph = engine.stage_graph(stage_id)?;
        let stage = graph.stage();

        let rounds = graph
            .rounds()
            .iter()
            .map(|round| RoundEntry {
                label: round_label(round),
                matches: graph
                    .round_matches(&round.id)
                    .into_iter()
                    .map(|m| {
                        let mut games = (0, 0);
                        let mut decider_played = false;
                        for game in graph.games_of(&m.id).into_iter().filter(|g| g.complete) {
                            if game.slot == GameSlot::Tiebreaker {
                                decider_played = true;
                                continue;
                            }
                            match (game.score_a, game.score_b) {
                                (Some(a), Some(b)) if a > b => games.0 += 1,
                                (Some(a), Some(b)) if b > a => games.1 += 1,
                                _ => {}
                            }
                        }
                        MatchEntry {
                            position: m.position,
                            entrant_a: display_name(stage, m.slot_a.as_ref()),
                            entrant_b: display_name(stage, m.slot_b.as_ref()),
                            is_bye: m.is_bye,
                            winner: display_name(stage, m.winner.as_ref()),
                            method: m.decided_by,
                            games,
                            decider_played,
                        }
                    })
                    .collect(),
            })
            .collect();

        let champion = engine.champion(stage_id)?;
        Ok(Self {
            name: stage.name.clone(),
            mode: stage.mode,
            generated_at,
            rounds,
            standings: engine.compute_standings(stage_id)?,
            champion: display_name(stage, champion.as_ref()),
            simulation: None,
        })
    }

    /// Save report to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Load report from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents).context("failed to parse report")
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== Stage: {} ({}) ===\n", self.name, self.mode));
        report.push_str(&format!(
            "Generated: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for round in &self.rounds {
            report.push_str(&format!("{}\n", round.label));
            for m in &round.matches {
                report.push_str(&format!("  {}\n", match_line(m)));
            }
            report.push('\n');
        }

        report.push_str("Standings:\n");
        report.push_str(&format!(
            "{:<4} {:<24} {:>3} {:>3} {:>3} {:>4} {:>7} {:>9}\n",
            "#", "Team", "P", "W", "L", "Pts", "Games", "Score"
        ));
        report.push_str(&"-".repeat(64));
        report.push('\n');
        for (i, row) in self.standings.iter().enumerate() {
            report.push_str(&format!(
                "{:<4} {:<24} {:>3} {:>3} {:>3} {:>4} {:>7} {:>9}\n",
                i + 1,
                row.name,
                row.matches_played,
                row.wins,
                row.losses,
                row.points,
                format!("{}-{}", row.games_won, row.games_lost),
                format!("{}-{}", row.score_for, row.score_against)
            ));
        }

        if let Some(champion) = &self.champion {
            report.push_str(&format!("\nChampion: {}\n", champion));
        }
        if let Some(sim) = &self.simulation {
            report.push_str(&format!(
                "\nSimulated {} matches ({} games, {} forfeits, {} deciders)\n",
                sim.matches_played, sim.games_recorded, sim.forfeits, sim.deciders
            ));
        }
        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}

fn match_line(m: &MatchEntry) -> String {
    let a = m.entrant_a.as_deref().unwrap_or("TBD");
    let b = m.entrant_b.as_deref().unwrap_or("TBD");
    if m.is_bye {
        return match (&m.entrant_a, &m.entrant_b) {
            (None, None) => "(empty bye)".to_string(),
            (Some(_), _) => format!("{} - bye", a),
            (None, Some(_)) => format!("{} - bye", b),
        };
    }

    let mut line = format!("{:<24} vs {:<24}", a, b);
    match (&m.winner, m.method) {
        (Some(winner), Some(DecisionMethod::Forfeit)) => {
            line.push_str(&format!(" -> {} (forfeit)", winner));
        }
        (Some(winner), _) => {
            line.push_str(&format!(" {}-{}", m.games.0, m.games.1));
            if m.decider_played {
                line.push_str(" +decider");
            }
            line.push_str(&format!(" -> {}", winner));
        }
        (None, _) => {}
    }
    line
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
