use std::collections::HashSet;
use std::io;

use serde::Serialize;

use crate::agent::Agent;
use crate::constants::get_units_per_team;
use crate::protocol::{read_startup, read_turn, write_startup, write_turn};
use crate::rng::Rng;
use crate::types::Team;

mod maze;
mod referee;

pub use self::maze::generate_maze;
pub use self::referee::{check_commands, step_toward, Referee, SimUnit};

#[derive(Clone, Debug, Serialize)]
pub struct MatchOptions {
    pub seed: u32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "unitsPerTeam")]
    pub units_per_team: Option<usize>,
    #[serde(rename = "maxTurns")]
    pub max_turns: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnomalyRecord {
    pub turn: u64,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchReport {
    pub seed: u32,
    pub turns: u64,
    #[serde(rename = "myScore")]
    pub my_score: i32,
    #[serde(rename = "opponentScore")]
    pub opponent_score: i32,
    #[serde(rename = "pelletsLeft")]
    pub pellets_left: usize,
    pub holds: usize,
    /// Distinct anomaly messages, first occurrence order.
    pub anomalies: Vec<String>,
    #[serde(rename = "anomalyRecords")]
    pub anomaly_records: Vec<AnomalyRecord>,
}

pub fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    turn: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        turn,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

/// Plays one self-contained match: generated maze, random enemies, and the agent fed
/// through the same text protocol the real referee speaks.
pub fn run_match(options: &MatchOptions) -> io::Result<MatchReport> {
    let mut rng = Rng::new(options.seed);
    let rows = generate_maze(options.width, options.height, &mut rng);
    let units_per_team = options
        .units_per_team
        .unwrap_or_else(|| get_units_per_team(options.width));
    let mut referee = Referee::new(&rows, units_per_team, rng.fork())?;

    let startup = write_startup(referee.grid());
    let grid = read_startup(&mut startup.as_bytes())?;
    let mut agent = Agent::new(grid);

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut holds = 0;

    while referee.turn() < options.max_turns && !referee.is_finished() {
        let input = write_turn(&referee.observation());
        let Some(observation) = read_turn(&mut input.as_bytes())? else {
            break;
        };
        let plan = agent.play_turn(&observation)?;
        holds += plan.holds();
        let turn = referee.turn();
        for message in referee.apply(&plan.commands()) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                turn,
                message,
            );
        }
    }

    Ok(MatchReport {
        seed: options.seed,
        turns: referee.turn(),
        my_score: referee.score(Team::Mine),
        opponent_score: referee.score(Team::Enemy),
        pellets_left: referee.pellets_left(),
        holds,
        anomalies,
        anomaly_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seed: u32) -> MatchOptions {
        MatchOptions {
            seed,
            width: 21,
            height: 11,
            units_per_team: None,
            max_turns: 60,
        }
    }

    #[test]
    fn same_seed_produces_same_report() {
        let a = run_match(&options(424_242)).expect("match should run");
        let b = run_match(&options(424_242)).expect("match should run");
        assert_eq!(a.turns, b.turns);
        assert_eq!(a.my_score, b.my_score);
        assert_eq!(a.opponent_score, b.opponent_score);
        assert_eq!(a.pellets_left, b.pellets_left);
    }

    #[test]
    fn matches_run_without_rule_violations() {
        for seed in 0..20u32 {
            let report = run_match(&options(seed)).expect("match should run");
            assert!(
                report.anomalies.is_empty(),
                "seed={seed} anomalies={:?}",
                report.anomalies
            );
            assert!(report.turns > 0);
        }
    }

    #[test]
    fn agent_collects_pellets() {
        let report = run_match(&options(7)).expect("match should run");
        assert!(report.my_score > 0, "report={report:?}");
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 3, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 4, "same".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].turn, 4);
    }
}
