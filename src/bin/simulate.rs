use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use pellet_pursuit_agent::logging::{now_ms, Logger};
use pellet_pursuit_agent::sim::{run_match, MatchOptions, MatchReport};
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    matches: u32,
    #[arg(long, default_value_t = 31)]
    width: i32,
    #[arg(long, default_value_t = 15)]
    height: i32,
    #[arg(long)]
    units: Option<usize>,
    #[arg(long, default_value_t = 200)]
    turns: u64,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "matchCount")]
    match_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    wins: usize,
    #[serde(rename = "averageTurns")]
    average_turns: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    matches: Vec<MatchReport>,
}

fn main() {
    let cli = Cli::parse();
    let logger = Logger::new(cli.quiet);
    let base_seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let started_at_ms = now_ms();
    let mut reports = Vec::new();

    for offset in 0..cli.matches {
        let options = MatchOptions {
            seed: base_seed.wrapping_add(offset),
            width: cli.width,
            height: cli.height,
            units_per_team: cli.units,
            max_turns: cli.turns,
        };
        logger.info("match_started", None, json!(options));

        let report = match run_match(&options) {
            Ok(report) => report,
            Err(error) => {
                logger.error(
                    "match_failed",
                    None,
                    json!({ "seed": options.seed, "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &report.anomaly_records {
            logger.warn(
                "anomaly_detected",
                Some(anomaly.turn),
                json!({ "seed": report.seed, "message": anomaly.message }),
            );
        }
        logger.info(
            "match_finished",
            Some(report.turns),
            json!({
                "seed": report.seed,
                "outcome": outcome_key(&report),
                "myScore": report.my_score,
                "opponentScore": report.opponent_score,
            }),
        );

        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(error) => logger.error("report_serialize_failed", None, json!(error.to_string())),
        }
        reports.push(report);
    }

    let summary = build_run_summary(started_at_ms, now_ms(), reports);
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            logger.error(
                "summary_write_failed",
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    logger.info(
        "run_finished",
        None,
        json!({
            "matchCount": summary.match_count,
            "anomalyCount": summary.anomaly_count,
            "wins": summary.wins,
            "averageTurns": summary.average_turns,
            "outcomeCounts": summary.outcome_counts,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn outcome_key(report: &MatchReport) -> String {
    match report.my_score.cmp(&report.opponent_score) {
        std::cmp::Ordering::Greater => "win",
        std::cmp::Ordering::Less => "loss",
        std::cmp::Ordering::Equal => "draw",
    }
    .to_string()
}

fn build_run_summary(
    started_at_ms: u64,
    finished_at_ms: u64,
    matches: Vec<MatchReport>,
) -> RunSummary {
    let match_count = matches.len();
    let mut outcome_counts = BTreeMap::new();
    for report in &matches {
        *outcome_counts.entry(outcome_key(report)).or_insert(0) += 1;
    }
    let total_turns: u64 = matches.iter().map(|report| report.turns).sum();
    RunSummary {
        started_at_ms,
        finished_at_ms,
        match_count,
        anomaly_count: matches
            .iter()
            .map(|report| report.anomaly_records.len())
            .sum(),
        wins: outcome_counts.get("win").copied().unwrap_or(0),
        average_turns: if match_count == 0 {
            0
        } else {
            total_turns / match_count as u64
        },
        outcome_counts,
        matches,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
