use std::io::{self, BufReader, Write};

use clap::Parser;
use pellet_pursuit_agent::agent::Agent;
use pellet_pursuit_agent::logging::Logger;
use pellet_pursuit_agent::protocol::{read_startup, read_turn};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log the observed grid every turn.
    #[arg(long)]
    debug_grid: bool,
    /// Log the belief grid every turn.
    #[arg(long)]
    debug_belief: bool,
    /// Only log warnings and errors.
    #[arg(long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let logger = Logger::new(cli.quiet);
    if let Err(error) = run(&cli, &logger) {
        logger.error(
            "protocol_error",
            None,
            json!({
                "kind": format!("{:?}", error.kind()),
                "error": error.to_string(),
            }),
        );
        std::process::exit(2);
    }
}

fn run(cli: &Cli, logger: &Logger) -> io::Result<()> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let grid = read_startup(&mut reader)?;
    logger.info(
        "agent_started",
        None,
        json!({
            "width": grid.width(),
            "height": grid.height(),
            "floorCells": grid.floor_count(),
        }),
    );
    let mut agent = Agent::new(grid);

    while let Some(observation) = read_turn(&mut reader)? {
        let plan = agent.play_turn(&observation)?;
        writeln!(out, "{}", plan.to_protocol_line())?;
        out.flush()?;

        let turn = Some(agent.turn());
        logger.info(
            "turn_planned",
            turn,
            json!({
                "myScore": observation.my_score,
                "opponentScore": observation.opponent_score,
                "visibleUnits": observation.units.len(),
                "visibleEnemies": observation.enemy_units().count(),
                "visibleItems": observation.items.len(),
                "beliefTotal": agent.belief().total(),
                "decisions": plan.decisions,
            }),
        );
        if cli.debug_grid {
            logger.debug("grid_debug", turn, json!({ "rows": agent.grid().render() }));
        }
        if cli.debug_belief {
            logger.debug("belief_debug", turn, json!({ "rows": agent.belief().render() }));
        }
    }

    logger.info("agent_finished", Some(agent.turn()), json!({}));
    Ok(())
}
