use std::collections::HashSet;

use serde::Serialize;

use crate::belief::BeliefGrid;
use crate::grid::Grid;
use crate::search::{find_best_target, RewardMap, SearchResult};
use crate::types::{Command, Team, Unit, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldReason {
    NoReward,
    DuplicateTarget,
    OccupiedTarget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionKind {
    Ability,
    Move { score: i32 },
    Hold { reason: HoldReason },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitDecision {
    #[serde(rename = "unitId")]
    pub unit_id: i32,
    pub origin: Vec2,
    pub target: Vec2,
    pub command: Command,
    #[serde(flatten)]
    pub kind: DecisionKind,
}

impl UnitDecision {
    fn ability(unit: &Unit) -> Self {
        Self {
            unit_id: unit.id,
            origin: unit.pos,
            target: unit.pos,
            command: Command::Speed { unit_id: unit.id },
            kind: DecisionKind::Ability,
        }
    }

    fn hold(unit: &Unit, reason: HoldReason) -> Self {
        Self {
            unit_id: unit.id,
            origin: unit.pos,
            target: unit.pos,
            command: Command::Move {
                unit_id: unit.id,
                x: unit.pos.x,
                y: unit.pos.y,
            },
            kind: DecisionKind::Hold { reason },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TurnPlan {
    pub decisions: Vec<UnitDecision>,
}

impl TurnPlan {
    pub fn commands(&self) -> Vec<Command> {
        self.decisions.iter().map(|decision| decision.command).collect()
    }

    pub fn to_protocol_line(&self) -> String {
        crate::protocol::format_commands(&self.commands())
    }

    pub fn holds(&self) -> usize {
        self.decisions
            .iter()
            .filter(|decision| matches!(decision.kind, DecisionKind::Hold { .. }))
            .count()
    }
}

/// Turns one unit's search result into its command, given the targets already
/// handed out this turn and the cells friendly units stand on. Whatever target ends
/// up in the command is recorded.
pub fn resolve_target(
    assigned: &mut HashSet<Vec2>,
    occupied: &HashSet<Vec2>,
    unit: &Unit,
    result: &SearchResult,
) -> UnitDecision {
    let decision = if assigned.contains(&result.target) {
        UnitDecision::hold(unit, HoldReason::DuplicateTarget)
    } else if result.target != unit.pos && occupied.contains(&result.target) {
        // a teammate may hold or use its ability on that cell
        UnitDecision::hold(unit, HoldReason::OccupiedTarget)
    } else if result.target == unit.pos {
        UnitDecision::hold(unit, HoldReason::NoReward)
    } else {
        UnitDecision {
            unit_id: unit.id,
            origin: unit.pos,
            target: result.target,
            command: Command::Move {
                unit_id: unit.id,
                x: result.target.x,
                y: result.target.y,
            },
            kind: DecisionKind::Move {
                score: result.score,
            },
        }
    };
    assigned.insert(decision.target);
    decision
}

/// Plans every friendly unit in input order. Units with a ready ability spend the
/// turn on it; the rest search a reward map that loses each earlier unit's path.
pub fn plan_turn(grid: &Grid, belief: &BeliefGrid, units: &[Unit]) -> TurnPlan {
    let mut rewards = RewardMap::from_belief(belief);
    let mut assigned = HashSet::new();
    let mut decisions = Vec::new();
    let occupied: HashSet<Vec2> = units
        .iter()
        .filter(|unit| unit.team == Team::Mine)
        .map(|unit| unit.pos)
        .collect();

    for unit in units.iter().filter(|unit| unit.team == Team::Mine) {
        if unit.is_ability_ready() {
            decisions.push(UnitDecision::ability(unit));
            continue;
        }

        let result = find_best_target(grid, &rewards, unit.pos);
        let decision = resolve_target(&mut assigned, &occupied, unit, &result);
        if matches!(decision.kind, DecisionKind::Move { .. }) {
            rewards.claim_path(&result.path);
        }
        decisions.push(decision);
    }

    TurnPlan { decisions }
}
