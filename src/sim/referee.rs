use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io;

use crate::belief::observed_cells;
use crate::constants::{
    get_bonus_pairs, ABILITY_COOLDOWN_TURNS, BONUS_ITEM_VALUE, ORDINARY_ITEM_VALUE,
    SPEED_DURATION_TURNS,
};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{Command, Direction, Item, Team, TurnObservation, Unit, Vec2};

#[derive(Clone, Debug)]
pub struct SimUnit {
    pub id: i32,
    pub team: Team,
    pub pos: Vec2,
    pub speed_turns_left: i32,
    pub ability_cooldown: i32,
}

impl SimUnit {
    fn view(&self) -> Unit {
        Unit {
            id: self.id,
            pos: self.pos,
            team: self.team,
            type_id: "ROCK".to_string(),
            speed_turns_left: self.speed_turns_left,
            ability_cooldown: self.ability_cooldown,
        }
    }
}

/// Minimal stand-in for the game server: owns the true pellet layout, reveals only
/// what friendly sightlines allow, and applies one turn of commands.
#[derive(Clone, Debug)]
pub struct Referee {
    grid: Grid,
    pellets: BTreeMap<Vec2, i32>,
    units: Vec<SimUnit>,
    scores: HashMap<Team, i32>,
    turn: u64,
    rng: Rng,
}

impl Referee {
    pub fn new(rows: &[String], units_per_team: usize, mut rng: Rng) -> io::Result<Self> {
        let grid = Grid::from_rows(rows)?;
        let mut candidates: Vec<Vec2> = grid
            .positions()
            .filter(|pos| grid.is_passable(*pos) && pos.x < grid.width() / 2)
            .collect();

        let mirror = |pos: Vec2| Vec2::new(grid.width() - 1 - pos.x, pos.y);
        let mut units = Vec::new();
        for id in 0..units_per_team {
            if candidates.is_empty() {
                break;
            }
            let pos = candidates.swap_remove(rng.pick_index(candidates.len()));
            for (team, pos) in [(Team::Mine, pos), (Team::Enemy, mirror(pos))] {
                units.push(SimUnit {
                    id: id as i32,
                    team,
                    pos,
                    speed_turns_left: 0,
                    ability_cooldown: 0,
                });
            }
        }

        let occupied: HashSet<Vec2> = units.iter().map(|unit| unit.pos).collect();
        let mut pellets: BTreeMap<Vec2, i32> = grid
            .positions()
            .filter(|pos| grid.is_passable(*pos) && !occupied.contains(pos))
            .map(|pos| (pos, ORDINARY_ITEM_VALUE))
            .collect();

        for _ in 0..get_bonus_pairs(grid.width(), grid.height()) {
            if candidates.is_empty() {
                break;
            }
            let pos = candidates.swap_remove(rng.pick_index(candidates.len()));
            for pos in [pos, mirror(pos)] {
                pellets.insert(pos, BONUS_ITEM_VALUE);
            }
        }

        Ok(Self {
            grid,
            pellets,
            units,
            scores: HashMap::from([(Team::Mine, 0), (Team::Enemy, 0)]),
            turn: 0,
            rng,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn score(&self, team: Team) -> i32 {
        self.scores.get(&team).copied().unwrap_or(0)
    }

    pub fn pellets_left(&self) -> usize {
        self.pellets.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pellets.is_empty()
    }

    pub fn units(&self) -> &[SimUnit] {
        &self.units
    }

    /// What the friendly side is told this turn: all own units, enemies and pellets
    /// on a friendly sightline, and every bonus pellet wherever it is.
    pub fn observation(&self) -> TurnObservation {
        let origins: Vec<Vec2> = self
            .units
            .iter()
            .filter(|unit| unit.team == Team::Mine)
            .map(|unit| unit.pos)
            .collect();
        let visible: BTreeSet<Vec2> = observed_cells(&self.grid, &origins);

        let units = self
            .units
            .iter()
            .filter(|unit| unit.team == Team::Mine || visible.contains(&unit.pos))
            .map(SimUnit::view)
            .collect();
        let items = self
            .pellets
            .iter()
            .filter(|(pos, value)| **value == BONUS_ITEM_VALUE || visible.contains(*pos))
            .map(|(pos, value)| Item {
                pos: *pos,
                value: *value,
            })
            .collect();

        TurnObservation {
            my_score: self.score(Team::Mine),
            opponent_score: self.score(Team::Enemy),
            units,
            items,
        }
    }

    /// Applies the friendly commands plus a random step for every enemy, then ticks
    /// timers. Friendly units block each other; enemies pass through. Returns rule
    /// violations found in the commands.
    pub fn apply(&mut self, commands: &[Command]) -> Vec<String> {
        let mut anomalies = check_commands(&self.grid, &self.units, commands);

        for command in commands {
            let Some(idx) = self
                .units
                .iter()
                .position(|unit| unit.team == Team::Mine && unit.id == command.unit_id())
            else {
                continue;
            };
            match *command {
                Command::Speed { unit_id } => {
                    if self.units[idx].ability_cooldown > 0 {
                        anomalies.push(format!("unit {unit_id} used SPEED on cooldown"));
                        continue;
                    }
                    self.units[idx].speed_turns_left = SPEED_DURATION_TURNS;
                    self.units[idx].ability_cooldown = ABILITY_COOLDOWN_TURNS;
                }
                Command::Move { x, y, .. } => {
                    let target = Vec2::new(x, y);
                    if !self.grid.contains(target) || self.grid.is_wall(target) {
                        continue;
                    }
                    let steps = if self.units[idx].speed_turns_left > 0 { 2 } else { 1 };
                    for _ in 0..steps {
                        let next = step_toward(&self.grid, self.units[idx].pos, target);
                        if self.is_friendly_at(next, idx) {
                            break;
                        }
                        self.units[idx].pos = next;
                        self.eat(next, Team::Mine);
                    }
                }
            }
        }

        for idx in 0..self.units.len() {
            if self.units[idx].team != Team::Enemy {
                continue;
            }
            let pos = self.units[idx].pos;
            let options: Vec<Vec2> = Direction::ALL
                .iter()
                .map(|dir| self.grid.neighbor(pos, *dir))
                .filter(|next| self.grid.is_passable(*next))
                .collect();
            if options.is_empty() {
                continue;
            }
            let next = options[self.rng.pick_index(options.len())];
            self.units[idx].pos = next;
            self.eat(next, Team::Enemy);
        }

        for unit in &mut self.units {
            unit.speed_turns_left = (unit.speed_turns_left - 1).max(0);
            unit.ability_cooldown = (unit.ability_cooldown - 1).max(0);
        }
        self.turn += 1;
        anomalies
    }

    fn is_friendly_at(&self, pos: Vec2, except: usize) -> bool {
        self.units
            .iter()
            .enumerate()
            .any(|(idx, unit)| idx != except && unit.team == Team::Mine && unit.pos == pos)
    }

    fn eat(&mut self, pos: Vec2, team: Team) {
        if let Some(value) = self.pellets.remove(&pos) {
            *self.scores.entry(team).or_insert(0) += value;
        }
    }
}

/// Every friendly unit gets exactly one command, MOVE targets are floor cells, and
/// no two MOVE commands share a destination.
pub fn check_commands(grid: &Grid, units: &[SimUnit], commands: &[Command]) -> Vec<String> {
    let mut anomalies = Vec::new();
    let mut commanded = HashSet::new();
    let mut targets = HashSet::new();

    for command in commands {
        let id = command.unit_id();
        if !units
            .iter()
            .any(|unit| unit.team == Team::Mine && unit.id == id)
        {
            anomalies.push(format!("command for unknown unit {id}"));
        }
        if !commanded.insert(id) {
            anomalies.push(format!("unit {id} received more than one command"));
        }
        if let Some(target) = command.move_target() {
            if !grid.contains(target) || grid.is_wall(target) {
                anomalies.push(format!("unit {id} targets non-floor cell {target}"));
            }
            if !targets.insert(target) {
                anomalies.push(format!("duplicate MOVE target {target}"));
            }
        }
    }

    for unit in units.iter().filter(|unit| unit.team == Team::Mine) {
        if !commanded.contains(&unit.id) {
            anomalies.push(format!("unit {} received no command", unit.id));
        }
    }
    anomalies
}

/// First cell on a shortest toroidal path from `from` to `to`. Stays put when the
/// target is unreachable or already reached.
pub fn step_toward(grid: &Grid, from: Vec2, to: Vec2) -> Vec2 {
    if from == to {
        return from;
    }
    let mut parents: HashMap<Vec2, Vec2> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    parents.insert(from, from);

    while let Some(pos) = queue.pop_front() {
        if pos == to {
            let mut cursor = to;
            while let Some(&parent) = parents.get(&cursor) {
                if parent == from {
                    return cursor;
                }
                cursor = parent;
            }
            return from;
        }
        for next in grid.neighbors(pos) {
            if grid.is_passable(next) && !parents.contains_key(&next) {
                parents.insert(next, pos);
                queue.push_back(next);
            }
        }
    }
    from
}
