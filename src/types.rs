use std::fmt;

use serde::Serialize;

use crate::constants::BONUS_ITEM_VALUE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Folds any coordinate back onto a `width` x `height` torus.
    pub fn wrapped(self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.rem_euclid(width.max(1)),
            y: self.y.rem_euclid(height.max(1)),
        }
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order used by the search and the sightline sweep.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Mine,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTier {
    Ordinary,
    Bonus,
}

impl ItemTier {
    pub fn from_value(value: i32) -> Self {
        if value == BONUS_ITEM_VALUE {
            ItemTier::Bonus
        } else {
            ItemTier::Ordinary
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Unit {
    pub id: i32,
    pub pos: Vec2,
    pub team: Team,
    #[serde(rename = "typeId")]
    pub type_id: String,
    #[serde(rename = "speedTurnsLeft")]
    pub speed_turns_left: i32,
    #[serde(rename = "abilityCooldown")]
    pub ability_cooldown: i32,
}

impl Unit {
    pub fn is_ability_ready(&self) -> bool {
        self.ability_cooldown == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub pos: Vec2,
    pub value: i32,
}

impl Item {
    pub fn tier(&self) -> ItemTier {
        ItemTier::from_value(self.value)
    }
}

/// Everything the referee reveals in one turn. Rebuilt from scratch every turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnObservation {
    pub my_score: i32,
    pub opponent_score: i32,
    pub units: Vec<Unit>,
    pub items: Vec<Item>,
}

impl TurnObservation {
    pub fn my_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|unit| unit.team == Team::Mine)
    }

    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|unit| unit.team == Team::Enemy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Move {
        #[serde(rename = "unitId")]
        unit_id: i32,
        x: i32,
        y: i32,
    },
    Speed {
        #[serde(rename = "unitId")]
        unit_id: i32,
    },
}

impl Command {
    pub fn unit_id(&self) -> i32 {
        match self {
            Command::Move { unit_id, .. } | Command::Speed { unit_id } => *unit_id,
        }
    }

    pub fn move_target(&self) -> Option<Vec2> {
        match self {
            Command::Move { x, y, .. } => Some(Vec2::new(*x, *y)),
            Command::Speed { .. } => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move { unit_id, x, y } => write!(f, "MOVE {unit_id} {x} {y}"),
            Command::Speed { unit_id } => write!(f, "SPEED {unit_id}"),
        }
    }
}
