use std::collections::BTreeSet;

use crate::constants::{BONUS_REWARD, ORDINARY_REWARD, UNKNOWN_REWARD};
use crate::grid::{Grid, Tile};
use crate::types::{Direction, ItemTier, Vec2};

/// Reward a swept cell is worth given what the grid shows on it this turn.
pub fn observed_reward(tile: Tile) -> i32 {
    match tile {
        Tile::Item(ItemTier::Bonus) => BONUS_REWARD,
        Tile::Item(ItemTier::Ordinary) => ORDINARY_REWARD,
        Tile::Wall | Tile::Floor | Tile::Unit(_) => 0,
    }
}

/// Cells seen from `origin` looking in `dir`: the origin itself, then every floor
/// cell up to the first wall. A wall-free ring stops once it comes back around.
pub fn sightline(grid: &Grid, origin: Vec2, dir: Direction) -> Vec<Vec2> {
    let origin = grid.wrap(origin);
    let mut cells = Vec::new();
    if grid.is_wall(origin) {
        return cells;
    }
    cells.push(origin);
    let mut pos = grid.neighbor(origin, dir);
    while pos != origin && grid.is_passable(pos) {
        cells.push(pos);
        pos = grid.neighbor(pos, dir);
    }
    cells
}

/// Cells carrying an item marker in the grid's observed layer.
pub fn item_cells(grid: &Grid) -> impl Iterator<Item = Vec2> + '_ {
    grid.positions().filter(|pos| matches!(grid.tile(*pos), Tile::Item(_)))
}

pub fn observed_cells(grid: &Grid, origins: &[Vec2]) -> BTreeSet<Vec2> {
    let mut out = BTreeSet::new();
    for &origin in origins {
        for dir in Direction::ALL {
            out.extend(sightline(grid, origin, dir));
        }
    }
    out
}

/// Persistent per-cell reward estimate. Cells are only rewritten when a friendly
/// unit can see them or an item is reported on them; everything else keeps
/// whatever was last believed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeliefGrid {
    width: i32,
    height: i32,
    values: Vec<i32>,
}

impl BeliefGrid {
    pub fn new(grid: &Grid) -> Self {
        let values = grid
            .positions()
            .map(|pos| if grid.is_wall(pos) { 0 } else { UNKNOWN_REWARD })
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            values,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    fn index(&self, pos: Vec2) -> usize {
        let pos = pos.wrapped(self.width, self.height);
        (pos.y * self.width + pos.x) as usize
    }

    pub fn get(&self, pos: Vec2) -> i32 {
        self.values[self.index(pos)]
    }

    pub fn set(&mut self, pos: Vec2, value: i32) {
        let idx = self.index(pos);
        self.values[idx] = value.max(0);
    }

    /// Overwrites every cell on the four sightlines of each origin with what the
    /// grid's observed layer shows there, then every reported item cell with its
    /// tier reward wherever it is. Must run after the turn's units and items are
    /// placed on `grid`.
    pub fn observe(&mut self, grid: &Grid, origins: &[Vec2]) -> usize {
        let mut swept = 0;
        for &origin in origins {
            for dir in Direction::ALL {
                for pos in sightline(grid, origin, dir) {
                    let idx = self.index(pos);
                    self.values[idx] = observed_reward(grid.tile(pos));
                    swept += 1;
                }
            }
        }
        // bonus pellets are reported out of sight too
        for pos in item_cells(grid) {
            let idx = self.index(pos);
            self.values[idx] = observed_reward(grid.tile(pos));
            swept += 1;
        }
        swept
    }

    pub fn total(&self) -> i64 {
        self.values.iter().map(|value| *value as i64).sum()
    }

    /// One digit per cell; bonus values show as 9 so the rows stay aligned.
    pub fn render(&self) -> Vec<String> {
        self.values
            .chunks(self.width.max(1) as usize)
            .map(|row| {
                row.iter()
                    .map(|value| {
                        char::from_digit((*value).clamp(0, 9) as u32, 10).unwrap_or('9')
                    })
                    .collect::<String>()
            })
            .collect()
    }
}
