use std::io;

use crate::constants::{FLOOR_CHAR, MAX_GRID_CELLS, WALL_CHAR};
use crate::types::{Direction, ItemTier, Team, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Unit(Team),
    Item(ItemTier),
}

impl Tile {
    pub fn is_wall(self) -> bool {
        self == Tile::Wall
    }

    pub fn symbol(self) -> char {
        match self {
            Tile::Wall => WALL_CHAR,
            Tile::Floor => FLOOR_CHAR,
            Tile::Unit(Team::Mine) => 'P',
            Tile::Unit(Team::Enemy) => 'E',
            Tile::Item(ItemTier::Ordinary) => 'o',
            Tile::Item(ItemTier::Bonus) => 'O',
        }
    }
}

/// Toroidal maze. Walls are fixed at load; every other cell carries at most one
/// marker for the current turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn load<S: AsRef<str>>(width: i32, height: i32, rows: &[S]) -> io::Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(invalid_data(format!("grid size must be positive, got {width}x{height}")));
        }
        let cells = width
            .checked_mul(height)
            .filter(|cells| *cells <= MAX_GRID_CELLS)
            .ok_or_else(|| invalid_data(format!("grid size {width}x{height} is too large")))?;
        if rows.len() != height as usize {
            return Err(invalid_data(format!(
                "expected {height} grid rows, got {}",
                rows.len()
            )));
        }

        let mut tiles = vec![Tile::Floor; cells as usize];
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() > width as usize {
                return Err(invalid_data(format!(
                    "grid row {y} is wider than {width}: {row:?}"
                )));
            }
            // Short rows come from harnesses that trim trailing floor.
            for (x, ch) in row.chars().enumerate() {
                if ch == WALL_CHAR {
                    tiles[y * width as usize + x] = Tile::Wall;
                }
            }
        }

        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> io::Result<Self> {
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        Self::load(width as i32, rows.len() as i32, rows)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        pos.wrapped(self.width, self.height)
    }

    /// Row-major cell index. Out-of-range positions wrap first, so this never panics.
    pub fn index(&self, pos: Vec2) -> usize {
        let pos = self.wrap(pos);
        (pos.y * self.width + pos.x) as usize
    }

    pub fn position_of(&self, index: usize) -> Vec2 {
        let index = index as i32;
        Vec2::new(index % self.width, index / self.width)
    }

    pub fn tile(&self, pos: Vec2) -> Tile {
        self.tiles[self.index(pos)]
    }

    pub fn is_wall(&self, pos: Vec2) -> bool {
        self.tile(pos).is_wall()
    }

    pub fn is_passable(&self, pos: Vec2) -> bool {
        !self.is_wall(pos)
    }

    pub fn neighbor(&self, pos: Vec2, dir: Direction) -> Vec2 {
        let (dx, dy) = dir.delta();
        self.wrap(Vec2::new(pos.x + dx, pos.y + dy))
    }

    pub fn neighbors(&self, pos: Vec2) -> [Vec2; 4] {
        Direction::ALL.map(|dir| self.neighbor(pos, dir))
    }

    /// All cells in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Vec2::new(x, y)))
    }

    pub fn floor_count(&self) -> usize {
        self.tiles.iter().filter(|tile| !tile.is_wall()).count()
    }

    pub fn reset_observed_layer(&mut self) {
        for tile in &mut self.tiles {
            if !tile.is_wall() {
                *tile = Tile::Floor;
            }
        }
    }

    pub fn place_unit(&mut self, pos: Vec2, team: Team) -> bool {
        self.place(pos, Tile::Unit(team))
    }

    pub fn place_item(&mut self, pos: Vec2, tier: ItemTier) -> bool {
        self.place(pos, Tile::Item(tier))
    }

    fn place(&mut self, pos: Vec2, tile: Tile) -> bool {
        if !self.contains(pos) {
            return false;
        }
        let idx = self.index(pos);
        if self.tiles[idx].is_wall() {
            return false;
        }
        self.tiles[idx] = tile;
        true
    }

    pub fn render(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.tile(Vec2::new(x, y)).symbol())
                    .collect::<String>()
            })
            .collect()
    }

    /// Rows containing only the fixed wall layout, as sent at startup.
    pub fn layout_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        if self.is_wall(Vec2::new(x, y)) {
                            WALL_CHAR
                        } else {
                            FLOOR_CHAR
                        }
                    })
                    .collect::<String>()
            })
            .collect()
    }
}

pub(crate) fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
