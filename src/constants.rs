pub const WALL_CHAR: char = '#';
pub const FLOOR_CHAR: char = ' ';
/// Largest grid the loader accepts; real boards are a few hundred cells.
pub const MAX_GRID_CELLS: i32 = 1 << 20;

/// Pellet value the referee uses for the bonus tier.
pub const BONUS_ITEM_VALUE: i32 = 10;
pub const ORDINARY_ITEM_VALUE: i32 = 1;

/// Belief assigned to floor cells that have never been swept.
pub const UNKNOWN_REWARD: i32 = 1;
pub const ORDINARY_REWARD: i32 = 2;
pub const BONUS_REWARD: i32 = 10;

pub const SPEED_DURATION_TURNS: i32 = 5;
pub const ABILITY_COOLDOWN_TURNS: i32 = 10;

pub const MIN_MAZE_WIDTH: i32 = 9;
pub const MIN_MAZE_HEIGHT: i32 = 7;
pub const MAZE_OPEN_RATE: f32 = 0.74;
pub const TUNNEL_RATE: f32 = 0.2;

pub fn get_units_per_team(width: i32) -> usize {
    if width <= 19 {
        return 2;
    }
    if width <= 27 {
        return 3;
    }
    if width <= 33 {
        return 4;
    }
    5
}

pub fn get_bonus_pairs(width: i32, height: i32) -> usize {
    let area = width * height;
    if area <= 200 {
        return 1;
    }
    if area <= 500 {
        return 2;
    }
    3
}
