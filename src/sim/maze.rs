use std::collections::VecDeque;

use crate::constants::{
    FLOOR_CHAR, MAZE_OPEN_RATE, MIN_MAZE_HEIGHT, MIN_MAZE_WIDTH, TUNNEL_RATE, WALL_CHAR,
};
use crate::rng::Rng;

/// Mirror-symmetric toroidal maze. The top and bottom rows are solid, the side
/// columns are solid except for tunnel rows that wrap left to right, and the middle
/// row is always open end to end. Floor that cannot reach the middle row is walled
/// up so every pellet is collectable.
pub fn generate_maze(width: i32, height: i32, rng: &mut Rng) -> Vec<String> {
    let width = width.max(MIN_MAZE_WIDTH);
    let height = height.max(MIN_MAZE_HEIGHT);
    let mid = height / 2;
    let mut wall = vec![vec![true; width as usize]; height as usize];

    for y in 1..(height - 1) {
        let tunnel = y == mid || rng.chance(TUNNEL_RATE);
        for x in 0..((width + 1) / 2) {
            let open = if x == 0 {
                tunnel
            } else if y == mid {
                true
            } else {
                rng.chance(MAZE_OPEN_RATE)
            };
            wall[y as usize][x as usize] = !open;
            wall[y as usize][(width - 1 - x) as usize] = !open;
        }
    }

    let reachable = reachable_from(&wall, 0, mid);
    for y in 0..height as usize {
        for x in 0..width as usize {
            if !reachable[y][x] {
                wall[y][x] = true;
            }
        }
    }

    wall.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|is_wall| if is_wall { WALL_CHAR } else { FLOOR_CHAR })
                .collect::<String>()
        })
        .collect()
}

fn reachable_from(wall: &[Vec<bool>], start_x: i32, start_y: i32) -> Vec<Vec<bool>> {
    let height = wall.len() as i32;
    let width = wall.first().map(|row| row.len()).unwrap_or(0) as i32;
    let mut seen = vec![vec![false; width as usize]; height as usize];
    if width == 0 || wall[start_y as usize][start_x as usize] {
        return seen;
    }

    let mut queue = VecDeque::new();
    seen[start_y as usize][start_x as usize] = true;
    queue.push_back((start_x, start_y));

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            let nx = nx.rem_euclid(width);
            let ny = ny.rem_euclid(height);
            if wall[ny as usize][nx as usize] || seen[ny as usize][nx as usize] {
                continue;
            }
            seen[ny as usize][nx as usize] = true;
            queue.push_back((nx, ny));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::grid::Grid;
    use crate::types::Vec2;

    fn connected_floor(grid: &Grid) -> HashSet<Vec2> {
        let start = Vec2::new(0, grid.height() / 2);
        let mut out = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            for next in grid.neighbors(pos) {
                if grid.is_passable(next) && out.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        out
    }

    #[test]
    fn same_seed_produces_same_maze() {
        let a = generate_maze(21, 11, &mut Rng::new(42));
        let b = generate_maze(21, 11, &mut Rng::new(42));
        assert_eq!(a, b);
    }

    #[test]
    fn maze_is_mirrored_and_walled_top_and_bottom() {
        for seed in 0..100u32 {
            let rows = generate_maze(19, 9, &mut Rng::new(seed));
            assert_eq!(rows.len(), 9);
            assert!(rows[0].chars().all(|ch| ch == WALL_CHAR));
            assert!(rows[8].chars().all(|ch| ch == WALL_CHAR));
            for row in &rows {
                assert_eq!(row.len(), 19);
                let reversed: String = row.chars().rev().collect();
                assert_eq!(row, &reversed, "seed={seed}");
            }
        }
    }

    #[test]
    fn every_floor_cell_is_reachable_from_the_middle_row() {
        for seed in 0..100u32 {
            let rows = generate_maze(23, 13, &mut Rng::new(seed));
            let grid = Grid::from_rows(&rows).expect("generated maze should load");
            let reachable = connected_floor(&grid);
            assert_eq!(reachable.len(), grid.floor_count(), "seed={seed}");
        }
    }

    #[test]
    fn tiny_sizes_are_raised_to_the_minimum() {
        let rows = generate_maze(2, 2, &mut Rng::new(1));
        assert_eq!(rows.len(), MIN_MAZE_HEIGHT as usize);
        assert_eq!(rows[0].len(), MIN_MAZE_WIDTH as usize);
    }
}
