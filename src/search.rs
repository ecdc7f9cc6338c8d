use std::collections::VecDeque;

use serde::Serialize;

use crate::belief::BeliefGrid;
use crate::grid::Grid;
use crate::types::Vec2;

/// Reward still up for grabs this turn. Starts as a copy of the belief grid; cells
/// claimed by a unit earlier in the turn read as zero for everyone after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardMap {
    width: i32,
    height: i32,
    values: Vec<i32>,
}

impl RewardMap {
    pub fn from_belief(belief: &BeliefGrid) -> Self {
        Self {
            width: belief.width(),
            height: belief.height(),
            values: belief.values().to_vec(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_values(width: i32, height: i32, values: Vec<i32>) -> Self {
        let mut values = values;
        values.resize((width.max(0) * height.max(0)) as usize, 0);
        for value in &mut values {
            *value = (*value).max(0);
        }
        Self {
            width,
            height,
            values,
        }
    }

    fn index(&self, pos: Vec2) -> usize {
        let pos = pos.wrapped(self.width, self.height);
        (pos.y * self.width + pos.x) as usize
    }

    pub fn get(&self, pos: Vec2) -> i32 {
        self.values[self.index(pos)]
    }

    pub fn claim(&mut self, pos: Vec2) {
        let idx = self.index(pos);
        self.values[idx] = 0;
    }

    pub fn claim_path(&mut self, path: &[Vec2]) {
        for &pos in path {
            self.claim(pos);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub origin: Vec2,
    pub target: Vec2,
    pub score: i32,
    /// Cells from origin to target inclusive, following the BFS tree.
    pub path: Vec<Vec2>,
    pub visited: usize,
}

impl SearchResult {
    pub fn first_step(&self) -> Vec2 {
        self.path.get(1).copied().unwrap_or(self.origin)
    }
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    pos: Vec2,
    score: i32,
    from: Option<Vec2>,
}

/// Breadth-first sweep from `origin` that carries the reward collected so far.
///
/// Each cell is scored once, on first visit, with the running total of the path
/// that reached it first; its reward is then zeroed in a private scratch copy so it
/// is not counted twice. The target is the strictly best score in row-major order,
/// defaulting to the origin with score 0.
pub fn find_best_target(grid: &Grid, rewards: &RewardMap, origin: Vec2) -> SearchResult {
    let origin = grid.wrap(origin);
    let len = grid.len();
    // a map of another size reads as zero past its end
    let mut scratch = rewards.values.clone();
    scratch.resize(len, 0);
    let mut scores: Vec<Option<i32>> = vec![None; len];
    let mut parents: Vec<Option<Vec2>> = vec![None; len];
    let mut visited = vec![false; len];
    let mut visited_count = 0usize;

    let mut queue = VecDeque::new();
    queue.push_back(Frontier {
        pos: origin,
        score: 0,
        from: None,
    });

    while let Some(node) = queue.pop_front() {
        let idx = grid.index(node.pos);
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        visited_count += 1;

        if grid.is_wall(node.pos) {
            continue;
        }

        // first visit is the only visit
        let new_score = node.score + scratch[idx];
        scores[idx] = Some(new_score);
        parents[idx] = node.from;
        scratch[idx] = 0;

        for next in grid.neighbors(node.pos) {
            if !visited[grid.index(next)] {
                queue.push_back(Frontier {
                    pos: next,
                    score: new_score,
                    from: Some(node.pos),
                });
            }
        }
    }

    let mut target = origin;
    let mut best_score = 0;
    for (idx, score) in scores.iter().enumerate() {
        if let Some(score) = *score {
            if score > best_score {
                best_score = score;
                target = grid.position_of(idx);
            }
        }
    }

    let mut path = Vec::new();
    let mut cursor = Some(target);
    while let Some(pos) = cursor {
        path.push(pos);
        cursor = parents[grid.index(pos)];
    }
    path.reverse();

    SearchResult {
        origin,
        target,
        score: best_score,
        path,
        visited: visited_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn open_grid(width: usize, height: usize) -> Grid {
        let rows = vec![" ".repeat(width); height];
        Grid::from_rows(&rows).expect("grid should load")
    }

    fn rewards_for(grid: &Grid, cells: &[(Vec2, i32)]) -> RewardMap {
        let mut values = vec![0; grid.len()];
        for &(pos, value) in cells {
            values[grid.index(pos)] = value;
        }
        RewardMap::from_values(grid.width(), grid.height(), values)
    }

    #[test]
    fn all_zero_rewards_target_the_origin() {
        let grid = open_grid(6, 4);
        let rewards = rewards_for(&grid, &[]);
        let result = find_best_target(&grid, &rewards, Vec2::new(3, 2));
        assert_eq!(result.target, Vec2::new(3, 2));
        assert_eq!(result.score, 0);
        assert_eq!(result.path, vec![Vec2::new(3, 2)]);
        assert_eq!(result.first_step(), Vec2::new(3, 2));
        assert_eq!(result.visited, 24);
    }

    #[test]
    fn bonus_on_the_open_row_pulls_the_unit_along_it() {
        // Belief after one sweep from (2,2): row 2 and column 2 are seen and empty
        // apart from the bonus, everything else is still the unknown baseline.
        let grid = open_grid(5, 5);
        let mut cells = Vec::new();
        for pos in grid.positions() {
            let value = if pos == Vec2::new(4, 2) {
                10
            } else if pos.x == 2 || pos.y == 2 {
                0
            } else {
                1
            };
            cells.push((pos, value));
        }
        let rewards = rewards_for(&grid, &cells);

        let result = find_best_target(&grid, &rewards, Vec2::new(2, 2));
        assert_eq!(result.target, Vec2::new(4, 2));
        assert_eq!(result.score, 10);
        assert_eq!(
            result.path,
            vec![Vec2::new(2, 2), Vec2::new(3, 2), Vec2::new(4, 2)]
        );
        assert_eq!(result.first_step(), Vec2::new(3, 2));
    }

    #[test]
    fn walls_are_never_targets_and_block_expansion() {
        let grid = Grid::from_rows(&["#####", "# # #", "#####"]).expect("grid should load");
        let rewards = rewards_for(&grid, &[(Vec2::new(3, 1), 50), (Vec2::new(2, 1), 99)]);
        let result = find_best_target(&grid, &rewards, Vec2::new(1, 1));
        assert_eq!(result.target, Vec2::new(1, 1));
        assert_eq!(result.score, 0);
        // origin plus the four walls around it
        assert_eq!(result.visited, 5);
    }

    #[test]
    fn path_reward_accumulates_along_a_corridor() {
        let grid = Grid::from_rows(&["#######", "#     #", "#######"]).expect("grid should load");
        let rewards = rewards_for(
            &grid,
            &[
                (Vec2::new(2, 1), 1),
                (Vec2::new(3, 1), 2),
                (Vec2::new(4, 1), 3),
                (Vec2::new(5, 1), 1),
            ],
        );
        let result = find_best_target(&grid, &rewards, Vec2::new(1, 1));
        assert_eq!(result.target, Vec2::new(5, 1));
        assert_eq!(result.score, 7);
        assert_eq!(result.path.len(), 5);
    }

    #[test]
    fn equal_scores_resolve_to_the_first_cell_in_row_major_order() {
        let grid = Grid::from_rows(&["#####", "#   #", "#   #", "#   #", "#####"])
            .expect("grid should load");
        let rewards = rewards_for(&grid, &[(Vec2::new(2, 3), 4), (Vec2::new(3, 2), 4)]);
        let result = find_best_target(&grid, &rewards, Vec2::new(2, 2));
        assert_eq!(result.target, Vec2::new(3, 2));
        assert_eq!(result.score, 4);
    }

    #[test]
    fn search_wraps_across_the_edge() {
        let grid = Grid::from_rows(&["#####", "  #  ", "#####"]).expect("grid should load");
        let rewards = rewards_for(&grid, &[(Vec2::new(3, 1), 5)]);
        let result = find_best_target(&grid, &rewards, Vec2::new(1, 1));
        assert_eq!(result.target, Vec2::new(3, 1));
        assert_eq!(
            result.path,
            vec![
                Vec2::new(1, 1),
                Vec2::new(0, 1),
                Vec2::new(4, 1),
                Vec2::new(3, 1)
            ]
        );
    }

    #[test]
    fn search_does_not_mutate_the_shared_map() {
        let grid = open_grid(4, 4);
        let rewards = rewards_for(&grid, &[(Vec2::new(1, 1), 3)]);
        let before = rewards.clone();
        let _ = find_best_target(&grid, &rewards, Vec2::new(0, 0));
        assert_eq!(rewards, before);
    }

    #[test]
    fn claimed_cells_read_as_zero() {
        let grid = open_grid(3, 3);
        let mut rewards = rewards_for(&grid, &[(Vec2::new(2, 2), 9), (Vec2::new(1, 1), 2)]);
        rewards.claim_path(&[Vec2::new(2, 2)]);
        assert_eq!(rewards.get(Vec2::new(2, 2)), 0);
        let result = find_best_target(&grid, &rewards, Vec2::new(0, 0));
        assert_eq!(result.target, Vec2::new(1, 1));
    }

    #[test]
    fn scores_are_never_negative() {
        let grid = open_grid(5, 3);
        let rewards = RewardMap::from_values(5, 3, vec![-4; 15]);
        let result = find_best_target(&grid, &rewards, Vec2::new(0, 0));
        assert!(result.score >= 0);
        assert_eq!(result.target, Vec2::new(0, 0));
    }

    #[test]
    fn smaller_reward_map_than_grid_does_not_panic() {
        let grid = open_grid(6, 4);
        let rewards = RewardMap::from_values(3, 2, vec![0, 0, 5, 0, 0, 0]);
        let result = find_best_target(&grid, &rewards, Vec2::new(5, 3));
        assert_eq!(result.target, Vec2::new(2, 0));
        assert_eq!(result.score, 5);
        assert_eq!(result.visited, 24);
    }
}
