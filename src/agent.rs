use std::io;

use crate::belief::BeliefGrid;
use crate::grid::{invalid_data, Grid};
use crate::planner::{plan_turn, TurnPlan};
use crate::types::{TurnObservation, Vec2};

/// Long-lived decision state. The wall layout is fixed after startup and the belief
/// grid is the only thing carried from one turn to the next.
#[derive(Clone, Debug)]
pub struct Agent {
    grid: Grid,
    belief: BeliefGrid,
    turn: u64,
}

impl Agent {
    pub fn new(grid: Grid) -> Self {
        let belief = BeliefGrid::new(&grid);
        Self {
            grid,
            belief,
            turn: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn belief(&self) -> &BeliefGrid {
        &self.belief
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Refreshes the observed layer, folds the new sightlines into the belief grid
    /// and plans every friendly unit. A unit or item on a wall means the input is
    /// out of sync with the startup grid, and the turn is rejected untouched.
    pub fn play_turn(&mut self, observation: &TurnObservation) -> io::Result<TurnPlan> {
        self.validate(observation)?;

        self.grid.reset_observed_layer();
        for unit in &observation.units {
            self.grid.place_unit(unit.pos, unit.team);
        }
        for item in &observation.items {
            self.grid.place_item(item.pos, item.tier());
        }

        let origins: Vec<Vec2> = observation.my_units().map(|unit| unit.pos).collect();
        self.belief.observe(&self.grid, &origins);
        self.turn += 1;

        Ok(plan_turn(&self.grid, &self.belief, &observation.units))
    }

    fn validate(&self, observation: &TurnObservation) -> io::Result<()> {
        for unit in &observation.units {
            self.check_floor(unit.pos, &format!("pac {} ({:?})", unit.id, unit.team))?;
        }
        for item in &observation.items {
            self.check_floor(item.pos, "pellet")?;
        }
        Ok(())
    }

    fn check_floor(&self, pos: Vec2, what: &str) -> io::Result<()> {
        if !self.grid.contains(pos) {
            return Err(invalid_data(format!(
                "{what} at {pos} is outside the {}x{} grid",
                self.grid.width(),
                self.grid.height()
            )));
        }
        if self.grid.is_wall(pos) {
            return Err(invalid_data(format!("{what} reported on wall cell {pos}")));
        }
        Ok(())
    }
}
