#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic random-walk system that emits agent movement commands.

use cellgrid_core::{CellCoord, Command, NeighborhoodShape};
use cellgrid_space::Grid;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Configuration parameters required to construct the wander system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    shape: NeighborhoodShape,
    radius: u32,
    jump_probability: f64,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `jump_probability` is the chance that an agent teleports to a random
    /// empty cell instead of stepping into its neighborhood; it is clamped to
    /// `[0, 1]` and treated as zero when not a number.
    #[must_use]
    pub fn new(
        shape: NeighborhoodShape,
        radius: u32,
        jump_probability: f64,
        rng_seed: u64,
    ) -> Self {
        let jump_probability = if jump_probability.is_nan() {
            0.0
        } else {
            jump_probability.clamp(0.0, 1.0)
        };

        Self {
            shape,
            radius,
            jump_probability,
            rng_seed,
        }
    }
}

/// Pure system that proposes one move per placed agent each step.
#[derive(Debug)]
pub struct Wander {
    config: Config,
    rng: ChaCha8Rng,
}

impl Wander {
    /// Creates a new wander system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Reads the grid and emits movement commands in ascending agent order.
    ///
    /// Under single-occupancy policies only empty neighbor cells are
    /// proposed. Commands are computed against the grid as passed in, so a
    /// destination may be taken by an earlier command in the same batch; the
    /// driver decides what to do with the resulting rejection.
    pub fn handle(&mut self, grid: &Grid, out: &mut Vec<Command>) {
        let single = grid.policy().is_single();

        for (agent, cell) in grid.placed_agents() {
            if self.rng.gen_bool(self.config.jump_probability) {
                if grid.empty_count() > 0 {
                    out.push(Command::MoveToEmpty { agent });
                }
                continue;
            }

            let Ok(neighborhood) =
                grid.neighborhood(cell, self.config.shape, false, self.config.radius)
            else {
                continue;
            };

            let candidates: Vec<CellCoord> = neighborhood
                .iter()
                .copied()
                .filter(|candidate| !single || grid.is_empty(*candidate))
                .collect();

            match candidates.choose(&mut self.rng) {
                Some(destination) => out.push(Command::MoveAgent {
                    agent,
                    destination: (*destination).into(),
                }),
                None => trace!(%agent, %cell, "no free neighbor"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_core::{AgentId, GridConfig, OccupancyPolicy};

    fn filled_grid(policy: OccupancyPolicy) -> Grid {
        let mut grid = Grid::new(GridConfig::new(2, 2, false, policy)).expect("valid grid");
        for (index, cell) in grid.all_cells().into_iter().enumerate() {
            let _ = grid
                .place_agent(AgentId::new(index as u32), cell)
                .expect("fill grid");
        }
        grid
    }

    #[test]
    fn config_clamps_jump_probability() {
        let config = Config::new(NeighborhoodShape::Moore, 1, 3.5, 0);
        assert_eq!(config.jump_probability, 1.0);

        let config = Config::new(NeighborhoodShape::Moore, 1, f64::NAN, 0);
        assert_eq!(config.jump_probability, 0.0);
    }

    #[test]
    fn crowded_exclusive_grid_emits_nothing() {
        let grid = filled_grid(OccupancyPolicy::Exclusive);
        let mut wander = Wander::new(Config::new(NeighborhoodShape::Moore, 1, 0.0, 7));
        let mut commands = Vec::new();

        wander.handle(&grid, &mut commands);

        assert!(commands.is_empty());
    }

    #[test]
    fn multi_grid_steps_into_occupied_neighbors() {
        let grid = filled_grid(OccupancyPolicy::Multi);
        let mut wander = Wander::new(Config::new(NeighborhoodShape::VonNeumann, 1, 0.0, 7));
        let mut commands = Vec::new();

        wander.handle(&grid, &mut commands);

        assert_eq!(commands.len(), 4);
        for command in commands {
            match command {
                Command::MoveAgent { agent, destination } => {
                    let origin = grid.position(agent).expect("agent placed");
                    let target = grid.wrap(destination).expect("destination on grid");
                    let distance =
                        origin.x().abs_diff(target.x()) + origin.y().abs_diff(target.y());
                    assert_eq!(distance, 1);
                }
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
    }
}
