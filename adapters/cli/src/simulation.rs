//! Seeds a grid from a scenario and drives the wander system over it.

use anyhow::{Context, Result};
use cellgrid_core::{AgentId, Command, Event, GridError, Placement};
use cellgrid_space::{self as space, Grid};
use cellgrid_system_wander::{Config, Wander};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::scenario::Scenario;

/// Aggregated counters describing what happened during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunReport {
    pub(crate) placed: u32,
    pub(crate) moves: u32,
    pub(crate) evictions: u32,
    pub(crate) rejections: u32,
}

impl RunReport {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::AgentPlaced { .. } => self.placed += 1,
                Event::AgentMoved { .. } => self.moves += 1,
                Event::AgentEvicted { .. } => self.evictions += 1,
                Event::AgentRemoved { .. } | Event::AgentsSwapped { .. } => {}
            }
        }
    }
}

/// Final grid together with the counters gathered while producing it.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) grid: Grid,
    pub(crate) report: RunReport,
}

/// Runs the scenario to completion.
pub(crate) fn run(scenario: &Scenario) -> Result<Outcome> {
    let mut grid = Grid::new(scenario.grid).context("scenario describes an invalid grid")?;
    let mut rng = ChaCha8Rng::seed_from_u64(scenario.seed);
    let mut report = RunReport::default();
    let mut events = Vec::new();

    for id in 0..scenario.agents {
        let command = Command::PositionAgent {
            agent: AgentId::new(id),
            placement: Placement::Random,
        };
        match space::apply(&mut grid, command, &mut rng, &mut events) {
            Ok(()) => {}
            Err(GridError::GridFull) => {
                warn!(
                    requested = scenario.agents,
                    placed = id,
                    "grid filled before every agent was seeded"
                );
                break;
            }
            Err(error) => return Err(error).context("failed to seed agents"),
        }
    }
    report.record(&events);

    let settings = scenario.wander;
    let mut wander = Wander::new(Config::new(
        settings.shape,
        settings.radius,
        settings.jump_probability,
        scenario.seed,
    ));
    let mut commands = Vec::new();

    for step in 0..scenario.steps {
        events.clear();
        commands.clear();
        wander.handle(&grid, &mut commands);

        for command in commands.drain(..) {
            if let Err(error) = space::apply(&mut grid, command, &mut rng, &mut events) {
                debug!(step, %error, ?command, "command rejected");
                report.rejections += 1;
            }
        }
        report.record(&events);
    }

    Ok(Outcome { grid, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_core::{GridConfig, OccupancyPolicy};

    fn scenario(policy: OccupancyPolicy, agents: u32) -> Scenario {
        Scenario {
            grid: GridConfig::new(6, 4, true, policy),
            agents,
            steps: 8,
            seed: 42,
            ..Scenario::default()
        }
    }

    #[test]
    fn identical_scenarios_produce_identical_grids() {
        let first = run(&scenario(OccupancyPolicy::Exclusive, 10)).expect("run succeeds");
        let second = run(&scenario(OccupancyPolicy::Exclusive, 10)).expect("run succeeds");

        assert_eq!(first.report, second.report);
        assert_eq!(
            first.grid.placed_agents().collect::<Vec<_>>(),
            second.grid.placed_agents().collect::<Vec<_>>()
        );
    }

    #[test]
    fn seeding_stops_when_exclusive_grid_is_full() {
        let outcome = run(&scenario(OccupancyPolicy::Exclusive, 40)).expect("run succeeds");

        assert_eq!(outcome.report.placed, 24);
        assert_eq!(outcome.grid.agent_count(), 24);
        assert_eq!(outcome.grid.empty_count(), 0);
        assert_eq!(outcome.report.moves, 0);
    }

    #[test]
    fn multi_grid_moves_every_agent() {
        let outcome = run(&Scenario {
            wander: crate::scenario::WanderSettings {
                jump_probability: 0.0,
                ..Default::default()
            },
            ..scenario(OccupancyPolicy::Multi, 5)
        })
        .expect("run succeeds");

        assert_eq!(outcome.report.placed, 5);
        assert_eq!(outcome.report.moves, 5 * 8);
        assert_eq!(outcome.report.rejections, 0);
    }

    #[test]
    fn invalid_grid_is_reported() {
        let mut invalid = scenario(OccupancyPolicy::Multi, 1);
        invalid.grid.width = 0;

        let error = run(&invalid).expect_err("zero width grid");
        assert!(format!("{error:#}").contains("invalid grid"));
    }
}
