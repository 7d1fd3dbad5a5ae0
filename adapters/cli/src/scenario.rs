//! Scenario files describing a seeded simulation run.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use cellgrid_core::{GridConfig, NeighborhoodShape, OccupancyPolicy};
use serde::Deserialize;

/// Complete description of a run: grid, population, duration and behaviour.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) grid: GridConfig,
    #[serde(default = "default_agents")]
    pub(crate) agents: u32,
    #[serde(default = "default_steps")]
    pub(crate) steps: u32,
    #[serde(default)]
    pub(crate) seed: u64,
    #[serde(default)]
    pub(crate) wander: WanderSettings,
}

/// Tuning for the random-walk behaviour driven by the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WanderSettings {
    pub(crate) shape: NeighborhoodShape,
    pub(crate) radius: u32,
    pub(crate) jump_probability: f64,
}

impl Default for WanderSettings {
    fn default() -> Self {
        Self {
            shape: NeighborhoodShape::Moore,
            radius: 1,
            jump_probability: 0.05,
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            grid: GridConfig::new(24, 12, true, OccupancyPolicy::Exclusive),
            agents: default_agents(),
            steps: default_steps(),
            seed: 0,
            wander: WanderSettings::default(),
        }
    }
}

impl Scenario {
    /// Loads a scenario from the TOML file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario in {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }
}

fn default_agents() -> u32 {
    40
}

fn default_steps() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_scenario() {
        let scenario = Scenario::parse(
            r#"
            agents = 12
            steps = 3
            seed = 99

            [grid]
            width = 8
            height = 5
            torus = true
            policy = "evicting"

            [wander]
            shape = "von_neumann"
            radius = 2
            jump_probability = 0.5
            "#,
        )
        .expect("scenario parses");

        assert_eq!(
            scenario.grid,
            GridConfig::new(8, 5, true, OccupancyPolicy::Evicting)
        );
        assert_eq!(scenario.agents, 12);
        assert_eq!(scenario.steps, 3);
        assert_eq!(scenario.seed, 99);
        assert_eq!(scenario.wander.shape, NeighborhoodShape::VonNeumann);
        assert_eq!(scenario.wander.radius, 2);
    }

    #[test]
    fn omitted_fields_fall_back_to_defaults() {
        let scenario = Scenario::parse(
            r#"
            [grid]
            width = 4
            height = 4
            "#,
        )
        .expect("scenario parses");

        assert_eq!(
            scenario.grid,
            GridConfig::new(4, 4, false, OccupancyPolicy::Multi)
        );
        assert_eq!(scenario.agents, default_agents());
        assert_eq!(scenario.steps, default_steps());
        assert_eq!(scenario.wander, WanderSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = Scenario::parse(
            r#"
            agentz = 3

            [grid]
            width = 4
            height = 4
            "#,
        )
        .expect_err("typo must be reported");

        assert!(format!("{error:#}").contains("agentz"));
    }
}
