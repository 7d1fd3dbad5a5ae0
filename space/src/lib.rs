#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative occupancy state for discrete agent simulations.
//!
//! [`Grid`] owns which agents sit in which cells, the recorded position of
//! every placed agent, the set of empty cells and a cache of neighborhoods.
//! All mutation goes through the placement protocol on [`Grid`] or through
//! [`apply`], so the three structures can never disagree once a call returns.

use std::sync::Arc;

use cellgrid_core::{
    AgentId, CellCoord, Command, Event, GridConfig, GridError, GridPoint, NeighborhoodShape,
    OccupancyPolicy, Placement, Topology, TraversalOrder,
};
use rand::Rng;

mod empties;
mod neighborhood;
mod occupancy;

use neighborhood::{NeighborhoodCache, NeighborhoodKey};
use occupancy::OccupancyStore;

/// Outcome of an agent entering a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arrival {
    /// Cell the agent now occupies.
    pub cell: CellCoord,
    /// Previous occupant displaced under the evicting policy, if any.
    pub evicted: Option<AgentId>,
}

/// Outcome of a placed agent changing cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// Cell the agent occupied before moving.
    pub from: CellCoord,
    /// Cell the agent occupies after moving.
    pub to: CellCoord,
    /// Previous occupant of `to` displaced under the evicting policy, if any.
    pub evicted: Option<AgentId>,
}

/// Two-dimensional grid tracking agent occupancy.
///
/// The grid is single-threaded: neighborhood queries take `&self` and fill the
/// cache through interior mutability, so the type is `Send` but not `Sync`. A
/// grid may move between threads but is never shared by them.
#[derive(Clone, Debug)]
pub struct Grid {
    topology: Topology,
    store: OccupancyStore,
    neighborhoods: NeighborhoodCache,
}

impl Grid {
    /// Creates an empty grid with the provided dimensions and policy.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        let topology = config.topology()?;
        Ok(Self {
            store: OccupancyStore::new(topology, config.policy),
            neighborhoods: NeighborhoodCache::default(),
            topology,
        })
    }

    /// Fixed dimensions and wraparound behaviour of the grid.
    #[must_use]
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Occupancy rule applied to every cell.
    #[must_use]
    pub fn policy(&self) -> OccupancyPolicy {
        self.store.policy()
    }

    /// Reports whether the point lies outside the grid.
    #[must_use]
    pub fn out_of_bounds(&self, point: impl Into<GridPoint>) -> bool {
        self.topology.out_of_bounds(point.into())
    }

    /// Resolves a raw point to its canonical cell, wrapping on a torus.
    pub fn wrap(&self, point: impl Into<GridPoint>) -> Result<CellCoord, GridError> {
        self.topology.wrap(point.into())
    }

    /// Places an unplaced agent at a canonical cell.
    ///
    /// Fails with [`GridError::CellOccupied`] under the exclusive policy when
    /// the cell already holds an agent; under the evicting policy the
    /// occupant is removed from the grid and reported in the [`Arrival`].
    pub fn place_agent(&mut self, agent: AgentId, cell: CellCoord) -> Result<Arrival, GridError> {
        let evicted = self.store.place(agent, cell)?;
        Ok(Arrival { cell, evicted })
    }

    /// Places an unplaced agent at an explicit cell or a random empty one.
    ///
    /// Intended for the initial placement of each agent. Random placement
    /// draws from the sorted empty cells using `rng` and fails with
    /// [`GridError::GridFull`] when none remain.
    pub fn position_agent<R>(
        &mut self,
        agent: AgentId,
        placement: Placement,
        rng: &mut R,
    ) -> Result<Arrival, GridError>
    where
        R: Rng + ?Sized,
    {
        let cell = match placement {
            Placement::At(cell) => cell,
            Placement::Random => self
                .store
                .empties()
                .pick(rng)
                .ok_or(GridError::GridFull)?,
        };
        self.place_agent(agent, cell)
    }

    /// Removes a placed agent from the grid, returning the cell it vacated.
    pub fn remove_agent(&mut self, agent: AgentId) -> Result<CellCoord, GridError> {
        self.store.remove(agent)
    }

    /// Moves a placed agent to the cell resolved from `destination`.
    ///
    /// The destination is wrapped and checked against the occupancy policy
    /// before the agent leaves its current cell, so a failed move leaves the
    /// grid exactly as it was.
    pub fn move_agent(
        &mut self,
        agent: AgentId,
        destination: impl Into<GridPoint>,
    ) -> Result<Relocation, GridError> {
        let to = self.topology.wrap(destination.into())?;
        let from = self
            .store
            .position(agent)
            .ok_or(GridError::NotPlaced { agent })?;
        self.store.ensure_can_enter(agent, to)?;

        let _ = self.store.remove(agent)?;
        let evicted = self.store.place(agent, to)?;
        Ok(Relocation { from, to, evicted })
    }

    /// Moves a placed agent to a random empty cell.
    ///
    /// Fails with [`GridError::GridFull`] before any mutation when no cell is
    /// empty. Otherwise the agent leaves its cell first and the destination is
    /// drawn afterwards, so a cell the agent just vacated may be chosen again.
    pub fn move_to_empty<R>(&mut self, agent: AgentId, rng: &mut R) -> Result<Relocation, GridError>
    where
        R: Rng + ?Sized,
    {
        if self.store.position(agent).is_none() {
            return Err(GridError::NotPlaced { agent });
        }
        if self.store.empties().is_empty() {
            return Err(GridError::GridFull);
        }

        let from = self.store.remove(agent)?;
        let to = self
            .store
            .empties()
            .pick(rng)
            .ok_or(GridError::GridFull)?;
        let evicted = self.store.place(agent, to)?;
        Ok(Relocation { from, to, evicted })
    }

    /// Exchanges the cells of two placed agents.
    ///
    /// Occupant counts are unchanged, so swapping is legal under every policy.
    pub fn swap_agents(&mut self, first: AgentId, second: AgentId) -> Result<(), GridError> {
        self.store.swap(first, second)
    }

    /// Cells within `radius` of `center`, sorted ascending by `(x, y)`.
    ///
    /// Off-grid cells wrap on a torus and are dropped otherwise; duplicates
    /// produced by wrapping appear once. Results are cached for the lifetime
    /// of the grid and shared between callers.
    pub fn neighborhood(
        &self,
        center: CellCoord,
        shape: NeighborhoodShape,
        include_center: bool,
        radius: u32,
    ) -> Result<Arc<[CellCoord]>, GridError> {
        if !self.topology.contains(center) {
            return Err(GridError::OutOfBounds {
                x: i64::from(center.x()),
                y: i64::from(center.y()),
            });
        }

        let key = NeighborhoodKey {
            center,
            shape,
            include_center,
            radius,
        };
        Ok(self.neighborhoods.resolve(&self.topology, key))
    }

    /// Agents occupying the neighborhood of `center`.
    ///
    /// Agents are listed cell by cell in neighborhood order and, within a
    /// cell, in insertion order.
    pub fn neighbors(
        &self,
        center: CellCoord,
        shape: NeighborhoodShape,
        include_center: bool,
        radius: u32,
    ) -> Result<Vec<AgentId>, GridError> {
        let cells = self.neighborhood(center, shape, include_center, radius)?;
        self.contents_of(cells.iter().copied())
    }

    /// Agents in a single cell, in insertion order.
    ///
    /// Under the single-occupancy policies the slice holds at most one agent.
    pub fn contents(&self, cell: CellCoord) -> Result<&[AgentId], GridError> {
        self.store.contents(cell)
    }

    /// First agent in the cell, the sole occupant under single-occupancy policies.
    pub fn occupant(&self, cell: CellCoord) -> Result<Option<AgentId>, GridError> {
        Ok(self.store.contents(cell)?.first().copied())
    }

    /// Agents in the provided cells, concatenated in the order given.
    ///
    /// Empty cells are skipped.
    pub fn contents_of<I>(&self, cells: I) -> Result<Vec<AgentId>, GridError>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut agents = Vec::new();
        for cell in cells {
            if self.is_empty(cell) {
                continue;
            }
            agents.extend_from_slice(self.store.contents(cell)?);
        }
        Ok(agents)
    }

    /// Reports whether the cell exists and holds no agents.
    #[must_use]
    pub fn is_empty(&self, cell: CellCoord) -> bool {
        self.store.empties().contains(cell)
    }

    /// Empty cells sorted ascending by `(x, y)`.
    #[must_use]
    pub fn empties(&self) -> Vec<CellCoord> {
        self.store.empties().iter().collect()
    }

    /// Number of empty cells.
    #[must_use]
    pub fn empty_count(&self) -> usize {
        self.store.empties().len()
    }

    /// Every cell of the grid sorted ascending by `(x, y)`.
    #[must_use]
    pub fn all_cells(&self) -> Vec<CellCoord> {
        self.cells(TraversalOrder::ColumnMajor)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Recorded cell of the agent, or `None` when it is not placed.
    #[must_use]
    pub fn position(&self, agent: AgentId) -> Option<CellCoord> {
        self.store.position(agent)
    }

    /// Number of agents currently placed on the grid.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.store.agent_count()
    }

    /// Placed agents and their cells in ascending identifier order.
    pub fn placed_agents(&self) -> impl Iterator<Item = (AgentId, CellCoord)> + '_ {
        self.store.placed()
    }

    /// Visits every cell exactly once with its contents.
    ///
    /// Each call starts a fresh pass.
    pub fn cells(
        &self,
        order: TraversalOrder,
    ) -> impl Iterator<Item = (CellCoord, &[AgentId])> + '_ {
        self.store.traverse(order)
    }

    /// Number of neighborhoods memoized so far.
    #[must_use]
    pub fn cached_neighborhoods(&self) -> usize {
        self.neighborhoods.len()
    }
}

/// Applies the provided command to the grid, reporting every resulting change.
///
/// Nothing is pushed to `out_events` when the command fails.
pub fn apply<R>(
    grid: &mut Grid,
    command: Command,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> Result<(), GridError>
where
    R: Rng + ?Sized,
{
    match command {
        Command::PlaceAgent { agent, cell } => {
            let arrival = grid.place_agent(agent, cell)?;
            push_arrival(agent, arrival, out_events);
        }
        Command::PositionAgent { agent, placement } => {
            let arrival = grid.position_agent(agent, placement, rng)?;
            push_arrival(agent, arrival, out_events);
        }
        Command::MoveAgent { agent, destination } => {
            let relocation = grid.move_agent(agent, destination)?;
            push_relocation(agent, relocation, out_events);
        }
        Command::RemoveAgent { agent } => {
            let from = grid.remove_agent(agent)?;
            out_events.push(Event::AgentRemoved { agent, from });
        }
        Command::MoveToEmpty { agent } => {
            let relocation = grid.move_to_empty(agent, rng)?;
            push_relocation(agent, relocation, out_events);
        }
        Command::SwapAgents { first, second } => {
            grid.swap_agents(first, second)?;
            out_events.push(Event::AgentsSwapped { first, second });
        }
    }

    Ok(())
}

fn push_arrival(agent: AgentId, arrival: Arrival, out_events: &mut Vec<Event>) {
    if let Some(evicted) = arrival.evicted {
        out_events.push(Event::AgentEvicted {
            agent: evicted,
            from: arrival.cell,
        });
    }
    out_events.push(Event::AgentPlaced {
        agent,
        cell: arrival.cell,
    });
}

fn push_relocation(agent: AgentId, relocation: Relocation, out_events: &mut Vec<Event>) {
    if let Some(evicted) = relocation.evicted {
        out_events.push(Event::AgentEvicted {
            agent: evicted,
            from: relocation.to,
        });
    }
    out_events.push(Event::AgentMoved {
        agent,
        from: relocation.from,
        to: relocation.to,
    });
}

/// Query functions that provide read-only access to the grid state.
pub mod query {
    use cellgrid_core::{AgentId, CellCoord, OccupancyPolicy, TraversalOrder};
    use serde::Serialize;

    use super::Grid;

    /// Exposes a read-only view of per-cell occupancy.
    #[must_use]
    pub fn occupancy_view(grid: &Grid) -> OccupancyView<'_> {
        OccupancyView { grid }
    }

    /// Captures a serializable snapshot of the grid and its placed agents.
    #[must_use]
    pub fn snapshot(grid: &Grid) -> GridSnapshot {
        let topology = grid.topology();
        GridSnapshot {
            width: topology.width(),
            height: topology.height(),
            torus: topology.is_torus(),
            policy: grid.policy(),
            agents: grid
                .placed_agents()
                .map(|(agent, cell)| AgentSnapshot { agent, cell })
                .collect(),
        }
    }

    /// Read-only view into the occupancy of each cell.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        grid: &'a Grid,
    }

    impl<'a> OccupancyView<'a> {
        /// Number of agents in the cell; zero for cells outside the grid.
        #[must_use]
        pub fn occupancy(&self, cell: CellCoord) -> usize {
            self.grid.contents(cell).map_or(0, <[AgentId]>::len)
        }

        /// Returns the first agent occupying the cell, if any.
        #[must_use]
        pub fn occupant(&self, cell: CellCoord) -> Option<AgentId> {
            self.grid.occupant(cell).ok().flatten()
        }

        /// Reports whether the cell is currently empty.
        #[must_use]
        pub fn is_free(&self, cell: CellCoord) -> bool {
            self.grid.is_empty(cell)
        }

        /// Returns an iterator over agent counts in row-major order.
        pub fn iter(&self) -> impl Iterator<Item = usize> + 'a {
            self.grid
                .cells(TraversalOrder::RowMajor)
                .map(|(_, agents)| agents.len())
        }

        /// Provides the dimensions of the underlying grid.
        #[must_use]
        pub fn dimensions(&self) -> (u32, u32) {
            let topology = self.grid.topology();
            (topology.width(), topology.height())
        }
    }

    /// Serializable description of the grid for external renderers.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct GridSnapshot {
        /// Number of columns in the grid.
        pub width: u32,
        /// Number of rows in the grid.
        pub height: u32,
        /// Whether opposite edges wrap onto each other.
        pub torus: bool,
        /// Occupancy rule applied to every cell.
        pub policy: OccupancyPolicy,
        /// Placed agents in ascending identifier order.
        pub agents: Vec<AgentSnapshot>,
    }

    /// Position of a single placed agent.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub struct AgentSnapshot {
        /// Identifier of the agent.
        pub agent: AgentId,
        /// Cell the agent occupies.
        pub cell: CellCoord,
    }
}
