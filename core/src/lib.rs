#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the cellgrid workspace.
//!
//! This crate defines the value types that describe a discrete two-dimensional
//! space, the coordinate math that resolves raw points against a fixed
//! [`Topology`], and the message surface used to drive the authoritative grid.
//! Schedulers submit [`Command`] values describing desired placements, the grid
//! executes them via its `apply` entry point, and then reports [`Event`] values
//! so models can observe every change, including implicit evictions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier assigned to an agent by the owning model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent #{}", self.0)
    }
}

/// Canonical location of a grid cell.
///
/// Ordering is x-major so sorted collections of coordinates walk the grid
/// column by column, which keeps neighborhood and empty-cell listings stable
/// across runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based horizontal index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based vertical index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Raw, possibly off-grid position expressed with signed components.
///
/// Points are what callers and offset arithmetic produce; only
/// [`Topology::wrap`] turns them into a [`CellCoord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    x: i64,
    y: i64,
}

impl GridPoint {
    /// Creates a new raw point.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the point.
    #[must_use]
    pub const fn x(&self) -> i64 {
        self.x
    }

    /// Vertical component of the point.
    #[must_use]
    pub const fn y(&self) -> i64 {
        self.y
    }

    /// Returns the point displaced by the provided offset.
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<CellCoord> for GridPoint {
    fn from(cell: CellCoord) -> Self {
        Self::new(i64::from(cell.x()), i64::from(cell.y()))
    }
}

/// Fixed dimensions and edge behaviour of a grid.
///
/// A topology is validated once at construction and never changes, which is
/// what allows neighborhood results to be cached for the grid's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topology {
    width: u32,
    height: u32,
    torus: bool,
}

impl Topology {
    /// Creates a topology, rejecting grids without any cells.
    pub fn new(width: u32, height: u32, torus: bool) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }

        Ok(Self {
            width,
            height,
            torus,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether opposite edges wrap onto each other.
    #[must_use]
    pub const fn is_torus(&self) -> bool {
        self.torus
    }

    /// Total number of cells covered by the topology.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.width) * u64::from(self.height);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether the point lies outside `[0, width) x [0, height)`.
    #[must_use]
    pub fn out_of_bounds(&self, point: GridPoint) -> bool {
        point.x() < 0
            || point.y() < 0
            || point.x() >= i64::from(self.width)
            || point.y() >= i64::from(self.height)
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }

    /// Resolves a raw point to its canonical cell.
    ///
    /// In-bounds points are returned unchanged. Off-grid points wrap with a
    /// Euclidean modulo on a torus, so `-1` maps to `width - 1`, and are
    /// rejected with [`GridError::OutOfBounds`] otherwise.
    pub fn wrap(&self, point: GridPoint) -> Result<CellCoord, GridError> {
        if !self.out_of_bounds(point) {
            return Ok(canonical(point.x(), point.y()));
        }

        if !self.torus {
            return Err(GridError::OutOfBounds {
                x: point.x(),
                y: point.y(),
            });
        }

        let x = point.x().rem_euclid(i64::from(self.width));
        let y = point.y().rem_euclid(i64::from(self.height));
        Ok(canonical(x, y))
    }

    /// Row-major storage index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn canonical(x: i64, y: i64) -> CellCoord {
    // Callers only pass components already reduced into [0, u32::MAX].
    CellCoord::new(x as u32, y as u32)
}

/// Shape of the area enumerated around a center cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodShape {
    /// Every cell within Chebyshev distance `radius`, diagonals included.
    Moore,
    /// Every cell within Manhattan distance `radius`, diagonals excluded.
    VonNeumann,
    /// Cells within `radius` hex steps using odd-q column offsets.
    Hexagonal,
}

/// Rule governing how many agents a cell may hold and what happens on collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyPolicy {
    /// Cells hold any number of agents in insertion order.
    #[default]
    Multi,
    /// Cells hold at most one agent; placing into an occupied cell fails.
    Exclusive,
    /// Cells hold at most one agent; placing into an occupied cell evicts the occupant.
    Evicting,
}

impl OccupancyPolicy {
    /// Reports whether the policy limits each cell to a single agent.
    #[must_use]
    pub const fn is_single(self) -> bool {
        matches!(self, Self::Exclusive | Self::Evicting)
    }
}

/// Construction parameters for a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of columns laid out in the grid.
    pub width: u32,
    /// Number of rows laid out in the grid.
    pub height: u32,
    /// Whether opposite edges wrap onto each other.
    #[serde(default)]
    pub torus: bool,
    /// Occupancy rule applied to every cell.
    #[serde(default)]
    pub policy: OccupancyPolicy,
}

impl GridConfig {
    /// Creates a new grid configuration.
    #[must_use]
    pub const fn new(width: u32, height: u32, torus: bool, policy: OccupancyPolicy) -> Self {
        Self {
            width,
            height,
            torus,
            policy,
        }
    }

    /// Validates the dimensions and produces the fixed topology.
    pub fn topology(&self) -> Result<Topology, GridError> {
        Topology::new(self.width, self.height, self.torus)
    }
}

/// Destination requested when an agent first enters the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Place the agent at the provided cell.
    At(CellCoord),
    /// Place the agent at an empty cell drawn from the caller's random source.
    Random,
}

/// Order in which a full traversal visits the grid's cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Rows outer, columns inner: `(0, 0), (1, 0), ..., (0, 1), ...`.
    #[default]
    RowMajor,
    /// Columns outer, rows inner: `(0, 0), (0, 1), ..., (1, 0), ...`.
    ColumnMajor,
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Places an unplaced agent at a canonical cell.
    PlaceAgent {
        /// Agent entering the grid.
        agent: AgentId,
        /// Cell the agent should occupy.
        cell: CellCoord,
    },
    /// Places an unplaced agent at an explicit or random cell.
    PositionAgent {
        /// Agent entering the grid.
        agent: AgentId,
        /// Requested destination.
        placement: Placement,
    },
    /// Moves a placed agent to the cell resolved from a raw point.
    MoveAgent {
        /// Agent being moved.
        agent: AgentId,
        /// Destination prior to wraparound resolution.
        destination: GridPoint,
    },
    /// Removes a placed agent from the grid.
    RemoveAgent {
        /// Agent leaving the grid.
        agent: AgentId,
    },
    /// Moves a placed agent to a random empty cell.
    MoveToEmpty {
        /// Agent being relocated.
        agent: AgentId,
    },
    /// Exchanges the cells of two placed agents.
    SwapAgents {
        /// First agent of the pair.
        first: AgentId,
        /// Second agent of the pair.
        second: AgentId,
    },
}

/// Events reported by the grid after successfully applying a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that an agent entered the grid.
    AgentPlaced {
        /// Agent that was placed.
        agent: AgentId,
        /// Cell the agent now occupies.
        cell: CellCoord,
    },
    /// Confirms that an agent moved between two cells.
    AgentMoved {
        /// Agent that moved.
        agent: AgentId,
        /// Cell the agent occupied before moving.
        from: CellCoord,
        /// Cell the agent occupies after moving.
        to: CellCoord,
    },
    /// Confirms that an agent left the grid on request.
    AgentRemoved {
        /// Agent that was removed.
        agent: AgentId,
        /// Cell the agent occupied before removal.
        from: CellCoord,
    },
    /// Reports that an agent was displaced by an arrival under the evicting policy.
    AgentEvicted {
        /// Agent that lost its cell and is now unplaced.
        agent: AgentId,
        /// Cell the agent occupied before eviction.
        from: CellCoord,
    },
    /// Confirms that two agents exchanged cells.
    AgentsSwapped {
        /// First agent of the pair.
        first: AgentId,
        /// Second agent of the pair.
        second: AgentId,
    },
}

/// Failures surfaced by grid operations.
///
/// Every variant describes a caller error detected before the grid was
/// mutated; none of them is transient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The point lies outside a grid whose edges do not wrap.
    #[error("point ({x}, {y}) is out of bounds on a non-toroidal grid")]
    OutOfBounds {
        /// Horizontal component of the rejected point.
        x: i64,
        /// Vertical component of the rejected point.
        y: i64,
    },
    /// The exclusive policy rejected a placement into a non-empty cell.
    #[error("cell {cell} is already occupied")]
    CellOccupied {
        /// Cell that was requested.
        cell: CellCoord,
    },
    /// The agent has no recorded position on the grid.
    #[error("{agent} is not placed on the grid")]
    NotPlaced {
        /// Agent that was referenced.
        agent: AgentId,
    },
    /// The agent already occupies a cell and must be moved instead.
    #[error("{agent} is already placed at {cell}")]
    AlreadyPlaced {
        /// Agent that was referenced.
        agent: AgentId,
        /// Cell the agent currently occupies.
        cell: CellCoord,
    },
    /// A random placement was requested while no cell is empty.
    #[error("no empty cells remain on the grid")]
    GridFull,
    /// The grid was configured without any cells.
    #[error("grid dimensions {width}x{height} must both be positive")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
}
