//! Neighborhood enumeration and its lifetime cache.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use cellgrid_core::{CellCoord, GridPoint, NeighborhoodShape, Topology};
use tracing::debug;

/// Parameters that fully determine a neighborhood on a fixed topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NeighborhoodKey {
    pub(crate) center: CellCoord,
    pub(crate) shape: NeighborhoodShape,
    pub(crate) include_center: bool,
    pub(crate) radius: u32,
}

/// Memoized neighborhoods keyed on query parameters only.
///
/// Entries are shared as `Arc<[CellCoord]>` and never mutated or evicted: the
/// topology cannot change after construction, so a computed neighborhood stays
/// valid for the lifetime of the grid. The `RefCell` keeps the cache `Send`
/// but not `Sync`.
#[derive(Clone, Debug, Default)]
pub(crate) struct NeighborhoodCache {
    entries: RefCell<HashMap<NeighborhoodKey, Arc<[CellCoord]>>>,
}

impl NeighborhoodCache {
    /// Returns the cached neighborhood, computing and inserting it on a miss.
    pub(crate) fn resolve(&self, topology: &Topology, key: NeighborhoodKey) -> Arc<[CellCoord]> {
        let cached = self.entries.borrow().get(&key).cloned();
        if let Some(hit) = cached {
            return hit;
        }

        let computed: Arc<[CellCoord]> = compute(topology, key).into();
        debug!(
            center = %key.center,
            shape = ?key.shape,
            radius = key.radius,
            cells = computed.len(),
            "cached neighborhood"
        );
        let _ = self
            .entries
            .borrow_mut()
            .insert(key, Arc::clone(&computed));
        computed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Computes the sorted, deduplicated neighborhood described by `key`.
pub(crate) fn compute(topology: &Topology, key: NeighborhoodKey) -> Vec<CellCoord> {
    let cells = match key.shape {
        NeighborhoodShape::Moore | NeighborhoodShape::VonNeumann => square(topology, key),
        NeighborhoodShape::Hexagonal => hexagonal(topology, key),
    };
    cells.into_iter().collect()
}

fn square(topology: &Topology, key: NeighborhoodKey) -> BTreeSet<CellCoord> {
    let radius = i64::from(key.radius);
    let center = GridPoint::from(key.center);
    let columns = axis_offsets(center.x(), topology.width(), radius, topology.is_torus());
    let rows = axis_offsets(center.y(), topology.height(), radius, topology.is_torus());
    let mut cells = BTreeSet::new();

    for &dy in &rows {
        for &dx in &columns {
            if dx == 0 && dy == 0 && !key.include_center {
                continue;
            }

            if key.shape == NeighborhoodShape::VonNeumann && dx.abs() + dy.abs() > radius {
                continue;
            }

            if let Ok(cell) = topology.wrap(center.offset(dx, dy)) {
                let _ = cells.insert(cell);
            }
        }
    }

    cells
}

/// Offsets along one axis that can reach a distinct cell within `radius`.
///
/// Bounded axes are clipped to the grid. A torus axis no wider than the
/// window is visited once, using the offset of smallest magnitude for each
/// position so the Von Neumann distance check stays exact.
fn axis_offsets(origin: i64, extent: u32, radius: i64, torus: bool) -> Vec<i64> {
    let extent = i64::from(extent);
    if !torus {
        return ((-radius).max(-origin)..=radius.min(extent - 1 - origin)).collect();
    }
    if 2 * radius + 1 < extent {
        return (-radius..=radius).collect();
    }

    (0..extent)
        .map(|step| if step <= extent - step { step } else { step - extent })
        .collect()
}

fn hexagonal(topology: &Topology, key: NeighborhoodKey) -> BTreeSet<CellCoord> {
    let mut reached = BTreeSet::from([key.center]);
    let mut frontier = vec![key.center];

    for _ in 0..key.radius {
        let mut next = Vec::new();
        for cell in frontier {
            for candidate in hex_adjacent(cell) {
                let Ok(neighbor) = topology.wrap(candidate) else {
                    continue;
                };
                if reached.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    if !key.include_center {
        let _ = reached.remove(&key.center);
    }
    reached
}

/// Six odd-q neighbors: odd columns sit half a cell lower than even ones.
fn hex_adjacent(cell: CellCoord) -> [GridPoint; 6] {
    let origin = GridPoint::from(cell);
    let (lower, upper) = if cell.x() % 2 == 0 { (0, 1) } else { (-1, 0) };
    [
        origin.offset(0, -1),
        origin.offset(0, 1),
        origin.offset(-1, lower),
        origin.offset(-1, upper),
        origin.offset(1, lower),
        origin.offset(1, upper),
    ]
}
