//! Incrementally maintained index of unoccupied cells.

use std::collections::BTreeSet;

use cellgrid_core::{CellCoord, Topology};
use rand::Rng;

/// Sorted set of cells that currently hold no agents.
///
/// The tracker never inspects cell contents itself; the occupancy store calls
/// [`EmptyCells::insert`] and [`EmptyCells::remove`] as the last step of each
/// mutation so both structures change together.
#[derive(Clone, Debug, Default)]
pub(crate) struct EmptyCells {
    cells: BTreeSet<CellCoord>,
}

impl EmptyCells {
    /// Creates a tracker where every cell of the topology is empty.
    pub(crate) fn full(topology: &Topology) -> Self {
        let cells = (0..topology.width())
            .flat_map(|x| (0..topology.height()).map(move |y| CellCoord::new(x, y)))
            .collect();
        Self { cells }
    }

    pub(crate) fn insert(&mut self, cell: CellCoord) {
        let _ = self.cells.insert(cell);
    }

    pub(crate) fn remove(&mut self, cell: CellCoord) {
        let _ = self.cells.remove(&cell);
    }

    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Empty cells in ascending `(x, y)` order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }

    /// Draws a uniformly random empty cell from the caller's random source.
    ///
    /// Selection indexes into the sorted order, so the same seed and the same
    /// grid history always yield the same cell.
    pub(crate) fn pick<R>(&self, rng: &mut R) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        if self.cells.is_empty() {
            return None;
        }

        let index = rng.gen_range(0..self.cells.len());
        self.cells.iter().nth(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn topology() -> Topology {
        Topology::new(3, 2, false).expect("valid topology")
    }

    #[test]
    fn full_tracker_lists_every_cell_sorted() {
        let empties = EmptyCells::full(&topology());
        let cells: Vec<_> = empties.iter().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
                CellCoord::new(2, 0),
                CellCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn pick_returns_none_when_exhausted() {
        let mut empties = EmptyCells::full(&topology());
        for cell in empties.iter().collect::<Vec<_>>() {
            empties.remove(cell);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(empties.is_empty());
        assert_eq!(empties.pick(&mut rng), None);
    }

    #[test]
    fn pick_is_reproducible_for_equal_seeds() {
        let empties = EmptyCells::full(&topology());
        let mut first = ChaCha8Rng::seed_from_u64(0x5eed);
        let mut second = ChaCha8Rng::seed_from_u64(0x5eed);

        let first_draws: Vec<_> = (0..16).map(|_| empties.pick(&mut first)).collect();
        let second_draws: Vec<_> = (0..16).map(|_| empties.pick(&mut second)).collect();

        assert_eq!(first_draws, second_draws);
        assert!(first_draws
            .iter()
            .all(|cell| cell.is_some_and(|cell| empties.contains(cell))));
    }
}
