//! Authoritative cell membership and agent position records.

use std::collections::BTreeMap;

use cellgrid_core::{AgentId, CellCoord, GridError, OccupancyPolicy, Topology, TraversalOrder};
use tracing::{debug, trace};

use crate::empties::EmptyCells;

/// Dense row-major cell storage paired with the reverse agent index.
///
/// `cells` and `positions` describe the same relation from both sides and the
/// empty-cell tracker is derived from `cells`. Every mutation below updates
/// all three before returning, and checks its preconditions before touching
/// any of them.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyStore {
    topology: Topology,
    policy: OccupancyPolicy,
    cells: Vec<Vec<AgentId>>,
    positions: BTreeMap<AgentId, CellCoord>,
    empties: EmptyCells,
}

impl OccupancyStore {
    pub(crate) fn new(topology: Topology, policy: OccupancyPolicy) -> Self {
        Self {
            cells: vec![Vec::new(); topology.cell_count()],
            positions: BTreeMap::new(),
            empties: EmptyCells::full(&topology),
            topology,
            policy,
        }
    }

    pub(crate) fn policy(&self) -> OccupancyPolicy {
        self.policy
    }

    pub(crate) fn empties(&self) -> &EmptyCells {
        &self.empties
    }

    /// Places an unplaced agent at a canonical cell.
    ///
    /// Returns the agent evicted to make room, which only happens under the
    /// evicting policy.
    pub(crate) fn place(
        &mut self,
        agent: AgentId,
        cell: CellCoord,
    ) -> Result<Option<AgentId>, GridError> {
        let index = self.slot(cell)?;
        if let Some(&current) = self.positions.get(&agent) {
            return Err(GridError::AlreadyPlaced {
                agent,
                cell: current,
            });
        }

        let evicted = match (self.policy, self.cells[index].first().copied()) {
            (OccupancyPolicy::Exclusive, Some(_)) => {
                return Err(GridError::CellOccupied { cell });
            }
            (OccupancyPolicy::Evicting, Some(occupant)) => {
                let _ = self.remove(occupant)?;
                debug!(%occupant, %agent, %cell, "evicted occupant");
                Some(occupant)
            }
            _ => None,
        };

        self.cells[index].push(agent);
        let _ = self.positions.insert(agent, cell);
        self.empties.remove(cell);
        trace!(%agent, %cell, "placed agent");
        Ok(evicted)
    }

    /// Removes a placed agent, returning the cell it vacated.
    pub(crate) fn remove(&mut self, agent: AgentId) -> Result<CellCoord, GridError> {
        let cell = *self
            .positions
            .get(&agent)
            .ok_or(GridError::NotPlaced { agent })?;
        let index = self.slot(cell)?;
        let _ = self.positions.remove(&agent);

        let contents = &mut self.cells[index];
        if let Some(offset) = contents.iter().position(|occupant| *occupant == agent) {
            let _ = contents.remove(offset);
        }
        if contents.is_empty() {
            self.empties.insert(cell);
        }

        trace!(%agent, %cell, "removed agent");
        Ok(cell)
    }

    /// Rejects a move that the exclusive policy could not complete.
    ///
    /// The agent's own cell never blocks it, since the move vacates it first.
    pub(crate) fn ensure_can_enter(
        &self,
        agent: AgentId,
        cell: CellCoord,
    ) -> Result<(), GridError> {
        let index = self.slot(cell)?;
        if self.policy != OccupancyPolicy::Exclusive {
            return Ok(());
        }

        match self.cells[index].first() {
            Some(&occupant) if occupant != agent => Err(GridError::CellOccupied { cell }),
            _ => Ok(()),
        }
    }

    /// Exchanges the cells of two placed agents in place.
    ///
    /// Each agent takes over the other's slot within the cell, so insertion
    /// order of any co-located agents is preserved and no cell changes its
    /// occupant count.
    pub(crate) fn swap(&mut self, first: AgentId, second: AgentId) -> Result<(), GridError> {
        let first_cell = self.position(first).ok_or(GridError::NotPlaced { agent: first })?;
        let second_cell = self
            .position(second)
            .ok_or(GridError::NotPlaced { agent: second })?;
        if first_cell == second_cell {
            return Ok(());
        }

        let first_index = self.slot(first_cell)?;
        let second_index = self.slot(second_cell)?;
        replace_in(&mut self.cells[first_index], first, second);
        replace_in(&mut self.cells[second_index], second, first);
        let _ = self.positions.insert(first, second_cell);
        let _ = self.positions.insert(second, first_cell);
        trace!(%first, %second, "swapped agents");
        Ok(())
    }

    pub(crate) fn contents(&self, cell: CellCoord) -> Result<&[AgentId], GridError> {
        let index = self.slot(cell)?;
        Ok(&self.cells[index])
    }

    pub(crate) fn position(&self, agent: AgentId) -> Option<CellCoord> {
        self.positions.get(&agent).copied()
    }

    pub(crate) fn agent_count(&self) -> usize {
        self.positions.len()
    }

    /// Placed agents in ascending identifier order.
    pub(crate) fn placed(&self) -> impl Iterator<Item = (AgentId, CellCoord)> + '_ {
        self.positions.iter().map(|(agent, cell)| (*agent, *cell))
    }

    /// Visits every cell exactly once in the requested order.
    pub(crate) fn traverse(
        &self,
        order: TraversalOrder,
    ) -> impl Iterator<Item = (CellCoord, &[AgentId])> + '_ {
        let width = self.topology.width();
        let height = self.topology.height();
        let total = u64::from(width) * u64::from(height);

        (0..total).filter_map(move |step| {
            let cell = match order {
                TraversalOrder::RowMajor => CellCoord::new(
                    (step % u64::from(width)) as u32,
                    (step / u64::from(width)) as u32,
                ),
                TraversalOrder::ColumnMajor => CellCoord::new(
                    (step / u64::from(height)) as u32,
                    (step % u64::from(height)) as u32,
                ),
            };
            let index = self.topology.index(cell)?;
            Some((cell, self.cells[index].as_slice()))
        })
    }

    fn slot(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.topology.index(cell).ok_or(GridError::OutOfBounds {
            x: i64::from(cell.x()),
            y: i64::from(cell.y()),
        })
    }
}

fn replace_in(contents: &mut [AgentId], current: AgentId, replacement: AgentId) {
    if let Some(slot) = contents.iter_mut().find(|occupant| **occupant == current) {
        *slot = replacement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(policy: OccupancyPolicy) -> OccupancyStore {
        let topology = Topology::new(3, 3, false).expect("valid topology");
        OccupancyStore::new(topology, policy)
    }

    #[test]
    fn multi_policy_keeps_insertion_order() {
        let mut store = store(OccupancyPolicy::Multi);
        let cell = CellCoord::new(1, 1);
        for id in [3, 1, 2] {
            assert_eq!(store.place(AgentId::new(id), cell), Ok(None));
        }

        assert_eq!(
            store.contents(cell).expect("in bounds"),
            &[AgentId::new(3), AgentId::new(1), AgentId::new(2)]
        );

        assert_eq!(store.remove(AgentId::new(1)), Ok(cell));
        assert_eq!(
            store.contents(cell).expect("in bounds"),
            &[AgentId::new(3), AgentId::new(2)]
        );
        assert!(!store.empties().contains(cell));
    }

    #[test]
    fn removing_last_agent_marks_cell_empty() {
        let mut store = store(OccupancyPolicy::Multi);
        let cell = CellCoord::new(0, 2);
        let _ = store.place(AgentId::new(1), cell).expect("place");
        assert!(!store.empties().contains(cell));

        let _ = store.remove(AgentId::new(1)).expect("remove");
        assert!(store.empties().contains(cell));
        assert_eq!(store.position(AgentId::new(1)), None);
    }

    #[test]
    fn placing_twice_is_rejected() {
        let mut store = store(OccupancyPolicy::Multi);
        let _ = store
            .place(AgentId::new(1), CellCoord::new(0, 0))
            .expect("place");
        assert_eq!(
            store.place(AgentId::new(1), CellCoord::new(1, 0)),
            Err(GridError::AlreadyPlaced {
                agent: AgentId::new(1),
                cell: CellCoord::new(0, 0),
            })
        );
        assert!(store.empties().contains(CellCoord::new(1, 0)));
    }

    #[test]
    fn exclusive_entry_check_ignores_the_mover() {
        let mut store = store(OccupancyPolicy::Exclusive);
        let cell = CellCoord::new(2, 2);
        let _ = store.place(AgentId::new(1), cell).expect("place");

        assert_eq!(store.ensure_can_enter(AgentId::new(1), cell), Ok(()));
        assert_eq!(
            store.ensure_can_enter(AgentId::new(2), cell),
            Err(GridError::CellOccupied { cell })
        );
    }

    #[test]
    fn swap_preserves_slot_order() {
        let mut store = store(OccupancyPolicy::Multi);
        let shared = CellCoord::new(0, 0);
        let lone = CellCoord::new(2, 1);
        let _ = store.place(AgentId::new(1), shared).expect("place");
        let _ = store.place(AgentId::new(2), shared).expect("place");
        let _ = store.place(AgentId::new(3), lone).expect("place");

        store
            .swap(AgentId::new(1), AgentId::new(3))
            .expect("swap placed agents");

        assert_eq!(
            store.contents(shared).expect("in bounds"),
            &[AgentId::new(3), AgentId::new(2)]
        );
        assert_eq!(store.contents(lone).expect("in bounds"), &[AgentId::new(1)]);
        assert_eq!(store.position(AgentId::new(1)), Some(lone));
        assert_eq!(store.position(AgentId::new(3)), Some(shared));
    }

    #[test]
    fn traversal_orders_cover_every_cell_once() {
        let store = store(OccupancyPolicy::Multi);
        let row_major: Vec<_> = store
            .traverse(TraversalOrder::RowMajor)
            .map(|(cell, _)| cell)
            .collect();
        let column_major: Vec<_> = store
            .traverse(TraversalOrder::ColumnMajor)
            .map(|(cell, _)| cell)
            .collect();

        assert_eq!(row_major.len(), 9);
        assert_eq!(row_major[1], CellCoord::new(1, 0));
        assert_eq!(column_major[1], CellCoord::new(0, 1));

        let mut sorted = row_major.clone();
        sorted.sort();
        assert_eq!(sorted, column_major);
    }
}
