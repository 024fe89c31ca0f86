//! State probes — the leaves of gate and transfer conditions.
//!
//! A probe names one observation of live simulation state. Probes are plain
//! data rather than captured closures: the expression tree stays `Debug`
//! and `Clone`, the graph stays movable, and evaluation borrows the state
//! it inspects only for the duration of the query.

use flowstone_logic::Logic;

use crate::queue::QueueCounter;
use crate::storage::Storage;
use crate::{QueueId, StorageId};

/// A condition over simulation state, as used by Gate and conditional
/// Transfer blocks.
pub type Expr = Logic<Probe>;

/// One observation of live state. Evaluated freshly on every query, so
/// expressions over probes are deliberately not referentially transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The named queue counter is zero.
    QueueEmpty(QueueId),
    /// The storage holds no transactions.
    StorageEmpty(StorageId),
    /// The storage has at least one free unit.
    StorageAvailable(StorageId),
    /// The storage is at capacity.
    StorageFull(StorageId),
}

impl Probe {
    pub(crate) fn holds(&self, queues: &[QueueCounter], storages: &[Storage]) -> bool {
        match self {
            Probe::QueueEmpty(queue) => queues[queue.index()].is_empty(),
            Probe::StorageEmpty(storage) => storages[storage.index()].is_empty(),
            Probe::StorageAvailable(storage) => storages[storage.index()].is_available(),
            Probe::StorageFull(storage) => storages[storage.index()].is_full(),
        }
    }
}
