//! # flowstone-kernel: the discrete-event simulation core
//!
//! A [`Simulation`] owns a directed graph of blocks, a population of
//! transactions moving through that graph, and a schedule of future events.
//! Time advances in jumps: the earliest scheduled event is popped, queue and
//! storage occupancies are integrated over the elapsed interval, and the
//! event's transaction is *served* — walked synchronously from block to
//! block until it terminates or suspends on a waiting structure. After each
//! served event the kernel *settles*: the re-activation queue is drained and
//! every gate is re-polled until neither yields more work, all at the same
//! simulated time.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Simulation                          │
//! │  ┌────────────┐  ┌───────────────┐  ┌──────────────────┐  │
//! │  │ event heap │  │ re-activation │  │ block arena       │  │
//! │  │ (min time) │  │ FIFO          │  │ (tagged variants) │  │
//! │  └────────────┘  └───────────────┘  └──────────────────┘  │
//! │  ┌────────────┐  ┌───────────────┐  ┌──────────────────┐  │
//! │  │ queues     │  │ storages      │  │ occupancy stats   │  │
//! │  └────────────┘  └───────────────┘  └──────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The kernel is strictly single-threaded and deterministic: given the same
//! graph and the same sampler seeds, a run reproduces exactly. Suspension is
//! purely in-simulation — a block parks its transaction and returns, there
//! is no I/O and no host-level blocking.
//!
//! Graph wiring (blocks, labels, queues, storages) is expected to come from
//! a builder layer; the kernel exposes the mutation surface that layer needs
//! and treats the graph as frozen once [`Simulation::launch`] runs.

use std::fmt::{self, Display};

mod block;
mod error;
mod probe;
mod queue;
mod report;
mod sampler;
mod sim;
mod stats;
mod storage;
mod txn;

pub use block::{BlockKind, GateWaiter};
pub use error::SimulationError;
pub use probe::{Expr, Probe};
pub use queue::QueueCounter;
pub use report::{QueueReport, Report, StorageReport};
pub use sampler::Sampler;
pub use sim::Simulation;
pub use storage::Storage;
pub use txn::{SpawnData, TimedSpawn, Transaction};

// ============================================================================
// Entity IDs - stable indices into the simulation's arenas
// ============================================================================

/// Index of a block in the simulation's block arena.
///
/// Blocks never move and are never freed, so a `BlockId` handed out during
/// graph construction stays valid for the life of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(usize);

impl BlockId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a named queue counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(usize);

impl QueueId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a named finite-capacity storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageId(usize);

impl StorageId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a label. Labels may be declared before the block they name
/// exists; transfer blocks hold a `LabelId` and read the resolved target
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(usize);

impl LabelId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests;
