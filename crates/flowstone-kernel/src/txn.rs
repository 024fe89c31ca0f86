//! Transactions and schedule entries.

use std::cmp::Ordering;

use crate::BlockId;

/// The mobile entity traversing the block graph.
///
/// Higher priority is better everywhere a transaction competes for a
/// resource: the event heap at equal times, gate waiting lists, and storage
/// waiting lists. Ids are assigned monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub priority: u32,
    pub id: u64,
    /// Set on the transaction a Generate block produces and cleared the
    /// first time it leaves that block, so each arrival schedules its
    /// successor exactly once.
    pub just_generated: bool,
}

impl Transaction {
    /// A transaction that is already in flight.
    pub fn new(priority: u32, id: u64) -> Self {
        Self {
            priority,
            id,
            just_generated: false,
        }
    }

    /// A fresh arrival, about to enter its Generate block for the first time.
    pub fn generated(priority: u32, id: u64) -> Self {
        Self {
            priority,
            id,
            just_generated: true,
        }
    }

    /// Contention order: higher priority wins; among equal priorities the
    /// lower (older) id wins, so equal-priority waiters leave in FIFO order.
    pub(crate) fn precedence(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// A transaction paired with the block it should resume at.
///
/// `block` is `None` when the resume point fell off a dangling edge; serving
/// such a spawn is a no-op walk and the transaction simply leaves the model.
#[derive(Debug, Clone, Copy)]
pub struct SpawnData {
    pub block: Option<BlockId>,
    pub txn: Transaction,
}

impl SpawnData {
    pub fn new(block: Option<BlockId>, txn: Transaction) -> Self {
        Self { block, txn }
    }
}

/// An entry in the future-event heap.
///
/// Ordered so that `BinaryHeap::pop` yields the earliest time first; ties at
/// equal times go to the higher-priority transaction, then to the lower id.
#[derive(Debug, Clone, Copy)]
pub struct TimedSpawn {
    pub spawn: SpawnData,
    pub time: f64,
}

impl TimedSpawn {
    pub fn new(time: f64, spawn: SpawnData) -> Self {
        Self { spawn, time }
    }
}

impl PartialEq for TimedSpawn {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimedSpawn {}

impl PartialOrd for TimedSpawn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedSpawn {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| self.spawn.txn.precedence(&other.spawn.txn))
    }
}
