//! The simulation owner: event dispatch, the serve walk, and the settle
//! protocol.
//!
//! `launch` drives the run. Each outer iteration pops the earliest future
//! event, integrates statistics over the elapsed interval, advances the
//! clock, and serves the event's transaction. Serving walks the block graph
//! synchronously; a block either returns the next block or `None`, meaning
//! the transaction terminated or parked itself on a waiting structure.
//!
//! After the main event, the kernel settles at the current instant: the
//! re-activation FIFO is drained, and whenever it runs dry every gate is
//! re-polled in declaration order. A gate that can release a waiter pushes
//! exactly one onto the FIFO per poll, so releases interleave fairly and
//! each released transaction runs to quiescence before the next poll. The
//! clock never moves inside the settle loop.

use std::collections::{BinaryHeap, VecDeque};

use rand::Rng;
use tracing::{debug, trace};

use crate::block::{Block, BlockKind, GateWaiter};
use crate::error::SimulationError;
use crate::probe::Expr;
use crate::queue::QueueCounter;
use crate::report::{QueueReport, Report, StorageReport};
use crate::stats::OccupancyStat;
use crate::storage::Storage;
use crate::txn::{SpawnData, TimedSpawn, Transaction};
use crate::{BlockId, LabelId, QueueId, StorageId};

#[derive(Debug)]
struct Label {
    name: String,
    target: Option<BlockId>,
}

#[derive(Debug)]
pub struct Simulation {
    now: f64,
    end_time: f64,
    next_txn_id: u64,
    blocks: Vec<Block>,
    labels: Vec<Label>,
    queues: Vec<QueueCounter>,
    storages: Vec<Storage>,
    /// Gate blocks in declaration order — the refresh scan order.
    gates: Vec<BlockId>,
    /// Future events, earliest first.
    schedule: BinaryHeap<TimedSpawn>,
    /// Transactions released at the current instant, served FIFO.
    reactivation: VecDeque<SpawnData>,
    queue_stats: Vec<OccupancyStat>,
    storage_stats: Vec<OccupancyStat>,
}

impl Simulation {
    pub fn new(end_time: f64) -> Self {
        Self {
            now: 0.0,
            end_time,
            next_txn_id: 0,
            blocks: Vec::new(),
            labels: Vec::new(),
            queues: Vec::new(),
            storages: Vec::new(),
            gates: Vec::new(),
            schedule: BinaryHeap::new(),
            reactivation: VecDeque::new(),
            queue_stats: Vec::new(),
            storage_stats: Vec::new(),
        }
    }

    // ========================================================================
    // Graph wiring - used by the builder layer, frozen before launch
    // ========================================================================

    /// Appends a block with no successor and returns its stable id.
    pub fn push_block(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Block { next: None, kind });
        id
    }

    /// Sets `from`'s fall-through successor.
    pub fn link(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].next = Some(to);
    }

    /// Declares a named queue counter. Its statistics slot is created
    /// alongside, so counters and stats can never go out of step.
    pub fn declare_queue(&mut self, name: impl Into<String>) -> QueueId {
        let id = QueueId::new(self.queues.len());
        self.queues.push(QueueCounter::new(name.into()));
        self.queue_stats.push(OccupancyStat::default());
        id
    }

    /// Declares a named storage with the given capacity.
    pub fn declare_storage(&mut self, name: impl Into<String>, capacity: usize) -> StorageId {
        let id = StorageId::new(self.storages.len());
        self.storages.push(Storage::new(name.into(), capacity));
        self.storage_stats.push(OccupancyStat::default());
        id
    }

    /// Declares a label, initially unresolved. Forward references hold the
    /// returned id until [`Simulation::bind_label`] fills the target in.
    pub fn declare_label(&mut self, name: impl Into<String>) -> LabelId {
        let id = LabelId::new(self.labels.len());
        self.labels.push(Label {
            name: name.into(),
            target: None,
        });
        id
    }

    pub fn bind_label(&mut self, label: LabelId, target: BlockId) {
        self.labels[label.index()].target = Some(target);
    }

    pub fn label_target(&self, label: LabelId) -> Option<BlockId> {
        self.labels[label.index()].target
    }

    /// Name of some still-unresolved label, if any. The builder refuses to
    /// freeze a model while this returns `Some`.
    pub fn unresolved_label(&self) -> Option<&str> {
        self.labels
            .iter()
            .find(|label| label.target.is_none())
            .map(|label| label.name.as_str())
    }

    /// Registers a gate block for the settle loop's refresh scan.
    /// Registration order is scan order.
    pub fn register_gate(&mut self, gate: BlockId) {
        self.gates.push(gate);
    }

    /// Hands out the next transaction id. Ids are never reused.
    pub fn allocate_txn_id(&mut self) -> u64 {
        let id = self.next_txn_id;
        self.next_txn_id += 1;
        id
    }

    /// Schedules a future event. `time` is absolute simulated time.
    pub fn schedule_at(&mut self, time: f64, spawn: SpawnData) {
        self.schedule.push(TimedSpawn::new(time, spawn));
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn time(&self) -> f64 {
        self.now
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn find_queue(&self, name: &str) -> Option<QueueId> {
        self.queues
            .iter()
            .position(|queue| queue.name() == name)
            .map(QueueId::new)
    }

    pub fn find_storage(&self, name: &str) -> Option<StorageId> {
        self.storages
            .iter()
            .position(|storage| storage.name() == name)
            .map(StorageId::new)
    }

    pub fn queue(&self, id: QueueId) -> &QueueCounter {
        &self.queues[id.index()]
    }

    pub fn storage(&self, id: StorageId) -> &Storage {
        &self.storages[id.index()]
    }

    /// Evaluates a condition against the current state.
    pub fn eval(&self, expr: &Expr) -> bool {
        expr.eval(&mut |probe| probe.holds(&self.queues, &self.storages))
    }

    // ========================================================================
    // The main loop
    // ========================================================================

    /// Runs the simulation to its end time (or until no future events
    /// remain) and returns the summary report.
    ///
    /// The loop condition is checked before each pop, so the event that
    /// carries the clock past `end_time` is still served and its interval
    /// still integrates into the statistics.
    pub fn launch(&mut self) -> Result<Report, SimulationError> {
        debug!(end_time = self.end_time, "launching");
        while self.now < self.end_time {
            let Some(event) = self.schedule.pop() else {
                debug!(time = self.now, "schedule exhausted");
                break;
            };
            let delta = event.time - self.now;
            debug_assert!(
                delta >= 0.0,
                "event scheduled in the past: {} < {}",
                event.time,
                self.now
            );
            self.record_stats(delta);
            self.now = event.time;
            trace!(time = self.now, "timestep");

            self.serve(event.spawn)?;
            self.settle()?;
        }
        debug!(time = self.now, "run complete");
        Ok(self.report())
    }

    /// Walks one transaction through the graph until it terminates or
    /// suspends.
    fn serve(&mut self, spawn: SpawnData) -> Result<(), SimulationError> {
        let mut txn = spawn.txn;
        let mut cursor = spawn.block;
        while let Some(at) = cursor {
            trace!(
                txn = txn.id,
                block = self.blocks[at.index()].kind.name(),
                "advancing"
            );
            cursor = self.step(at, &mut txn)?;
        }
        Ok(())
    }

    /// Drains same-instant work: serve re-activated transactions FIFO, and
    /// whenever the FIFO is empty poll the gates. Done when neither yields
    /// anything.
    fn settle(&mut self) -> Result<(), SimulationError> {
        loop {
            if let Some(spawn) = self.reactivation.pop_front() {
                self.serve(spawn)?;
            } else if !self.refresh_gates() {
                return Ok(());
            }
        }
    }

    /// Scans gates in declaration order; the first gate whose condition
    /// holds and whose waiting list is non-empty releases its best waiter
    /// onto the re-activation FIFO. At most one release per call.
    fn refresh_gates(&mut self) -> bool {
        let Self {
            blocks,
            queues,
            storages,
            gates,
            reactivation,
            ..
        } = self;
        for &gate_id in gates.iter() {
            let block = &mut blocks[gate_id.index()];
            let next = block.next;
            if let BlockKind::Gate { expr, waiters } = &mut block.kind {
                if waiters.is_empty() {
                    continue;
                }
                if expr.eval(&mut |probe| probe.holds(queues.as_slice(), storages.as_slice())) {
                    if let Some(GateWaiter(txn)) = waiters.pop() {
                        trace!(txn = txn.id, "gate released waiter");
                        reactivation.push_back(SpawnData::new(next, txn));
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Executes one block for `txn`, returning where to walk next. `None`
    /// means the transaction terminated here or was parked on a waiting
    /// structure (gate, storage waiters, or the future-event heap).
    fn step(
        &mut self,
        at: BlockId,
        txn: &mut Transaction,
    ) -> Result<Option<BlockId>, SimulationError> {
        let Self {
            blocks,
            labels,
            queues,
            storages,
            schedule,
            reactivation,
            now,
            next_txn_id,
            ..
        } = self;
        let block = &mut blocks[at.index()];
        let next = block.next;
        match &mut block.kind {
            BlockKind::Queue { queue } => {
                queues[queue.index()].increment();
                Ok(next)
            }
            BlockKind::Depart { queue } => {
                queues[queue.index()].decrement()?;
                Ok(next)
            }
            BlockKind::Enter { storage } => {
                if storages[storage.index()].enter(*txn, next) {
                    Ok(next)
                } else {
                    Ok(None)
                }
            }
            BlockKind::Leave { storage } => {
                if let Some(waiter) = storages[storage.index()].leave()? {
                    trace!(txn = waiter.txn.id, "storage handed off to waiter");
                    reactivation.push_back(SpawnData::new(waiter.resume, waiter.txn));
                }
                Ok(next)
            }
            BlockKind::Generate { priority, sampler } => {
                if txn.just_generated {
                    // This arrival books the next one, exactly once.
                    txn.just_generated = false;
                    let id = *next_txn_id;
                    *next_txn_id += 1;
                    let arrival = *now + sampler.sample();
                    schedule.push(TimedSpawn::new(
                        arrival,
                        SpawnData::new(Some(at), Transaction::generated(*priority, id)),
                    ));
                }
                Ok(next)
            }
            BlockKind::Advance { sampler } => {
                // Even a zero delay goes through the heap, so the
                // transaction resumes on a later outer iteration.
                let wake = *now + sampler.sample();
                schedule.push(TimedSpawn::new(wake, SpawnData::new(next, *txn)));
                Ok(None)
            }
            BlockKind::Gate { expr, waiters } => {
                // A higher-priority arrival may overtake the head waiter of
                // an open gate; anyone else queues behind it.
                let in_front = waiters
                    .peek()
                    .is_none_or(|head| txn.priority > head.0.priority);
                if in_front
                    && expr.eval(&mut |probe| probe.holds(queues.as_slice(), storages.as_slice()))
                {
                    Ok(next)
                } else {
                    waiters.push(GateWaiter(*txn));
                    Ok(None)
                }
            }
            BlockKind::TransferImm { to } => Ok(labels[to.index()].target),
            BlockKind::TransferExpr { alt, expr } => {
                if expr.eval(&mut |probe| probe.holds(queues.as_slice(), storages.as_slice())) {
                    Ok(labels[alt.index()].target)
                } else {
                    Ok(next)
                }
            }
            BlockKind::TransferProb { alt, prob, rng } => {
                if rng.gen_range(0.0..1.0) < *prob {
                    Ok(labels[alt.index()].target)
                } else {
                    Ok(next)
                }
            }
            BlockKind::Debug { message } => {
                tracing::info!(txn = txn.id, "{message}");
                Ok(next)
            }
            BlockKind::Terminate => Ok(None),
        }
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    fn record_stats(&mut self, delta: f64) {
        for (queue, stat) in self.queues.iter().zip(self.queue_stats.iter_mut()) {
            stat.observe(queue.current(), delta, false);
        }
        for (storage, stat) in self.storages.iter().zip(self.storage_stats.iter_mut()) {
            stat.observe(storage.current(), delta, storage.is_full());
        }
    }

    /// The summary so far. Normally read through [`Simulation::launch`],
    /// but callable after a failed run to inspect statistics up to the
    /// abort.
    pub fn report(&self) -> Report {
        let elapsed = self.now;
        let queues = self
            .queues
            .iter()
            .zip(&self.queue_stats)
            .map(|(queue, stat)| QueueReport {
                name: queue.name().to_string(),
                current: queue.current(),
                max: stat.max(),
                mean: stat.mean(elapsed),
                idle_fraction: stat.idle_fraction(elapsed),
            })
            .collect();
        let storages = self
            .storages
            .iter()
            .zip(&self.storage_stats)
            .map(|(storage, stat)| StorageReport {
                name: storage.name().to_string(),
                capacity: storage.capacity(),
                current: storage.current(),
                max: stat.max(),
                mean: stat.mean(elapsed),
                utilization: if storage.capacity() > 0 {
                    stat.mean(elapsed) / storage.capacity() as f64
                } else {
                    0.0
                },
                idle_fraction: stat.idle_fraction(elapsed),
                full_fraction: stat.full_fraction(elapsed),
            })
            .collect();
        Report {
            elapsed,
            queues,
            storages,
        }
    }
}

#[cfg(test)]
impl Simulation {
    pub(crate) fn reactivation_queue(&self) -> &VecDeque<SpawnData> {
        &self.reactivation
    }

    pub(crate) fn peek_txn_id(&self) -> u64 {
        self.next_txn_id
    }

    pub(crate) fn schedule_len(&self) -> usize {
        self.schedule.len()
    }

    pub(crate) fn refresh_gates_once(&mut self) -> bool {
        self.refresh_gates()
    }

    pub(crate) fn step_block(
        &mut self,
        at: BlockId,
        txn: &mut Transaction,
    ) -> Result<Option<BlockId>, SimulationError> {
        self.step(at, txn)
    }
}
