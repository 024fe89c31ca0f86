//! The chainable model builder.
//!
//! `ModelBuilder` assembles a [`Simulation`] incrementally. Each `add_*`
//! call appends one block; the builder keeps a *hold* pointer to the block
//! it appended last, and the next appended block becomes that block's
//! fall-through successor. Blocks that never fall through (terminate,
//! immediate transfer, debug) clear the hold, which starts a fresh segment.
//!
//! Labels stitch segments together: `add_label(name)` names the block the
//! hold points at, and transfer blocks may reference a label before it is
//! bound (forward references). `build()` refuses to freeze a model while
//! any label is still unbound.
//!
//! Queues are declared implicitly by the first `add_queue` that mentions
//! them; storages must be declared up front with `add_storage` because a
//! capacity is needed.

use std::collections::HashMap;

use tracing::warn;

use flowstone_kernel::{
    BlockId, BlockKind, Expr, LabelId, Probe, QueueId, Sampler, Simulation, SpawnData, StorageId,
    Transaction,
};

use crate::error::BuildError;

#[derive(Debug)]
pub struct ModelBuilder {
    sim: Simulation,
    /// The implicit predecessor for the next appended block.
    hold: Option<BlockId>,
    labels: HashMap<String, LabelId>,
    queues: HashMap<String, QueueId>,
    storages: HashMap<String, StorageId>,
}

impl ModelBuilder {
    /// Starts an empty model that will run until `end_time`.
    pub fn new(end_time: f64) -> Self {
        Self {
            sim: Simulation::new(end_time),
            hold: None,
            labels: HashMap::new(),
            queues: HashMap::new(),
            storages: HashMap::new(),
        }
    }

    /// Links the hold block (if any) to `block` and makes `block` the new
    /// hold.
    fn attach(&mut self, block: BlockId) {
        if let Some(hold) = self.hold {
            self.sim.link(hold, block);
        }
        self.hold = Some(block);
    }

    /// Links the hold block (if any) to `block` and clears the hold: the
    /// appended block never falls through.
    fn attach_sink(&mut self, block: BlockId) {
        if let Some(hold) = self.hold {
            self.sim.link(hold, block);
        }
        self.hold = None;
    }

    /// Returns the label id for `name`, declaring it (unbound) on first
    /// mention.
    fn label_id(&mut self, name: &str) -> LabelId {
        if let Some(&id) = self.labels.get(name) {
            return id;
        }
        let id = self.sim.declare_label(name);
        self.labels.insert(name.to_string(), id);
        id
    }

    fn queue_id(&mut self, name: &str) -> QueueId {
        if let Some(&id) = self.queues.get(name) {
            return id;
        }
        let id = self.sim.declare_queue(name);
        self.queues.insert(name.to_string(), id);
        id
    }

    // ========================================================================
    // Declarations and labels
    // ========================================================================

    /// Binds `name` to the most recently added block.
    ///
    /// Fails on an empty name, when there is no block to bind (labels
    /// cannot follow terminate or an immediate transfer), or when `name`
    /// is already bound.
    pub fn add_label(mut self, name: &str) -> Result<Self, BuildError> {
        if name.is_empty() {
            return Err(BuildError::EmptyLabel);
        }
        let Some(hold) = self.hold else {
            return Err(BuildError::LabelWithoutBlock {
                name: name.to_string(),
            });
        };
        if let Some(&id) = self.labels.get(name) {
            if self.sim.label_target(id).is_some() {
                return Err(BuildError::LabelRedeclaration {
                    name: name.to_string(),
                });
            }
            self.sim.bind_label(id, hold);
        } else {
            let id = self.sim.declare_label(name);
            self.labels.insert(name.to_string(), id);
            self.sim.bind_label(id, hold);
        }
        Ok(self)
    }

    /// Declares a storage with `capacity` service units.
    pub fn add_storage(mut self, name: &str, capacity: usize) -> Result<Self, BuildError> {
        if self.storages.contains_key(name) {
            return Err(BuildError::StorageRedeclaration {
                name: name.to_string(),
            });
        }
        let id = self.sim.declare_storage(name, capacity);
        self.storages.insert(name.to_string(), id);
        Ok(self)
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// Appends a Queue block; the named counter is created on first use.
    pub fn add_queue(mut self, name: &str) -> Self {
        let queue = self.queue_id(name);
        let block = self.sim.push_block(BlockKind::Queue { queue });
        self.attach(block);
        self
    }

    /// Appends a Depart block for an already-used queue name.
    pub fn add_depart(mut self, name: &str) -> Result<Self, BuildError> {
        let Some(&queue) = self.queues.get(name) else {
            return Err(BuildError::UnknownQueue {
                name: name.to_string(),
            });
        };
        let block = self.sim.push_block(BlockKind::Depart { queue });
        self.attach(block);
        Ok(self)
    }

    /// Appends an Enter block for a declared storage.
    pub fn add_enter(mut self, name: &str) -> Result<Self, BuildError> {
        let Some(&storage) = self.storages.get(name) else {
            return Err(BuildError::UnknownStorage {
                name: name.to_string(),
            });
        };
        let block = self.sim.push_block(BlockKind::Enter { storage });
        self.attach(block);
        Ok(self)
    }

    /// Appends a Leave block for a declared storage.
    pub fn add_leave(mut self, name: &str) -> Result<Self, BuildError> {
        let Some(&storage) = self.storages.get(name) else {
            return Err(BuildError::UnknownStorage {
                name: name.to_string(),
            });
        };
        let block = self.sim.push_block(BlockKind::Leave { storage });
        self.attach(block);
        Ok(self)
    }

    /// Appends a Generate block and seeds the schedule with its first
    /// arrival, drawn from `sampler` now. Every arrival books the next one
    /// as it passes through the block, so the stream continues for the
    /// whole run.
    pub fn add_generate(mut self, mut sampler: impl Sampler + 'static, priority: u32) -> Self {
        let first = sampler.sample();
        let block = self.sim.push_block(BlockKind::generate(priority, sampler));
        self.attach(block);
        let id = self.sim.allocate_txn_id();
        self.sim.schedule_at(
            first,
            SpawnData::new(Some(block), Transaction::generated(priority, id)),
        );
        self
    }

    /// Appends an Advance block: transactions are held for a sampled delay.
    pub fn add_advance(mut self, sampler: impl Sampler + 'static) -> Self {
        let block = self.sim.push_block(BlockKind::advance(sampler));
        self.attach(block);
        self
    }

    /// Appends a Gate admitting transactions while `expr` holds.
    pub fn add_gate(mut self, expr: Expr) -> Self {
        let block = self.sim.push_block(BlockKind::gate(expr));
        self.sim.register_gate(block);
        self.attach(block);
        self
    }

    /// Appends an unconditional jump to `label` (forward references are
    /// fine). Clears the hold: there is no fall-through out of this block.
    pub fn add_transfer_imm(mut self, label: &str) -> Self {
        let to = self.label_id(label);
        let block = self.sim.push_block(BlockKind::TransferImm { to });
        self.attach_sink(block);
        self
    }

    /// Appends a conditional jump: to `label` when `expr` holds, else fall
    /// through.
    pub fn add_transfer_expr(mut self, label: &str, expr: Expr) -> Self {
        let alt = self.label_id(label);
        let block = self.sim.push_block(BlockKind::TransferExpr { alt, expr });
        self.attach(block);
        self
    }

    /// Appends a probabilistic jump: to `label` with probability `prob`,
    /// else fall through. The block draws from its own RNG seeded with
    /// `seed`.
    pub fn add_transfer_prob(mut self, label: &str, prob: f64, seed: u64) -> Self {
        let alt = self.label_id(label);
        let block = self.sim.push_block(BlockKind::transfer_prob(alt, prob, seed));
        self.attach(block);
        self
    }

    /// Appends a Debug block: transactions reaching it emit a trace line
    /// and end their walk there.
    pub fn add_debug(mut self, message: &str) -> Self {
        let block = self.sim.push_block(BlockKind::debug(message));
        self.attach_sink(block);
        self
    }

    /// Appends a Terminate block and closes the current segment.
    pub fn add_terminate(mut self) -> Self {
        let block = self.sim.push_block(BlockKind::Terminate);
        self.attach_sink(block);
        self
    }

    // ========================================================================
    // Probe helpers
    // ========================================================================

    /// Probe: the named queue counter is zero.
    pub fn queue_empty(&self, name: &str) -> Result<Probe, BuildError> {
        self.queues
            .get(name)
            .map(|&id| Probe::QueueEmpty(id))
            .ok_or_else(|| BuildError::UnknownQueue {
                name: name.to_string(),
            })
    }

    /// Probe: the named storage holds no transactions.
    pub fn storage_empty(&self, name: &str) -> Result<Probe, BuildError> {
        self.storage_probe(name, Probe::StorageEmpty)
    }

    /// Probe: the named storage has a free unit.
    pub fn storage_available(&self, name: &str) -> Result<Probe, BuildError> {
        self.storage_probe(name, Probe::StorageAvailable)
    }

    /// Probe: the named storage is at capacity.
    pub fn storage_full(&self, name: &str) -> Result<Probe, BuildError> {
        self.storage_probe(name, Probe::StorageFull)
    }

    fn storage_probe(
        &self,
        name: &str,
        probe: fn(StorageId) -> Probe,
    ) -> Result<Probe, BuildError> {
        self.storages
            .get(name)
            .map(|&id| probe(id))
            .ok_or_else(|| BuildError::UnknownStorage {
                name: name.to_string(),
            })
    }

    // ========================================================================
    // Freeze
    // ========================================================================

    /// Freezes and returns the simulation.
    ///
    /// Every referenced label must be bound by now. A dangling hold is
    /// legal but suspicious — transactions reaching the end of that
    /// segment walk off the graph — so it is logged rather than rejected.
    pub fn build(self) -> Result<Simulation, BuildError> {
        if let Some(name) = self.sim.unresolved_label() {
            return Err(BuildError::UnresolvedLabel {
                name: name.to_string(),
            });
        }
        if self.hold.is_some() {
            warn!("model ends in a fall-through edge; transactions reaching it will be dropped");
        }
        Ok(self.sim)
    }
}
