//! The block set.
//!
//! A block is one node of the model graph: a single `next` edge plus a
//! tagged variant that determines behavior. Blocks live in an arena owned
//! by the simulation and refer to each other through [`BlockId`] indices,
//! so the graph is movable and forward references resolve by index fix-up.
//!
//! Variants that need private state carry it inline: a gate owns its
//! priority-ordered waiting list, a probabilistic transfer its own seeded
//! RNG, a generate/advance its sampler.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::probe::Expr;
use crate::sampler::Sampler;
use crate::txn::Transaction;
use crate::{BlockId, LabelId, QueueId, StorageId};

/// A transaction parked at a gate. Ordered by contention priority so the
/// waiting list releases higher priorities first, FIFO among equals.
#[derive(Debug, Clone, Copy)]
pub struct GateWaiter(pub Transaction);

impl PartialEq for GateWaiter {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GateWaiter {}

impl PartialOrd for GateWaiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GateWaiter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.precedence(&other.0)
    }
}

/// One node of the model graph.
pub(crate) struct Block {
    pub next: Option<BlockId>,
    pub kind: BlockKind,
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("next", &self.next)
            .field("kind", &self.kind.name())
            .finish()
    }
}

impl std::fmt::Debug for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The behavior variant of a block.
pub enum BlockKind {
    /// Increment the named queue counter and pass through.
    Queue { queue: QueueId },
    /// Decrement the named queue counter and pass through; underflow is
    /// fatal.
    Depart { queue: QueueId },
    /// Request a storage unit; suspend on the waiting list when full.
    Enter { storage: StorageId },
    /// Release a storage unit, handing it to the best waiter if any.
    Leave { storage: StorageId },
    /// Arrival source: a fresh transaction entering here schedules its own
    /// successor once, then both pass through like any other transaction.
    Generate {
        priority: u32,
        sampler: Box<dyn Sampler>,
    },
    /// Hold the transaction for a sampled delay, then resume at `next`.
    Advance { sampler: Box<dyn Sampler> },
    /// Admit transactions while the condition holds; park them otherwise.
    Gate {
        expr: Expr,
        waiters: BinaryHeap<GateWaiter>,
    },
    /// Unconditional jump to a labelled block.
    TransferImm { to: LabelId },
    /// Jump to the alternate label when the condition holds, else fall
    /// through to `next`.
    TransferExpr { alt: LabelId, expr: Expr },
    /// Jump to the alternate label with probability `prob`, else fall
    /// through. The draw comes from the block's own seeded RNG, shared by
    /// every transaction passing through.
    TransferProb {
        alt: LabelId,
        prob: f64,
        rng: SmallRng,
    },
    /// Emit a trace line and end the walk.
    Debug { message: String },
    /// Remove the transaction from the model.
    Terminate,
}

impl BlockKind {
    pub fn generate(priority: u32, sampler: impl Sampler + 'static) -> Self {
        BlockKind::Generate {
            priority,
            sampler: Box::new(sampler),
        }
    }

    pub fn advance(sampler: impl Sampler + 'static) -> Self {
        BlockKind::Advance {
            sampler: Box::new(sampler),
        }
    }

    pub fn gate(expr: Expr) -> Self {
        BlockKind::Gate {
            expr,
            waiters: BinaryHeap::new(),
        }
    }

    pub fn transfer_prob(alt: LabelId, prob: f64, seed: u64) -> Self {
        BlockKind::TransferProb {
            alt,
            prob,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        BlockKind::Debug {
            message: message.into(),
        }
    }

    /// Short name used in trace output.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Queue { .. } => "queue",
            BlockKind::Depart { .. } => "depart",
            BlockKind::Enter { .. } => "enter",
            BlockKind::Leave { .. } => "leave",
            BlockKind::Generate { .. } => "generate",
            BlockKind::Advance { .. } => "advance",
            BlockKind::Gate { .. } => "gate",
            BlockKind::TransferImm { .. } => "transfer_imm",
            BlockKind::TransferExpr { .. } => "transfer_expr",
            BlockKind::TransferProb { .. } => "transfer_prob",
            BlockKind::Debug { .. } => "debug",
            BlockKind::Terminate => "terminate",
        }
    }
}
