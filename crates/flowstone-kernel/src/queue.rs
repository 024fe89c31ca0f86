//! Named queue counters.
//!
//! A queue in the GPSS sense is a gauge, not a container: Queue blocks
//! increment it, Depart blocks decrement it, and the statistics collector
//! integrates it over time. Transactions are never stored here.

use crate::error::SimulationError;

#[derive(Debug, Clone)]
pub struct QueueCounter {
    name: String,
    current: usize,
}

impl QueueCounter {
    pub(crate) fn new(name: String) -> Self {
        Self { name, current: 0 }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub(crate) fn increment(&mut self) {
        self.current += 1;
    }

    /// Fails when the gauge is already zero: a Depart ran where no matching
    /// Queue had run first, which is a model bug.
    pub(crate) fn decrement(&mut self) -> Result<(), SimulationError> {
        if self.current == 0 {
            return Err(SimulationError::EmptyQueue {
                name: self.name.clone(),
            });
        }
        self.current -= 1;
        Ok(())
    }
}
