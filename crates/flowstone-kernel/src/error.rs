//! Runtime failures.
//!
//! The kernel has exactly two: both indicate a model bug (a Depart or Leave
//! placed where its counter can underflow), both are fatal, and both
//! propagate straight out of [`crate::Simulation::launch`]. There is no
//! retry or recovery — a run is deterministic given its seeds, so a failure
//! reproduces until the model is fixed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("attempted to depart from empty queue \"{name}\"")]
    EmptyQueue { name: String },

    #[error("attempted to leave empty storage \"{name}\"")]
    EmptyStorage { name: String },
}
