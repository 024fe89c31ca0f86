//! The summary report.
//!
//! One row per queue and per storage, with the live end-of-run values next
//! to the time-weighted statistics. The `Display` rendering is the classic
//! fixed-point table; the structs also serialize for machine consumption.

use std::fmt::{self, Display};

use serde::Serialize;

/// End-of-run summary for a whole simulation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Total simulated time integrated into the statistics.
    pub elapsed: f64,
    pub queues: Vec<QueueReport>,
    pub storages: Vec<StorageReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueReport {
    pub name: String,
    /// Gauge value when the run ended.
    pub current: usize,
    /// Largest occupancy observed at a timestep boundary.
    pub max: usize,
    /// Time-weighted mean occupancy.
    pub mean: f64,
    /// Fraction of elapsed time the queue was empty.
    pub idle_fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageReport {
    pub name: String,
    pub capacity: usize,
    pub current: usize,
    pub max: usize,
    pub mean: f64,
    /// Mean occupancy relative to capacity.
    pub utilization: f64,
    /// Fraction of elapsed time the storage was empty.
    pub idle_fraction: f64,
    /// Fraction of elapsed time the storage was at capacity.
    pub full_fraction: f64,
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QUEUES:")?;
        writeln!(f, "\tqueue\t\tCurrent\t\tMax\t\tM\t\tP(0)")?;
        for queue in &self.queues {
            writeln!(
                f,
                "\t{}\t\t{}\t\t{}\t\t{:.4}\t\t{:.4}",
                queue.name, queue.current, queue.max, queue.mean, queue.idle_fraction
            )?;
        }

        writeln!(f, "STORAGES:")?;
        writeln!(
            f,
            "\tstorage\t\tCap\t\tCurrent\t\tMax\t\tM\t\tK\t\tP(0)\t\tP(full)"
        )?;
        for storage in &self.storages {
            writeln!(
                f,
                "\t{}\t\t{}\t\t{}\t\t{}\t\t{:.4}\t\t{:.4}\t\t{:.4}\t\t{:.4}",
                storage.name,
                storage.capacity,
                storage.current,
                storage.max,
                storage.mean,
                storage.utilization,
                storage.idle_fraction,
                storage.full_fraction
            )?;
        }
        Ok(())
    }
}
