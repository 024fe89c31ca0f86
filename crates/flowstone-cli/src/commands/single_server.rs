//! The M/M/1 line: exponential arrivals into a capacity-1 server.

use anyhow::Result;
use flowstone::{Exponential, ModelBuilder};
use tracing::info;

/// Arrivals per unit time.
const ARRIVAL_RATE: f64 = 1.0;
/// Services per unit time; utilization is `ARRIVAL_RATE / SERVICE_RATE`.
const SERVICE_RATE: f64 = 1.25;

pub fn run(end_time: f64, seed: u64, json: bool) -> Result<()> {
    info!(end_time, seed, "running single-server model");

    let mut sim = ModelBuilder::new(end_time)
        .add_storage("server", 1)?
        .add_generate(Exponential::new(seed, ARRIVAL_RATE), 1)
        .add_queue("line")
        .add_enter("server")?
        .add_depart("line")?
        .add_advance(Exponential::new(seed.wrapping_add(1), SERVICE_RATE))
        .add_leave("server")?
        .add_terminate()
        .build()?;

    let report = sim.launch()?;
    super::emit(&report, json)
}
