//! The two-workshop routing model.
//!
//! Two workshops with five service units each. Workshop A and workshop B
//! each have a dedicated arrival line; a third, shared line waits at a
//! gate until either workshop has a free unit, then routes: to whichever
//! workshop is free, or by a coin flip when both are.

use anyhow::Result;
use flowstone::{Exponential, Logic, ModelBuilder};
use tracing::info;

pub fn run(end_time: f64, seed: u64, json: bool) -> Result<()> {
    info!(end_time, seed, "running workshop model");

    let builder = ModelBuilder::new(end_time)
        .add_storage("shop_a", 5)?
        .add_storage("shop_b", 5)?;
    let free_a = builder.storage_available("shop_a")?;
    let free_b = builder.storage_available("shop_b")?;

    let mut sim = builder
        // dedicated line into workshop A
        .add_generate(Exponential::new(seed, 5.0), 1)
        .add_queue("line_a")
        .add_enter("shop_a")?
        .add_depart("line_a")?
        .add_advance(Exponential::new(seed.wrapping_add(1), 22.0))
        .add_leave("shop_a")?
        .add_terminate()
        // dedicated line into workshop B
        .add_generate(Exponential::new(seed.wrapping_add(2), 9.0), 1)
        .add_queue("line_b")
        .add_enter("shop_b")?
        .add_depart("line_b")?
        .add_advance(Exponential::new(seed.wrapping_add(3), 19.0))
        .add_leave("shop_b")?
        .add_terminate()
        // shared line: wait until either workshop can take the job
        .add_generate(Exponential::new(seed.wrapping_add(4), 9.0), 1)
        .add_queue("shared")
        .add_gate(Logic::Eval(free_a) | Logic::Eval(free_b))
        .add_transfer_expr("pick", Logic::Eval(free_a) & Logic::Eval(free_b))
        .add_transfer_expr("use_a", Logic::Eval(free_a))
        .add_transfer_imm("use_b")
        // both free: flip a coin
        .add_transfer_prob("use_a", 0.5, seed.wrapping_add(5))
        .add_label("pick")?
        .add_transfer_imm("use_b")
        // shared jobs through workshop A
        .add_enter("shop_a")?
        .add_label("use_a")?
        .add_depart("shared")?
        .add_advance(Exponential::new(seed.wrapping_add(6), 36.0))
        .add_leave("shop_a")?
        .add_terminate()
        // shared jobs through workshop B
        .add_enter("shop_b")?
        .add_label("use_b")?
        .add_depart("shared")?
        .add_advance(Exponential::new(seed.wrapping_add(7), 35.0))
        .add_leave("shop_b")?
        .add_terminate()
        .build()?;

    let report = sim.launch()?;
    super::emit(&report, json)
}
