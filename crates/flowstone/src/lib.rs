//! # Flowstone
//!
//! Block-graph discrete-event simulation in the GPSS tradition.
//!
//! A model is a directed graph of blocks — arrival sources, queue counters,
//! finite-capacity storages, timed delays, condition gates, and transfers —
//! traversed by prioritised transactions over simulated time. The engine
//! advances time in jumps dictated by a schedule of future events, keeps
//! time-weighted occupancy statistics on every queue and storage, and
//! renders a summary table at the end of the run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Flowstone                            │
//! │  ┌──────────────┐   ┌─────────────────┐   ┌──────────────┐  │
//! │  │ ModelBuilder │ → │     Kernel      │ → │    Report    │  │
//! │  │ (wiring)     │   │ (event loop)    │   │ (statistics) │  │
//! │  └──────────────┘   └─────────────────┘   └──────────────┘  │
//! │          ↑                    ↑                              │
//! │     flowstone-logic      samplers (rand)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! A single-server queue with deterministic arrivals and service:
//!
//! ```
//! use flowstone::{Constant, ModelBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sim = ModelBuilder::new(10.0)
//!     .add_storage("server", 1)?
//!     .add_generate(Constant::new(1.0), 1)
//!     .add_queue("line")
//!     .add_enter("server")?
//!     .add_depart("line")?
//!     .add_advance(Constant::new(2.0))
//!     .add_leave("server")?
//!     .add_terminate()
//!     .build()?;
//!
//! let report = sim.launch()?;
//! assert_eq!(report.storages[0].max, 1);
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! Gates and conditional transfers take a [`Logic`] expression over
//! [`Probe`]s; build those with the builder's probe helpers and the `&`,
//! `|`, `!` operators:
//!
//! ```ignore
//! let either = Logic::Eval(builder.storage_available("shop_a")?)
//!     | Logic::Eval(builder.storage_available("shop_b")?);
//! builder.add_gate(either)
//! ```

mod builder;
mod error;
mod sampler;

pub use builder::ModelBuilder;
pub use error::BuildError;
pub use sampler::{Constant, Exponential, UniformRange};

// The kernel surface a model author touches.
pub use flowstone_kernel::{
    Expr, Probe, QueueCounter, QueueId, QueueReport, Report, Sampler, Simulation, SimulationError,
    Storage, StorageId, StorageReport, Transaction,
};
pub use flowstone_logic::Logic;
