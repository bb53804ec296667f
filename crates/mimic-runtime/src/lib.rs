//! `mimic-runtime` – The fixed-rate execution engine of the teleoperation
//! core.
//!
//! Hosts the scheduler thread that turns the pure control logic of
//! `mimic-control` into a running system: one read → step → publish cycle per
//! configured period, with lifecycle control, cycle statistics, and tracing
//! initialisation for the embedding process.
//!
//! # Modules
//!
//! - [`scheduler`] – [`ControlLoop`][scheduler::ControlLoop] and
//!   [`LoopHandle`][scheduler::LoopHandle]:
//!   the dedicated control thread with absolute-deadline pacing, overrun
//!   re-basing, and between-cycle shutdown.
//! - [`stats`] – [`LoopStats`][stats::LoopStats]:
//!   point-in-time cycle statistics (cycles, overruns, sink errors, cycle
//!   durations), readable from any thread while the loop runs.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   installs the global `tracing` subscriber, honouring `RUST_LOG` and
//!   `MIMIC_LOG_FORMAT=json`.

pub mod scheduler;
pub mod stats;
pub mod telemetry;

pub use scheduler::{ControlLoop, LoopHandle, LoopState};
pub use stats::LoopStats;
pub use telemetry::init_tracing;
