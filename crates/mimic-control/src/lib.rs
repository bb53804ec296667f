//! `mimic-control` – The coupling algorithm of the teleoperation core.
//!
//! Pure control logic with no threads and no I/O.  The scheduler in
//! `mimic-runtime` feeds one [`CycleInput`][teleop::CycleInput] per cycle and
//! publishes the returned command; everything in this crate is deterministic
//! and unit-testable in isolation.
//!
//! # Modules
//!
//! - [`frame`] – [`FrameTransform`][frame::FrameTransform]:
//!   the fixed rotation relating the master control frame to the slave tool
//!   frame, with the reference `diag(-1, -1, 1)` mapping and validated
//!   construction from raw matrices.
//! - [`clutch`] – [`Clutch`][clutch::Clutch]:
//!   the two-state pedal machine gating coupling, with the inverted wire
//!   polarity handled in one place.
//! - [`teleop`] – [`TeleopController`][teleop::TeleopController]:
//!   the incremental motion integrator that turns master pose deltas into
//!   velocity-scaled slave position commands, plus its
//!   [`TeleopConfig`][teleop::TeleopConfig].

pub mod clutch;
pub mod frame;
pub mod teleop;

pub use clutch::Clutch;
pub use frame::FrameTransform;
pub use teleop::{CycleInput, TeleopConfig, TeleopController};
