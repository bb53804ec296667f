//! `mimic-hal` – Transport-facing seams of the teleoperation core.
//!
//! The control loop never talks to a middleware, a serial port, or a network
//! stack directly.  It talks to the three capability traits defined here, and
//! platform adapters implement them on the outside.
//!
//! # Modules
//!
//! - [`source`] – [`PoseSource`][source::PoseSource] and
//!   [`ClutchSource`][source::ClutchSource]: "most recent value seen so far"
//!   inputs for the master pose, the slave pose, and the clutch pedal.
//! - [`sink`] – [`CommandSink`][sink::CommandSink]: the outbound seam that
//!   receives exactly one slave pose command per control cycle.
//! - [`cell`] – [`LatestCell`][cell::LatestCell]: a thread-safe last-write-wins
//!   slot that adapts callback-style transports onto the source traits.

pub mod cell;
pub mod sink;
pub mod source;

pub use cell::LatestCell;
pub use sink::CommandSink;
pub use source::{ClutchSource, PoseSource};
