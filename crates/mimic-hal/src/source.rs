//! Input source traits for pose and clutch feeds.
//!
//! Upstream transports deliver master poses, slave poses, and the clutch
//! boolean asynchronously on their own threads.  The control loop only ever
//! needs the freshest value, so both traits expose a single non-blocking
//! `latest` call.  Adapters can be swapped without touching the control logic.

use mimic_types::Pose;

/// A feed of manipulator poses with last-write-wins semantics.
///
/// Implementations must never block: `latest` returns whatever has been seen
/// so far, or `None` before the first sample arrives.
pub trait PoseSource: Send + Sync {
    /// The most recent pose seen so far, or `None` before the first sample.
    fn latest(&self) -> Option<Pose>;
}

/// A feed of raw clutch pedal booleans.
///
/// The boolean carries the wire polarity: `true` means the pedal is held.
/// Interpreting it is the job of
/// [`ClutchState::from_signal`][mimic_types::ClutchState::from_signal], not of
/// the transport.
pub trait ClutchSource: Send + Sync {
    /// The most recent pedal boolean, or `None` before the first message.
    fn latest(&self) -> Option<bool>;
}
