//! Outbound command seam.
//!
//! The scheduler hands every computed slave pose to a [`CommandSink`].  What
//! happens next (middleware publish, serial write, simulator injection) is the
//! adapter's business; the control loop only cares that the command was
//! accepted or that the failure is reportable.

use mimic_types::{MimicError, Pose};

/// Receiver of the per-cycle slave pose command.
///
/// The scheduler calls [`CommandSink::send`] exactly once per control cycle,
/// including hold cycles.  A failing sink does not stop the loop: the error is
/// logged and counted, and the next cycle proceeds normally.
pub trait CommandSink: Send + Sync {
    /// Stable identifier for this sink, e.g. `"slave_arm"`, used in fault
    /// reports and logs.
    fn id(&self) -> &str;

    /// Transmit one slave pose command.
    ///
    /// # Errors
    ///
    /// Returns [`MimicError::Sink`] if the command cannot be delivered
    /// (e.g. the downstream transport has closed).
    fn send(&mut self, command: Pose) -> Result<(), MimicError>;
}
