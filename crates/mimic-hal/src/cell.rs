//! [`LatestCell`] – thread-safe last-write-wins value slot.
//!
//! Callback-driven transports (middleware subscriptions, serial readers)
//! produce values on their own threads at their own rate, while the control
//! loop reads exactly once per cycle.  `LatestCell` bridges the two worlds:
//! every `publish` overwrites the slot, every `latest` returns a copy of the
//! newest value, and no history is queued.  Cloning the cell clones the
//! handle, not the value; all clones share one slot.
//!
//! # Example
//!
//! ```rust
//! use mimic_hal::LatestCell;
//! use mimic_types::Pose;
//!
//! let cell: LatestCell<Pose> = LatestCell::new();
//! let writer = cell.clone();
//!
//! assert!(cell.latest().is_none());
//! writer.publish(Pose::identity());
//! assert!(cell.latest().is_some());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use mimic_types::Pose;

use crate::source::{ClutchSource, PoseSource};

/// A shared slot holding the most recent value published to it.
///
/// Writers call [`LatestCell::publish`] from any thread; readers call
/// [`LatestCell::latest`] and receive a copy of the newest value, or `None`
/// if nothing has ever been published.  Intermediate values that were
/// overwritten before being read are dropped silently, which is exactly the
/// staleness model the control loop expects.
pub struct LatestCell<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> LatestCell<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Store `value` as the newest sample, replacing any previous one.
    pub fn publish(&self, value: T) {
        *self.lock() = Some(value);
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A writer panic poisons the mutex, but the slot contents stay valid.
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<T: Clone> LatestCell<T> {
    /// Return a copy of the newest value, or `None` before the first publish.
    pub fn latest(&self) -> Option<T> {
        self.lock().clone()
    }
}

impl<T> Clone for LatestCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for LatestCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseSource for LatestCell<Pose> {
    fn latest(&self) -> Option<Pose> {
        LatestCell::latest(self)
    }
}

impl ClutchSource for LatestCell<bool> {
    fn latest(&self) -> Option<bool> {
        LatestCell::latest(self)
    }
}
