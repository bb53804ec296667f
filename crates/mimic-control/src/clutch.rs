//! [`Clutch`] – pedal state machine gating master→slave coupling.
//!
//! Two states, one external input, no debouncing and no hysteresis: the raw
//! pedal boolean read at the top of each cycle fully determines the state.
//! Before the first message ever arrives the clutch reports
//! [`ClutchState::Disengaged`], which couples motion; the wire polarity is
//! inverted and encoded once in
//! [`ClutchState::from_signal`][mimic_types::ClutchState::from_signal].
//!
//! State edges are logged at debug level for operator diagnosis; logging has
//! no effect on control flow.

use mimic_types::ClutchState;
use tracing::debug;

/// Tracks the operator's clutch pedal across control cycles.
#[derive(Debug)]
pub struct Clutch {
    state: ClutchState,
}

impl Clutch {
    /// Create a clutch in its initial state: coupling active.
    pub fn new() -> Self {
        Self {
            state: ClutchState::Disengaged,
        }
    }

    /// Feed the raw pedal boolean for this cycle and return the new state.
    ///
    /// `None` means no pedal message has ever arrived, which keeps the clutch
    /// in its initial coupling-active state.
    pub fn update(&mut self, signal: Option<bool>) -> ClutchState {
        let next = ClutchState::from_signal(signal);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "clutch transition");
        }
        self.state = next;
        next
    }

    /// The state as of the most recent [`Clutch::update`].
    pub fn state(&self) -> ClutchState {
        self.state
    }

    /// `true` when master motion should currently drive the slave.
    pub fn coupling_active(&self) -> bool {
        self.state.coupling_active()
    }
}

impl Default for Clutch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_couples_motion() {
        let clutch = Clutch::new();
        assert_eq!(clutch.state(), ClutchState::Disengaged);
        assert!(clutch.coupling_active());
    }

    #[test]
    fn pedal_held_freezes_coupling() {
        let mut clutch = Clutch::new();
        assert_eq!(clutch.update(Some(true)), ClutchState::Engaged);
        assert!(!clutch.coupling_active());
    }

    #[test]
    fn pedal_release_restores_coupling() {
        let mut clutch = Clutch::new();
        clutch.update(Some(true));
        assert_eq!(clutch.update(Some(false)), ClutchState::Disengaged);
        assert!(clutch.coupling_active());
    }

    #[test]
    fn missing_signal_keeps_initial_coupling() {
        let mut clutch = Clutch::new();
        assert_eq!(clutch.update(None), ClutchState::Disengaged);
        assert!(clutch.coupling_active());
    }

    #[test]
    fn repeated_signal_is_edge_free() {
        let mut clutch = Clutch::new();
        clutch.update(Some(true));
        clutch.update(Some(true));
        clutch.update(Some(true));
        assert_eq!(clutch.state(), ClutchState::Engaged);
    }
}
