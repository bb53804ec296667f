//! [`TeleopController`] – the incremental master→slave motion integrator.
//!
//! Implements the per-cycle coupling algorithm of the teleoperation core.
//! Each call to [`TeleopController::step`]:
//!
//! 1. **Clutch** – feed the raw pedal boolean to the [`Clutch`] machine and
//!    derive the coupling flag.
//! 2. **Hold** – if coupling is frozen, re-issue the live slave pose
//!    unchanged, so the sink keeps receiving fresh commands at the control
//!    rate even while clutched.
//! 3. **Couple** – otherwise accumulate: start from the previous cycle's
//!    command (or re-sync to the live slave pose when coupling has just
//!    re-activated), add the frame-mapped, scaled master translation delta,
//!    and track the master's absolute orientation through the frame.
//! 4. **Retain** – remember the master pose and the emitted command for the
//!    next cycle.
//!
//! Translation is deliberately unbounded: there is no velocity or
//! displacement clamp, and the motion scale is explicit configuration.
//!
//! # Example
//!
//! ```rust
//! use mimic_control::frame::FrameTransform;
//! use mimic_control::teleop::{CycleInput, TeleopConfig, TeleopController};
//! use mimic_types::Pose;
//! use nalgebra::Vector3;
//!
//! let config = TeleopConfig {
//!     frame: FrameTransform::identity(),
//!     ..TeleopConfig::default()
//! };
//! let mut controller = TeleopController::new(config).expect("config is valid");
//!
//! // Cycle 1 synchronises with the slave; cycle 2 applies the master delta.
//! let slave = Pose::identity();
//! let mut master = Pose::identity();
//! controller.step(CycleInput {
//!     master: Some(master),
//!     slave: Some(slave),
//!     clutch: Some(false),
//! });
//!
//! master.translation = Vector3::new(0.01, 0.0, 0.0);
//! let command = controller.step(CycleInput {
//!     master: Some(master),
//!     slave: Some(slave),
//!     clutch: Some(false),
//! });
//! assert!((command.translation.x - 0.01).abs() < 1e-12);
//! ```

use std::time::Duration;

use mimic_types::{ClutchState, MimicError, Pose};
use serde::{Deserialize, Serialize};

use crate::clutch::Clutch;
use crate::frame::FrameTransform;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Control period of the reference system: 20 ms (50 Hz).
pub const DEFAULT_PERIOD_MS: u64 = 20;

/// Master translation deltas map 1:1 onto the slave by default.
pub const DEFAULT_MOTION_SCALE: f64 = 1.0;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`TeleopController`].
///
/// All fields have serde defaults, so an embedding process can deserialize a
/// partial table and inherit the reference-system values for the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleopConfig {
    /// Control period in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// Scale applied to master translation deltas before the frame mapping.
    #[serde(default = "default_motion_scale")]
    pub motion_scale: f64,
    /// Fixed rotation from the master control frame to the slave tool frame.
    #[serde(default = "default_frame")]
    pub frame: FrameTransform,
}

fn default_period_ms() -> u64 {
    DEFAULT_PERIOD_MS
}

fn default_motion_scale() -> f64 {
    DEFAULT_MOTION_SCALE
}

fn default_frame() -> FrameTransform {
    FrameTransform::mirror_xy()
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            motion_scale: DEFAULT_MOTION_SCALE,
            frame: FrameTransform::mirror_xy(),
        }
    }
}

impl TeleopConfig {
    /// Check the configuration for values the controller cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`MimicError::InvalidConfig`] if the period is zero or the
    /// motion scale is non-finite or not strictly positive.
    pub fn validate(&self) -> Result<(), MimicError> {
        if self.period_ms == 0 {
            return Err(MimicError::InvalidConfig(
                "control period must be at least 1 ms".to_string(),
            ));
        }
        if !self.motion_scale.is_finite() || self.motion_scale <= 0.0 {
            return Err(MimicError::InvalidConfig(format!(
                "motion scale must be finite and positive, got {}",
                self.motion_scale
            )));
        }
        Ok(())
    }

    /// The control period as a [`Duration`].
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cycle input
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of the freshest input data available at the start of a cycle.
///
/// Every field is the last value its source has seen, or `None` before the
/// first sample.  Missing data never skips a cycle; the controller falls back
/// to identity poses and the initial clutch state.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleInput {
    /// Latest master manipulator pose.
    pub master: Option<Pose>,
    /// Latest slave manipulator pose.
    pub slave: Option<Pose>,
    /// Latest raw clutch pedal boolean (wire polarity: `true` = pedal held).
    pub clutch: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TeleopController
// ─────────────────────────────────────────────────────────────────────────────

/// Maps master manipulator motion onto slave pose commands, one cycle at a
/// time.
///
/// The controller's only memory between cycles is the previous master pose,
/// the previous emitted command, and the previous coupling flag.  It performs
/// no I/O and never fails mid-cycle; every [`step`][TeleopController::step]
/// produces exactly one command.
pub struct TeleopController {
    config: TeleopConfig,
    clutch: Clutch,
    /// Master pose seen on the previous cycle; `None` until the first sample.
    prev_master: Option<Pose>,
    /// Command emitted on the previous cycle; the accumulation base while
    /// coupling stays active.
    last_command: Pose,
    /// Coupling flag of the previous cycle, for re-engage detection.
    was_coupling: bool,
}

impl TeleopController {
    /// Construct a controller from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MimicError::InvalidConfig`] if [`TeleopConfig::validate`]
    /// rejects the configuration.
    pub fn new(config: TeleopConfig) -> Result<Self, MimicError> {
        config.validate()?;
        Ok(Self {
            config,
            clutch: Clutch::new(),
            prev_master: None,
            last_command: Pose::identity(),
            was_coupling: false,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &TeleopConfig {
        &self.config
    }

    /// The clutch state as of the most recent cycle.
    pub fn clutch_state(&self) -> ClutchState {
        self.clutch.state()
    }

    /// Run one control cycle and return the slave pose command to emit.
    pub fn step(&mut self, input: CycleInput) -> Pose {
        let coupling = self.clutch.update(input.clutch).coupling_active();
        let master = input.master.unwrap_or_default();
        let slave = input.slave.unwrap_or_default();

        let command = if coupling {
            // Re-sync with the live slave pose whenever coupling (re-)activates;
            // between edges the previous command is the accumulation base.
            let base = if self.was_coupling {
                self.last_command
            } else {
                slave
            };
            // The first master sample ever seen yields zero displacement.
            let prev = self.prev_master.unwrap_or(master);
            let delta = master.translation - prev.translation;
            let translation = base.translation
                + self
                    .config
                    .frame
                    .apply_vector(&(delta * self.config.motion_scale));
            let rotation = self.config.frame.apply_rotation(&master.rotation);
            Pose::new(translation, rotation).renormalized()
        } else {
            // Hold: re-issue the live slave pose at the control rate.
            slave
        };

        if input.master.is_some() {
            self.prev_master = input.master;
        }
        self.was_coupling = coupling;
        self.last_command = command;
        command
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
