use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rigid transform of a manipulator body: translation plus unit-quaternion
/// rotation, both in `f64`.
///
/// The rotation is expected to stay a valid element of SO(3); call
/// [`Pose::renormalized`] after composing rotations so floating-point drift
/// never accumulates into the commanded orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    /// Create a pose from a translation and a rotation.
    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The neutral pose: zero translation, identity rotation.
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Return this pose with its rotation explicitly re-normalized.
    pub fn renormalized(self) -> Self {
        Self {
            translation: self.translation,
            rotation: UnitQuaternion::new_normalize(self.rotation.into_inner()),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Clutch pedal state as seen by the coupling logic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClutchState {
    /// Pedal held: master→slave coupling is frozen.
    Engaged,
    /// Pedal released (or never reported): coupling is active.
    #[default]
    Disengaged,
}

impl ClutchState {
    /// Derive the clutch state from the raw pedal boolean.
    ///
    /// Pedal polarity is inverted on the wire: `false` (or no signal yet)
    /// couples motion, `true` freezes it.
    pub fn from_signal(signal: Option<bool>) -> Self {
        match signal {
            Some(true) => ClutchState::Engaged,
            _ => ClutchState::Disengaged,
        }
    }

    /// `true` when master motion should be applied to the slave.
    pub fn coupling_active(self) -> bool {
        matches!(self, ClutchState::Disengaged)
    }
}

/// Global error type spanning configuration rejection, command-sink faults,
/// and scheduler failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum MimicError {
    #[error("Invalid Configuration: {0}")]
    InvalidConfig(String),

    #[error("Command Sink Fault on {component}: {details}")]
    Sink { component: String, details: String },

    #[error("Scheduler Error: {0}")]
    Scheduler(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Quaternion;

    #[test]
    fn identity_pose_is_neutral() {
        let pose = Pose::identity();
        assert!(pose.translation.norm() < f64::EPSILON);
        assert!(pose.rotation.angle() < f64::EPSILON);
    }

    #[test]
    fn default_pose_equals_identity() {
        assert_eq!(Pose::default(), Pose::identity());
    }

    #[test]
    fn pose_serialization_roundtrip() {
        let pose = Pose::new(
            Vector3::new(0.1, -0.2, 0.3),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5),
        );
        let json = serde_json::to_string(&pose).unwrap();
        let back: Pose = serde_json::from_str(&json).unwrap();
        assert!((pose.translation - back.translation).norm() < 1e-12);
        assert!(pose.rotation.angle_to(&back.rotation) < 1e-12);
    }

    #[test]
    fn renormalized_restores_unit_rotation() {
        // A drifted quaternion with |q| != 1, as repeated composition produces.
        let drifted = UnitQuaternion::new_unchecked(Quaternion::new(1.02, 0.0, 0.0, 0.1));
        let pose = Pose::new(Vector3::zeros(), drifted).renormalized();
        assert!((pose.rotation.quaternion().norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clutch_couples_when_signal_is_false() {
        let state = ClutchState::from_signal(Some(false));
        assert_eq!(state, ClutchState::Disengaged);
        assert!(state.coupling_active());
    }

    #[test]
    fn clutch_couples_before_any_signal() {
        let state = ClutchState::from_signal(None);
        assert_eq!(state, ClutchState::Disengaged);
        assert!(state.coupling_active());
    }

    #[test]
    fn clutch_freezes_when_pedal_held() {
        let state = ClutchState::from_signal(Some(true));
        assert_eq!(state, ClutchState::Engaged);
        assert!(!state.coupling_active());
    }

    #[test]
    fn clutch_state_serialization_roundtrip() {
        let state = ClutchState::Engaged;
        let json = serde_json::to_string(&state).unwrap();
        let back: ClutchState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn mimic_error_display() {
        let err = MimicError::InvalidConfig("control period must be at least 1 ms".to_string());
        assert!(err.to_string().contains("Invalid Configuration"));

        let err2 = MimicError::Sink {
            component: "slave_arm".to_string(),
            details: "transport closed".to_string(),
        };
        assert!(err2.to_string().contains("slave_arm"));
    }
}
