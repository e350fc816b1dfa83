//! System configuration parameters
//!
//! All tunable parameters for the Manta controller. There is no persistent
//! storage — the robot always boots with these defaults; a commander adjusts
//! motion at runtime through the wire protocol instead.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the left wing group mirrors the right during oscillating modes.
///
/// The two fielded wing builds disagreed on this, so it is a policy knob
/// rather than a hardcoded choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorPolicy {
    /// Left wing follows the right wing's angles verbatim.
    InPhase,
    /// Left wing receives sign-inverted angles.
    SignInverted,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control loop ---
    /// Motion update interval (milliseconds)
    pub control_tick_ms: u32,

    // --- Angle limits ---
    /// Wing pitch/sweep axes must stay within ±this (degrees)
    pub wing_limit_deg: f32,
    /// Twist axes must stay within ±this (degrees)
    pub twist_limit_deg: f32,

    // --- Motion shape ---
    /// Pitch angle both wings hold in the emergency-surface pose (degrees)
    pub surface_angle_deg: f32,
    /// Twist angle applied during the recovery half of the swim stroke (degrees)
    pub twist_stroke_deg: f32,
    /// Left-wing mirroring policy for Stay/Swim
    pub mirror_policy: MirrorPolicy,

    // --- Servo speeds ---
    /// Baseline servo speed for oscillating motion
    pub base_speed: u8,
    /// Extra speed added at mid-stroke (scaled by |cos 2πφ|)
    pub speed_variation: u8,
    /// Fixed speed for the neutral init pose
    pub init_pose_speed: u8,

    // --- Mouth ---
    /// Mouth-open target angle (degrees)
    pub mouth_open_deg: f32,
    /// Mouth servo update interval (milliseconds)
    pub mouth_update_ms: u32,

    // --- Connectivity ---
    /// TCP port the command server listens on
    pub command_port: u16,
    /// Pause between reconnect attempts while the link is down (milliseconds)
    pub reconnect_interval_ms: u32,
    /// Client considered stalled after this long without a command (milliseconds)
    pub client_timeout_ms: u32,

    // --- Servo bus ---
    /// Retry budget for a single bus write
    pub bus_retry_limit: u8,
    /// Backoff between bus retries (milliseconds)
    pub bus_retry_delay_ms: u32,
}

impl SystemConfig {
    /// Reject a configuration that would violate the motion invariants.
    /// The compiled defaults always pass; this guards configs fed in from
    /// host tooling.
    pub fn validate(&self) -> Result<()> {
        if self.control_tick_ms == 0 {
            return Err(Error::Config("control_tick_ms must be positive"));
        }
        if !(self.wing_limit_deg > 0.0) || !(self.twist_limit_deg > 0.0) {
            return Err(Error::Config("angle limits must be positive"));
        }
        if self.twist_stroke_deg > self.twist_limit_deg {
            return Err(Error::Config("twist_stroke_deg exceeds the twist axis limit"));
        }
        if self.surface_angle_deg > self.wing_limit_deg {
            return Err(Error::Config("surface_angle_deg exceeds the wing axis limit"));
        }
        if self.mouth_open_deg > self.wing_limit_deg {
            return Err(Error::Config("mouth_open_deg exceeds the wing axis limit"));
        }
        if self.bus_retry_limit == 0 {
            return Err(Error::Config("bus_retry_limit must be at least 1"));
        }
        Ok(())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Control loop
            control_tick_ms: 20, // 50 Hz

            // Angle limits
            wing_limit_deg: 45.0,
            twist_limit_deg: 95.0,

            // Motion shape
            surface_angle_deg: 30.0,
            twist_stroke_deg: 90.0,
            mirror_policy: MirrorPolicy::InPhase,

            // Servo speeds
            base_speed: 60,
            speed_variation: 40,
            init_pose_speed: 80,

            // Mouth
            mouth_open_deg: 30.0,
            mouth_update_ms: 100,

            // Connectivity
            command_port: 8888,
            reconnect_interval_ms: 5000,
            client_timeout_ms: 5000,

            // Servo bus
            bus_retry_limit: 5,
            bus_retry_delay_ms: 1,
        }
    }
}
