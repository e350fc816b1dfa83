//! Shared mutable context threaded through the control loop.
//!
//! `ControlContext` is the single struct the command protocol writes into,
//! the link watchdog overrides, and the motion controller reads from. Think
//! of it as the "blackboard" in a blackboard architecture: one owner, passed
//! by `&mut`, no statics.

use crate::config::SystemConfig;
use crate::error::ErrorStatus;

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// The discrete operating mode governing which motion generator runs.
/// Numeric codes are the wire protocol's set-mode selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    ServoOff = 0,
    InitPose = 1,
    Stay = 2,
    Swim = 3,
    Raise = 4,
    EmergencySurface = 5,
}

impl Mode {
    /// Decode a wire selector. `None` for anything outside 0..=5.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ServoOff),
            1 => Some(Self::InitPose),
            2 => Some(Self::Stay),
            3 => Some(Self::Swim),
            4 => Some(Self::Raise),
            5 => Some(Self::EmergencySurface),
            _ => None,
        }
    }

    /// The numeric code reported in the status frame.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Wing selector (Raise mode)
// ---------------------------------------------------------------------------

/// Which wing group a static Raise pose applies to.
/// Numeric codes are the wire protocol's wing selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WingSelector {
    Both = 0,
    Right = 1,
    Left = 2,
}

impl WingSelector {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Both),
            1 => Some(Self::Right),
            2 => Some(Self::Left),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Motion parameters
// ---------------------------------------------------------------------------

/// Commander-supplied motion tuning, published wholesale by a successful
/// set-parameters command. Range validation happens at the protocol boundary,
/// so consumers may assume `period_secs > 0` and the angles within limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParameters {
    /// Duration of one flap cycle (seconds). Always positive.
    pub period_secs: f32,
    /// Wing direction angle: how the flap splits between pitch and sweep (degrees).
    pub base_angle_deg: f32,
    /// Peak flap amplitude (degrees).
    pub max_angle_deg: f32,
    /// Left/right amplitude bias in [-1, 1]; positive favours the right wing.
    pub yaw_bias: f32,
    /// Reversed stroke: twist during the opposite half-cycle.
    pub backward: bool,
}

impl Default for MotionParameters {
    fn default() -> Self {
        // A gentle neutral gait, so oscillating modes entered before any
        // set-parameters command behave instead of dividing by zero.
        Self {
            period_secs: 1.0,
            base_angle_deg: 0.0,
            max_angle_deg: 0.0,
            yaw_bias: 0.0,
            backward: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

/// The shared state every core component reads or writes.
pub struct ControlContext {
    /// Current operating mode. Written by the protocol (explicit command)
    /// and the link watchdog (safety override); read by the motion controller.
    pub mode: Mode,
    /// Latest published motion parameters.
    pub params: MotionParameters,
    /// Wing group selection for Raise.
    pub wing_selector: WingSelector,
    /// Mouth actuator demand.
    pub mouth_open: bool,
    /// Sticky advisory flags + last message.
    pub status: ErrorStatus,
    /// Monotonic timestamp of the last fully processed client command.
    /// `None` until the first command arrives.
    pub last_command_ms: Option<u64>,
    /// System configuration (tunables).
    pub config: SystemConfig,
}

impl ControlContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            mode: Mode::InitPose,
            params: MotionParameters::default(),
            wing_selector: WingSelector::Both,
            mouth_open: false,
            status: ErrorStatus::new(),
            last_command_ms: None,
            config,
        }
    }

    /// Switch mode, returning the mode that was current before the call.
    pub fn set_mode(&mut self, mode: Mode) -> Mode {
        core::mem::replace(&mut self.mode, mode)
    }
}
