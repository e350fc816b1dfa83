//! Mode dispatch and per-mode motion generation.
//!
//! On every control tick the [`MotionController`] reads the latest
//! commanded mode and parameters from the shared context and computes a
//! fresh frame of actuator targets for it. Generation is a plain `match`
//! over [`Mode`] — one generator per mode, no hierarchy.
//!
//! ```text
//!  ControlContext ──▶ MotionController ──▶ ActuatorDispatcher ──▶ ServoBus
//!   (mode, params)      CycleTimer · TrajectoryInterpolator
//! ```
//!
//! The cycle timer's epoch resets whenever a mode is (re-)entered or the
//! commanded period changes, so the phase always starts at 0 after such a
//! transition. Interpolator coefficients are recomputed only when the
//! active pattern's identity changes, never per tick.

pub mod cycle;
pub mod patterns;
pub mod spline;

use core::f32::consts::TAU;

use crate::app::context::{ControlContext, Mode, MotionParameters, WingSelector};
use crate::app::ports::{Clock, ServoBus};
use crate::bus::{axis, ActuatorCommand, ActuatorDispatcher};
use crate::config::{MirrorPolicy, SystemConfig};
use cycle::CycleTimer;
use patterns::{PatternPoint, STAY_WAVE, SWIM_WAVE};
use spline::TrajectoryInterpolator;

/// Number of wing axes in a full frame (mouth handled separately).
const WING_AXES: usize = 6;

pub struct MotionController {
    dispatcher: ActuatorDispatcher,
    interp: TrajectoryInterpolator,
    /// Identity of the pattern the interpolator was last fitted with.
    fitted: Option<&'static [PatternPoint]>,
    timer: CycleTimer,
    last_mode: Option<Mode>,
    last_mouth_ms: Option<u64>,
}

impl MotionController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            dispatcher: ActuatorDispatcher::new(config),
            interp: TrajectoryInterpolator::new(),
            fitted: None,
            timer: CycleTimer::new(),
            last_mode: None,
            last_mouth_ms: None,
        }
    }

    /// Compute and apply one motion frame for the current mode.
    pub fn update(&mut self, ctx: &mut ControlContext, bus: &mut impl ServoBus, clock: &impl Clock) {
        let now = clock.now_ms();
        let mode = ctx.mode;
        let params = ctx.params;

        // Phase restarts from 0 on every mode (re-)entry and whenever the
        // commanded period changes out from under a running oscillation.
        if self.last_mode != Some(mode) {
            self.last_mode = Some(mode);
            self.timer.start(now, params.period_secs);
        } else if (self.timer.period_secs() - params.period_secs).abs() > f32::EPSILON {
            self.timer.start(now, params.period_secs);
        }

        match mode {
            Mode::ServoOff => {
                self.dispatcher.release_all(bus, clock, &mut ctx.status);
                return; // no position writes, mouth included
            }
            Mode::InitPose => {
                let frame = init_pose_frame(ctx.config.init_pose_speed);
                self.dispatcher.apply_frame(bus, clock, &mut ctx.status, &frame);
            }
            Mode::Stay => {
                self.ensure_pattern(STAY_WAVE);
                let phase = self.timer.phase(now);
                let wave = self.interp.evaluate(phase);
                let frame = stay_frame(&params, &ctx.config, phase, wave);
                self.dispatcher.apply_frame(bus, clock, &mut ctx.status, &frame);
            }
            Mode::Swim => {
                self.ensure_pattern(SWIM_WAVE);
                let phase = self.timer.phase(now);
                let wave = self.interp.evaluate(phase);
                let frame = swim_frame(&params, &ctx.config, phase, wave);
                self.dispatcher.apply_frame(bus, clock, &mut ctx.status, &frame);
            }
            Mode::Raise => {
                let frame = raise_frame(&params, &ctx.config, ctx.wing_selector);
                self.dispatcher.apply_frame(bus, clock, &mut ctx.status, &frame);
            }
            Mode::EmergencySurface => {
                let frame = surface_frame(&ctx.config);
                self.dispatcher.apply_frame(bus, clock, &mut ctx.status, &frame);
            }
        }

        self.update_mouth(ctx, bus, clock, now);
    }

    /// Drive the mouth servo at its own slower cadence, independent of mode.
    fn update_mouth(
        &mut self,
        ctx: &mut ControlContext,
        bus: &mut impl ServoBus,
        clock: &impl Clock,
        now: u64,
    ) {
        let due = match self.last_mouth_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= u64::from(ctx.config.mouth_update_ms),
        };
        if !due {
            return;
        }
        self.last_mouth_ms = Some(now);

        let angle = if ctx.mouth_open {
            ctx.config.mouth_open_deg
        } else {
            0.0
        };
        let cmd = ActuatorCommand {
            axis: axis::MOUTH,
            angle_deg: angle,
            speed: ctx.config.base_speed,
        };
        self.dispatcher.apply(bus, clock, &mut ctx.status, cmd);
    }

    /// Re-fit the interpolator only when the active pattern changes identity.
    fn ensure_pattern(&mut self, pattern: &'static [PatternPoint]) {
        let same = self.fitted.is_some_and(|p| core::ptr::eq(p, pattern));
        if !same {
            self.interp.fit(pattern);
            self.fitted = Some(pattern);
        }
    }
}

// ---------------------------------------------------------------------------
// Frame generators (pure)
// ---------------------------------------------------------------------------

/// Servo speed over the stroke: slowest at stroke reversal, fastest
/// mid-stroke.
fn stroke_speed(config: &SystemConfig, phase: f32) -> u8 {
    let factor = (TAU * phase).cos().abs();
    config
        .base_speed
        .saturating_add((f32::from(config.speed_variation) * factor) as u8)
}

/// Mirror the right wing's component pair onto the left per policy.
fn mirror(policy: MirrorPolicy, pitch: f32, sweep: f32) -> (f32, f32) {
    match policy {
        MirrorPolicy::InPhase => (pitch, sweep),
        MirrorPolicy::SignInverted => (-pitch, -sweep),
    }
}

fn wing_frame(
    right_pitch: f32,
    right_sweep: f32,
    right_twist: f32,
    left_pitch: f32,
    left_sweep: f32,
    left_twist: f32,
    speed: u8,
) -> [ActuatorCommand; WING_AXES] {
    [
        ActuatorCommand { axis: axis::RIGHT_PITCH, angle_deg: right_pitch, speed },
        ActuatorCommand { axis: axis::RIGHT_SWEEP, angle_deg: right_sweep, speed },
        ActuatorCommand { axis: axis::RIGHT_TWIST, angle_deg: right_twist, speed },
        ActuatorCommand { axis: axis::LEFT_PITCH, angle_deg: left_pitch, speed },
        ActuatorCommand { axis: axis::LEFT_SWEEP, angle_deg: left_sweep, speed },
        ActuatorCommand { axis: axis::LEFT_TWIST, angle_deg: left_twist, speed },
    ]
}

/// Neutral pose at a fixed moderate speed. Repeated application is harmless.
fn init_pose_frame(speed: u8) -> [ActuatorCommand; WING_AXES] {
    wing_frame(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, speed)
}

/// Low-amplitude holding oscillation: the flap wave split into pitch and
/// sweep components by the wing direction angle, applied symmetrically.
fn stay_frame(
    params: &MotionParameters,
    config: &SystemConfig,
    phase: f32,
    wave: f32,
) -> [ActuatorCommand; WING_AXES] {
    let theta = params.base_angle_deg.to_radians();
    let pitch = params.max_angle_deg * theta.sin() * wave;
    let sweep = params.max_angle_deg * theta.cos() * wave;
    let (left_pitch, left_sweep) = mirror(config.mirror_policy, pitch, sweep);
    let speed = stroke_speed(config, phase);
    wing_frame(pitch, sweep, 0.0, left_pitch, left_sweep, 0.0, speed)
}

/// Propulsive gait: amplitude split left/right by yaw bias, with the twist
/// axes feathering the wing during the recovery half-stroke.
fn swim_frame(
    params: &MotionParameters,
    config: &SystemConfig,
    phase: f32,
    wave: f32,
) -> [ActuatorCommand; WING_AXES] {
    let theta = params.base_angle_deg.to_radians();
    let pitch_unit = theta.sin() * wave;
    let sweep_unit = theta.cos() * wave;

    let right_amp = params.max_angle_deg * (1.0 + params.yaw_bias) / 2.0;
    let left_amp = params.max_angle_deg * (1.0 - params.yaw_bias) / 2.0;

    // The sweep reverses where cos(2πφ) changes sign; feather the wing
    // through whichever half-cycle is the recovery stroke.
    let reversal = (TAU * phase).cos();
    let in_recovery = if params.backward {
        reversal > 0.0
    } else {
        reversal < 0.0
    };
    let twist = if in_recovery {
        config.twist_stroke_deg
    } else {
        0.0
    };

    let (left_pitch, left_sweep) =
        mirror(config.mirror_policy, left_amp * pitch_unit, left_amp * sweep_unit);
    let speed = stroke_speed(config, phase);
    wing_frame(
        right_amp * pitch_unit,
        right_amp * sweep_unit,
        twist,
        left_pitch,
        left_sweep,
        twist,
        speed,
    )
}

/// Static asymmetric pose: the selected side's sweep axis lifts to the
/// commanded amplitude, everything else holds neutral.
fn raise_frame(
    params: &MotionParameters,
    config: &SystemConfig,
    wing: WingSelector,
) -> [ActuatorCommand; WING_AXES] {
    let lift = params.max_angle_deg;
    let (right_sweep, left_sweep) = match wing {
        WingSelector::Right => (lift, 0.0),
        WingSelector::Left => (0.0, lift),
        WingSelector::Both => (lift, lift),
    };
    wing_frame(0.0, right_sweep, 0.0, 0.0, left_sweep, 0.0, config.base_speed)
}

/// Fixed surface pose: both wings pitched up, everything else neutral.
/// Ignores commanded parameters entirely.
fn surface_frame(config: &SystemConfig) -> [ActuatorCommand; WING_AXES] {
    wing_frame(
        config.surface_angle_deg,
        0.0,
        0.0,
        config.surface_angle_deg,
        0.0,
        0.0,
        config.base_speed,
    )
}
