//! Actuator dispatch over the shared ICS servo bus.
//!
//! Validates target angles, converts degrees to bus position units, and
//! writes speed-then-position through the [`ServoBus`] port with a bounded,
//! time-boxed retry on transient bus-busy. One logical serial bus, one axis
//! write at a time; a fault on one axis never blocks the next axis in the
//! same frame.
//!
//! Failure semantics are advisory: an out-of-range angle raises
//! `AngleRejected` and skips only that axis's write; an exhausted retry
//! budget raises `ActuatorFault`. Neither aborts the tick.

use log::debug;

use crate::app::ports::{Clock, ServoBus};
use crate::config::SystemConfig;
use crate::error::{BusError, ErrorFlag, ErrorStatus};

// ---------------------------------------------------------------------------
// Axis map
// ---------------------------------------------------------------------------

/// Bus addresses of the robot's actuators.
pub mod axis {
    pub const MOUTH: u8 = 0;
    pub const RIGHT_PITCH: u8 = 1;
    pub const RIGHT_SWEEP: u8 = 2;
    pub const RIGHT_TWIST: u8 = 3;
    pub const LEFT_PITCH: u8 = 4;
    pub const LEFT_SWEEP: u8 = 5;
    pub const LEFT_TWIST: u8 = 6;

    /// Total axis count, mouth included.
    pub const COUNT: u8 = 7;

    /// The twist axes rotate the wing tip and carry a wider limit.
    pub fn is_twist(id: u8) -> bool {
        id == RIGHT_TWIST || id == LEFT_TWIST
    }
}

/// A single-axis target, generated fresh every tick and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorCommand {
    pub axis: u8,
    pub angle_deg: f32,
    pub speed: u8,
}

// ---------------------------------------------------------------------------
// ICS position units
// ---------------------------------------------------------------------------

/// Neutral position on the ICS bus.
pub const ICS_NEUTRAL: u16 = 7500;
/// Bus units per degree: the 3500..=11500 range spans 270°.
pub const ICS_UNITS_PER_DEG: f32 = 8000.0 / 270.0;

/// Convert a validated angle to bus position units, clamped to the bus's
/// physical range.
pub fn deg_to_units(angle_deg: f32) -> u16 {
    let units = f32::from(ICS_NEUTRAL) + angle_deg * ICS_UNITS_PER_DEG;
    units.round().clamp(3500.0, 11500.0) as u16
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct ActuatorDispatcher {
    wing_limit_deg: f32,
    twist_limit_deg: f32,
    retry_limit: u8,
    retry_delay_ms: u32,
}

impl ActuatorDispatcher {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            wing_limit_deg: config.wing_limit_deg,
            twist_limit_deg: config.twist_limit_deg,
            retry_limit: config.bus_retry_limit.max(1),
            retry_delay_ms: config.bus_retry_delay_ms,
        }
    }

    /// The configured angle limit for an axis (degrees, symmetric).
    pub fn limit_for(&self, axis_id: u8) -> f32 {
        if axis::is_twist(axis_id) {
            self.twist_limit_deg
        } else {
            self.wing_limit_deg
        }
    }

    /// Validate and write one axis target. Returns `true` if the position
    /// write reached the bus.
    pub fn apply(
        &self,
        bus: &mut impl ServoBus,
        clock: &impl Clock,
        status: &mut ErrorStatus,
        cmd: ActuatorCommand,
    ) -> bool {
        let limit = self.limit_for(cmd.axis);
        if !cmd.angle_deg.is_finite() || cmd.angle_deg.abs() > limit {
            status.raise(
                ErrorFlag::AngleRejected,
                format_args!("axis {}: angle out of range: {:.1}", cmd.axis, cmd.angle_deg),
            );
            return false;
        }

        if let Err(e) = self.retry(clock, || bus.set_speed(cmd.axis, cmd.speed)) {
            status.raise(
                ErrorFlag::ActuatorFault,
                format_args!("axis {}: speed write failed: {e}", cmd.axis),
            );
            return false;
        }

        let units = deg_to_units(cmd.angle_deg);
        if let Err(e) = self.retry(clock, || bus.set_position(cmd.axis, units)) {
            status.raise(
                ErrorFlag::ActuatorFault,
                format_args!("axis {}: position write failed: {e}", cmd.axis),
            );
            return false;
        }

        debug!("axis {} -> {:.1}° ({units}) @ speed {}", cmd.axis, cmd.angle_deg, cmd.speed);
        true
    }

    /// Apply a whole frame, independently per axis.
    pub fn apply_frame(
        &self,
        bus: &mut impl ServoBus,
        clock: &impl Clock,
        status: &mut ErrorStatus,
        frame: &[ActuatorCommand],
    ) {
        for cmd in frame {
            self.apply(bus, clock, status, *cmd);
        }
    }

    /// De-energise every axis. Release failures are advisory like any other
    /// bus fault.
    pub fn release_all(
        &self,
        bus: &mut impl ServoBus,
        clock: &impl Clock,
        status: &mut ErrorStatus,
    ) {
        for id in 0..axis::COUNT {
            if let Err(e) = self.retry(clock, || bus.release(id)) {
                status.raise(
                    ErrorFlag::ActuatorFault,
                    format_args!("axis {id}: release failed: {e}"),
                );
            }
        }
    }

    /// Bounded retry on transient `Busy`; a hard I/O error aborts at once.
    fn retry(
        &self,
        clock: &impl Clock,
        mut op: impl FnMut() -> Result<(), BusError>,
    ) -> Result<(), BusError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(BusError::Busy) if attempt < self.retry_limit => {
                    attempt += 1;
                    clock.delay_ms(self.retry_delay_ms);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
