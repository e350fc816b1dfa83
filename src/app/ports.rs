//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (servo bus, TCP client link, WiFi, clock, indicator)
//! implement these traits. The [`ControlService`](super::service::ControlService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and every test runs against recording mocks.

use crate::error::{BusError, CommsError};

// ───────────────────────────────────────────────────────────────
// Servo bus port (domain → actuators)
// ───────────────────────────────────────────────────────────────

/// The logical multi-axis actuator bus. One axis write at a time; each call
/// reports success or a transient/hard failure so the dispatcher can apply
/// its bounded-retry discipline.
pub trait ServoBus {
    /// Command an axis to a position in bus units.
    fn set_position(&mut self, axis_id: u8, units: u16) -> Result<(), BusError>;

    /// Set an axis's movement speed.
    fn set_speed(&mut self, axis_id: u8, speed: u8) -> Result<(), BusError>;

    /// De-energise (free) an axis.
    fn release(&mut self, axis_id: u8) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Command link port (client byte stream ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented channel to the single active commander client.
pub trait CommandLink {
    /// True while a client session is open.
    fn client_connected(&self) -> bool;

    /// Read up to `buf.len()` bytes. Returns the number of bytes actually
    /// read; 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CommsError>;

    /// Write a response to the client.
    fn write(&mut self, data: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Network port (domain → radio link)
// ───────────────────────────────────────────────────────────────

/// Which of the two provisioned network profiles to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetProfile {
    Primary,
    Fallback,
}

impl NetProfile {
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Fallback,
            Self::Fallback => Self::Primary,
        }
    }
}

/// Link-level connectivity. Association and stack bring-up live entirely in
/// the adapter; the domain only observes up/down and paces reconnects.
pub trait NetworkPort {
    /// True while the radio link is associated.
    fn link_up(&self) -> bool;

    /// Attempt to (re-)associate using the given profile.
    fn reconnect(&mut self, profile: NetProfile) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Liveness indicator port (domain → two-level output)
// ───────────────────────────────────────────────────────────────

/// Binary liveness indicator. The pattern timing is computed in the core;
/// the adapter just drives the output level.
pub trait IndicatorPort {
    fn set_level(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus the short bounded delay the bus retry uses.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch; never goes backwards.
    fn now_ms(&self) -> u64;

    /// Block for a short, bounded interval.
    fn delay_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, a future
/// telemetry channel, test recorders).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
