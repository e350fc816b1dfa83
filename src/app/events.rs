//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — log to serial, forward to a telemetry
//! channel, record in tests.

use super::context::{Mode, MotionParameters};
use crate::link::LinkState;

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(Mode),

    /// The operating mode changed, by command or safety override.
    ModeChanged { from: Mode, to: Mode },

    /// A set-parameters command was accepted and published.
    ParametersUpdated(MotionParameters),

    /// The link watchdog observed a connectivity transition.
    LinkChanged { from: LinkState, to: LinkState },

    /// One or more advisory flags were raised this tick (bitmask).
    FaultRaised(u8),
}
