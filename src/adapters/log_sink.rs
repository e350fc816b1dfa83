//! Serial-log event sink.
//!
//! The default [`EventSink`]: every structured event becomes one log line.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => info!("event: started in {mode:?}"),
            AppEvent::ModeChanged { from, to } => info!("event: mode {from:?} -> {to:?}"),
            AppEvent::ParametersUpdated(p) => info!(
                "event: parameters period={:.2}s max={:.1}° yaw={:.2}",
                p.period_secs, p.max_angle_deg, p.yaw_bias
            ),
            AppEvent::LinkChanged { from, to } => info!("event: link {from:?} -> {to:?}"),
            AppEvent::FaultRaised(flags) => warn!("event: faults raised 0b{flags:08b}"),
        }
    }
}
