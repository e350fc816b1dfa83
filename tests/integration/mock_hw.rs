//! Mock hardware adapter for integration tests.
//!
//! Records every servo-bus call and client response so tests can assert on
//! the full command history without touching real UART/GPIO, plus a
//! hand-cranked clock so scenarios control time explicitly.

use std::cell::Cell;
use std::collections::VecDeque;

use manta::app::events::AppEvent;
use manta::app::ports::{
    Clock, CommandLink, EventSink, IndicatorPort, NetProfile, NetworkPort, ServoBus,
};
use manta::error::{BusError, CommsError};

// ── Servo-bus call record ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusCall {
    Speed { axis: u8, speed: u8 },
    Position { axis: u8, units: u16 },
    Release { axis: u8 },
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub client: bool,
    pub link: bool,
    pub accept_reconnect: bool,
    pub reconnect_attempts: Vec<NetProfile>,
    pub bus_calls: Vec<BusCall>,
    pub led_levels: Vec<bool>,
}

#[allow(dead_code)]
impl MockHardware {
    /// Link up, client connected — the common happy path.
    pub fn online() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            client: true,
            link: true,
            accept_reconnect: true,
            reconnect_attempts: Vec::new(),
            bus_calls: Vec::new(),
            led_levels: Vec::new(),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Most recent commanded position of an axis, in bus units.
    pub fn last_position(&self, axis: u8) -> Option<u16> {
        self.bus_calls.iter().rev().find_map(|c| match c {
            BusCall::Position { axis: a, units } if *a == axis => Some(*units),
            _ => None,
        })
    }

    pub fn released_axes(&self) -> Vec<u8> {
        self.bus_calls
            .iter()
            .filter_map(|c| match c {
                BusCall::Release { axis } => Some(*axis),
                _ => None,
            })
            .collect()
    }

    pub fn clear_recordings(&mut self) {
        self.bus_calls.clear();
        self.tx.clear();
    }
}

impl ServoBus for MockHardware {
    fn set_position(&mut self, axis_id: u8, units: u16) -> Result<(), BusError> {
        self.bus_calls.push(BusCall::Position {
            axis: axis_id,
            units,
        });
        Ok(())
    }
    fn set_speed(&mut self, axis_id: u8, speed: u8) -> Result<(), BusError> {
        self.bus_calls.push(BusCall::Speed {
            axis: axis_id,
            speed,
        });
        Ok(())
    }
    fn release(&mut self, axis_id: u8) -> Result<(), BusError> {
        self.bus_calls.push(BusCall::Release { axis: axis_id });
        Ok(())
    }
}

impl CommandLink for MockHardware {
    fn client_connected(&self) -> bool {
        self.client
    }
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CommsError> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
    fn write(&mut self, data: &[u8]) -> Result<(), CommsError> {
        self.tx.extend_from_slice(data);
        Ok(())
    }
}

impl NetworkPort for MockHardware {
    fn link_up(&self) -> bool {
        self.link
    }
    fn reconnect(&mut self, profile: NetProfile) -> Result<(), CommsError> {
        self.reconnect_attempts.push(profile);
        if self.accept_reconnect {
            self.link = true;
            Ok(())
        } else {
            Err(CommsError::ReconnectFailed)
        }
    }
}

impl IndicatorPort for MockHardware {
    fn set_level(&mut self, on: bool) {
        self.led_levels.push(on);
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Hand-cranked monotonic clock.
pub struct MockClock {
    now: Cell<u64>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
    fn delay_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
