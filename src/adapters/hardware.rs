//! Combined hardware adapter.
//!
//! Bundles the servo bus, WiFi, TCP command link, and the liveness LED into
//! one object satisfying every driven port at once, so the control service
//! takes a single `&mut hw`. The LED is generic over
//! [`embedded_hal::digital::OutputPin`] — a real GPIO on target, [`SimPin`]
//! on the host.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{CommandLink, IndicatorPort, NetProfile, NetworkPort, ServoBus};
use crate::error::{BusError, CommsError};

use super::ics_bus::IcsSerialBus;
use super::tcp_link::TcpCommandLink;
use super::wifi::WifiNetwork;

pub struct HardwareAdapter<P: OutputPin> {
    pub bus: IcsSerialBus,
    pub wifi: WifiNetwork,
    pub tcp: TcpCommandLink,
    led: P,
}

impl<P: OutputPin> HardwareAdapter<P> {
    pub fn new(bus: IcsSerialBus, wifi: WifiNetwork, tcp: TcpCommandLink, led: P) -> Self {
        Self {
            bus,
            wifi,
            tcp,
            led,
        }
    }

    /// Transport housekeeping: accept a pending client while the link is
    /// up. Called once per loop iteration, before the service tick.
    pub fn maintain(&mut self) {
        if self.wifi.link_up() {
            self.tcp.poll_accept();
        }
    }
}

impl<P: OutputPin> ServoBus for HardwareAdapter<P> {
    fn set_position(&mut self, axis_id: u8, units: u16) -> Result<(), BusError> {
        self.bus.set_position(axis_id, units)
    }
    fn set_speed(&mut self, axis_id: u8, speed: u8) -> Result<(), BusError> {
        self.bus.set_speed(axis_id, speed)
    }
    fn release(&mut self, axis_id: u8) -> Result<(), BusError> {
        self.bus.release(axis_id)
    }
}

impl<P: OutputPin> CommandLink for HardwareAdapter<P> {
    fn client_connected(&self) -> bool {
        self.tcp.client_connected()
    }
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CommsError> {
        self.tcp.read(buf)
    }
    fn write(&mut self, data: &[u8]) -> Result<(), CommsError> {
        self.tcp.write(data)
    }
}

impl<P: OutputPin> NetworkPort for HardwareAdapter<P> {
    fn link_up(&self) -> bool {
        self.wifi.link_up()
    }
    fn reconnect(&mut self, profile: NetProfile) -> Result<(), CommsError> {
        self.wifi.reconnect(profile)
    }
}

impl<P: OutputPin> IndicatorPort for HardwareAdapter<P> {
    fn set_level(&mut self, on: bool) {
        let result = if on {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
        // An indicator write failure is not worth disturbing the loop over.
        let _ = result;
    }
}

// ───────────────────────────────────────────────────────────────
// Host-side LED stand-in
// ───────────────────────────────────────────────────────────────

/// In-memory pin for hosts and tests.
#[derive(Debug, Default)]
pub struct SimPin {
    level: bool,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn level(&self) -> bool {
        self.level
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level = true;
        Ok(())
    }
}
