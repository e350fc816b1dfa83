//! ICS servo bus adapter.
//!
//! Implements [`ServoBus`] for the half-duplex serial servo chain. The
//! low-level frame format (command byte, position high/low, checksum-free
//! short frames) lives behind this boundary; the domain only sees
//! per-axis position/speed/release operations with success or failure.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: UART2 via esp-idf-hal with the EN pin
//!   switching TX/RX direction.
//! - **all other targets**: in-memory simulation that records the last
//!   commanded state per axis.

#[cfg(not(target_os = "espidf"))]
use log::debug;

use crate::app::ports::ServoBus;
use crate::bus::axis;
use crate::error::BusError;

/// Last commanded state of one axis (simulation + diagnostics).
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisShadow {
    pub position: Option<u16>,
    pub speed: Option<u8>,
    pub released: bool,
}

pub struct IcsSerialBus {
    shadow: [AxisShadow; axis::COUNT as usize],
}

impl IcsSerialBus {
    pub fn new() -> Self {
        Self {
            shadow: [AxisShadow::default(); axis::COUNT as usize],
        }
    }

    /// Diagnostic view of what was last commanded on an axis.
    pub fn shadow(&self, axis_id: u8) -> Option<AxisShadow> {
        self.shadow.get(axis_id as usize).copied()
    }

    // ── Platform-specific frame I/O ───────────────────────────

    #[cfg(target_os = "espidf")]
    fn send_frame(&mut self, _frame: &[u8]) -> Result<(), BusError> {
        // UART2 wiring (EN=GPIO16, RX=GPIO17, TX=GPIO5) comes in with board
        // bring-up: drive EN high, uart.write(frame), wait for the echo,
        // drop EN, read the servo's reply, map a missing reply to Busy.
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), BusError> {
        debug!("ICS(sim): frame {frame:02X?}");
        Ok(())
    }

    fn checked_axis(&self, axis_id: u8) -> Result<usize, BusError> {
        let idx = axis_id as usize;
        if idx < self.shadow.len() {
            Ok(idx)
        } else {
            Err(BusError::Io)
        }
    }
}

impl Default for IcsSerialBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoBus for IcsSerialBus {
    fn set_position(&mut self, axis_id: u8, units: u16) -> Result<(), BusError> {
        let idx = self.checked_axis(axis_id)?;
        let frame = [
            0x80 | axis_id,
            ((units >> 7) & 0x7F) as u8,
            (units & 0x7F) as u8,
        ];
        self.send_frame(&frame)?;
        self.shadow[idx].position = Some(units);
        self.shadow[idx].released = false;
        Ok(())
    }

    fn set_speed(&mut self, axis_id: u8, speed: u8) -> Result<(), BusError> {
        let idx = self.checked_axis(axis_id)?;
        let frame = [0xC0 | axis_id, 0x02, speed & 0x7F];
        self.send_frame(&frame)?;
        self.shadow[idx].speed = Some(speed);
        Ok(())
    }

    fn release(&mut self, axis_id: u8) -> Result<(), BusError> {
        let idx = self.checked_axis(axis_id)?;
        // Position 0 in an ICS position frame frees the servo.
        let frame = [0x80 | axis_id, 0x00, 0x00];
        self.send_frame(&frame)?;
        self.shadow[idx].released = true;
        self.shadow[idx].position = None;
        Ok(())
    }
}
