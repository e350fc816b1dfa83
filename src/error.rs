//! Unified error types for the Manta firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be passed through the control loop without allocation.
//!
//! Advisory conditions (link lost, bus fault, rejected angle) are not errors
//! in the `Result` sense — they are sticky flags accumulated in
//! [`ErrorStatus`] and surfaced through the status query. Nothing in this
//! module is fatal; the control loop runs indefinitely and self-heals.

use core::fmt;

use log::{info, warn};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The command protocol rejected an inbound frame.
    Protocol(ProtocolError),
    /// A servo-bus write failed.
    Bus(BusError),
    /// A network / client-link operation failed.
    Comms(CommsError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Rejection reasons for inbound commands. Each maps 1:1 to a wire response
/// code; see the protocol module for the byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command class nibble is not one the processor understands.
    UnknownCommand,
    /// Set-mode selector outside the known mode range.
    InvalidMode,
    /// Set-parameters payload failed range validation.
    InvalidParameters,
    /// The transport failed mid-payload and the frame cannot complete.
    ShortRead,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::InvalidMode => write!(f, "invalid mode"),
            Self::InvalidParameters => write!(f, "invalid parameters"),
            Self::ShortRead => write!(f, "short read"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Servo-bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The bus did not acknowledge — transient, worth retrying.
    Busy,
    /// Serial I/O failed outright.
    Io,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "bus busy"),
            Self::Io => write!(f, "serial I/O failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The network link is down.
    LinkDown,
    /// A socket read/write failed.
    IoFailed,
    /// A reconnect attempt did not produce a usable link.
    ReconnectFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkDown => write!(f, "link down"),
            Self::IoFailed => write!(f, "socket I/O failed"),
            Self::ReconnectFailed => write!(f, "reconnect failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Advisory flags
// ---------------------------------------------------------------------------

/// Sticky advisory flags accumulated in a bitfield so that multiple
/// simultaneous conditions can be tracked and individually cleared. They
/// never abort the control loop; each clears only when the condition that
/// raised it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorFlag {
    /// The network link dropped while the robot was operating.
    LinkLost = 0b0000_0001,
    /// A servo write exhausted its retry budget.
    ActuatorFault = 0b0000_0010,
    /// A motion generator produced an out-of-range angle.
    AngleRejected = 0b0000_0100,
}

impl ErrorFlag {
    /// Return the bitmask for this flag.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkLost => write!(f, "link lost"),
            Self::ActuatorFault => write!(f, "actuator fault"),
            Self::AngleRejected => write!(f, "angle rejected"),
        }
    }
}

/// Accumulator for advisory flags plus the most recent human-readable
/// message. Exposed verbatim through the status query.
#[derive(Debug, Default)]
pub struct ErrorStatus {
    flags: u8,
    last_message: heapless::String<96>,
}

impl ErrorStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a flag and record the message. Logs only on the rising edge so
    /// a condition persisting across ticks does not spam the log.
    pub fn raise(&mut self, flag: ErrorFlag, msg: fmt::Arguments<'_>) {
        if self.flags & flag.mask() == 0 {
            warn!("FLAG SET: {flag} — {msg}");
        }
        self.flags |= flag.mask();
        self.last_message.clear();
        let _ = fmt::Write::write_fmt(&mut self.last_message, msg);
    }

    /// Clear a flag. Logs on the falling edge.
    pub fn clear(&mut self, flag: ErrorFlag) {
        if self.flags & flag.mask() != 0 {
            info!("FLAG CLEARED: {flag}");
        }
        self.flags &= !flag.mask();
    }

    /// Current flag bitmask (for the status frame).
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn has(&self, flag: ErrorFlag) -> bool {
        self.flags & flag.mask() != 0
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
