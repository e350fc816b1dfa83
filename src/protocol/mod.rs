//! Inbound command protocol.
//!
//! Wire format: one command byte, high nibble = command class, low nibble =
//! class-specific selector, optionally followed by a fixed-size payload.
//! Exactly one response byte sequence is written per processed command.
//!
//! ```text
//! ┌──────────────┬───────────────────────┬──────────────────────────┐
//! │ class (hi 4) │ selector (lo 4)       │ payload                  │
//! ├──────────────┼───────────────────────┼──────────────────────────┤
//! │ 0x1 set-mode │ mode code 0..=5       │ —                        │
//! │ 0x2 set-par  │ ignored               │ 10 bytes (see below)     │
//! │ 0x3 set-wing │ wing code 0..=2       │ —                        │
//! │ 0x4 mouth    │ bit 0 = open          │ —                        │
//! │ 0xF status   │ ignored               │ —                        │
//! └──────────────┴───────────────────────┴──────────────────────────┘
//! ```
//!
//! The set-parameters payload is accumulated in an explicit partial-frame
//! buffer until all 10 bytes have arrived — a slow sender can deliver them
//! one at a time across many loop iterations without any risk of the
//! processor misinterpreting payload bytes as commands. Nothing is
//! discarded prematurely; `0xE3` is reserved for a transport read that
//! fails outright mid-payload.
//!
//! No command can crash the processor: malformed input degrades to an error
//! response with state unchanged.

use log::{info, warn};

use crate::app::context::{ControlContext, Mode, MotionParameters, WingSelector};
use crate::app::ports::CommandLink;
use crate::error::{CommsError, ProtocolError};

// ── Response codes ────────────────────────────────────────────

pub const RESP_OK: u8 = 0x00;
pub const RESP_UNKNOWN_COMMAND: u8 = 0xE0;
pub const RESP_INVALID_MODE: u8 = 0xE1;
pub const RESP_INVALID_PARAMS: u8 = 0xE2;
pub const RESP_SHORT_READ: u8 = 0xE3;

/// Fixed size of the status reply frame.
pub const STATUS_FRAME_LEN: usize = 8;

// ── Command classes ───────────────────────────────────────────

const CLASS_SET_MODE: u8 = 0x1;
const CLASS_SET_PARAMS: u8 = 0x2;
const CLASS_SET_WING: u8 = 0x3;
const CLASS_SET_MOUTH: u8 = 0x4;
const CLASS_STATUS: u8 = 0xF;

const PARAMS_PAYLOAD_LEN: usize = 10;

/// The wire response byte for a rejected command.
const fn response_byte(err: ProtocolError) -> u8 {
    match err {
        ProtocolError::UnknownCommand => RESP_UNKNOWN_COMMAND,
        ProtocolError::InvalidMode => RESP_INVALID_MODE,
        ProtocolError::InvalidParameters => RESP_INVALID_PARAMS,
        ProtocolError::ShortRead => RESP_SHORT_READ,
    }
}

/// What a `process` call accomplished — the service uses this to emit
/// structured events without re-deriving state diffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtocolEvent {
    /// No complete command was available.
    Idle,
    ModeSet(Mode),
    ParametersSet(MotionParameters),
    WingSet(WingSelector),
    MouthSet(bool),
    StatusServed,
    /// A command was rejected; the matching response byte went out.
    Rejected(ProtocolError),
}

/// Streaming command processor for the single active client.
pub struct CommandProtocol {
    /// Payload bytes collected so far for a pending set-parameters command.
    pending: heapless::Vec<u8, PARAMS_PAYLOAD_LEN>,
    awaiting_params: bool,
}

impl Default for CommandProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProtocol {
    pub fn new() -> Self {
        Self {
            pending: heapless::Vec::new(),
            awaiting_params: false,
        }
    }

    /// Drop any half-collected payload (client session ended).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.awaiting_params = false;
    }

    /// Consume at most one logical command from the client. Non-blocking:
    /// returns [`ProtocolEvent::Idle`] when no byte (or no complete
    /// payload) is ready.
    pub fn process(
        &mut self,
        link: &mut impl CommandLink,
        ctx: &mut ControlContext,
        now_ms: u64,
    ) -> Result<ProtocolEvent, CommsError> {
        if self.awaiting_params {
            return self.collect_params(link, ctx, now_ms);
        }

        let mut byte = [0u8; 1];
        if link.read(&mut byte)? == 0 {
            return Ok(ProtocolEvent::Idle);
        }
        ctx.last_command_ms = Some(now_ms);

        let class = byte[0] >> 4;
        let selector = byte[0] & 0x0F;

        match class {
            CLASS_SET_MODE => match Mode::from_code(selector) {
                Some(mode) => {
                    let prev = ctx.set_mode(mode);
                    info!("command: mode {:?} -> {:?}", prev, mode);
                    link.write(&[RESP_OK])?;
                    Ok(ProtocolEvent::ModeSet(mode))
                }
                None => {
                    warn!("command: invalid mode selector {selector}");
                    Self::reject(link, ProtocolError::InvalidMode)
                }
            },

            CLASS_SET_PARAMS => {
                self.awaiting_params = true;
                self.pending.clear();
                self.collect_params(link, ctx, now_ms)
            }

            CLASS_SET_WING => match WingSelector::from_code(selector) {
                Some(wing) => {
                    ctx.wing_selector = wing;
                    info!("command: wing selector {:?}", wing);
                    link.write(&[RESP_OK])?;
                    Ok(ProtocolEvent::WingSet(wing))
                }
                None => {
                    warn!("command: invalid wing selector {selector}");
                    Self::reject(link, ProtocolError::InvalidMode)
                }
            },

            CLASS_SET_MOUTH => {
                let open = selector & 0x01 != 0;
                ctx.mouth_open = open;
                link.write(&[RESP_OK])?;
                Ok(ProtocolEvent::MouthSet(open))
            }

            CLASS_STATUS => {
                let frame = Self::status_frame(ctx);
                link.write(&frame)?;
                Ok(ProtocolEvent::StatusServed)
            }

            _ => {
                warn!("command: unknown class 0x{class:X}");
                Self::reject(link, ProtocolError::UnknownCommand)
            }
        }
    }

    /// Write the response byte for a rejected command.
    fn reject(
        link: &mut impl CommandLink,
        err: ProtocolError,
    ) -> Result<ProtocolEvent, CommsError> {
        link.write(&[response_byte(err)])?;
        Ok(ProtocolEvent::Rejected(err))
    }

    /// Accumulate set-parameters payload bytes; publish once all ten are in.
    fn collect_params(
        &mut self,
        link: &mut impl CommandLink,
        ctx: &mut ControlContext,
        now_ms: u64,
    ) -> Result<ProtocolEvent, CommsError> {
        let mut chunk = [0u8; PARAMS_PAYLOAD_LEN];
        let need = PARAMS_PAYLOAD_LEN - self.pending.len();

        let got = match link.read(&mut chunk[..need]) {
            Ok(n) => n,
            Err(e) => {
                // The transport died mid-payload; the frame can never
                // complete. Tell the client and re-arm for a fresh command.
                warn!("set-parameters aborted mid-payload: {e}");
                self.reset();
                // The transport is dying; the reply is best-effort.
                link.write(&[response_byte(ProtocolError::ShortRead)]).ok();
                return Ok(ProtocolEvent::Rejected(ProtocolError::ShortRead));
            }
        };

        if got == 0 {
            // Command byte stays pending until the payload completes.
            return Ok(ProtocolEvent::Idle);
        }

        ctx.last_command_ms = Some(now_ms);
        self.pending
            .extend_from_slice(&chunk[..got])
            .unwrap_or_else(|()| debug_assert!(false, "payload buffer overflow"));

        if self.pending.len() < PARAMS_PAYLOAD_LEN {
            return Ok(ProtocolEvent::Idle);
        }

        let outcome = Self::decode_params(&self.pending, &ctx.config);
        self.reset();

        match outcome {
            Some(params) => {
                ctx.params = params;
                info!(
                    "command: parameters period={:.2}s base={:.1}° max={:.1}° yaw={:.2} backward={}",
                    params.period_secs,
                    params.base_angle_deg,
                    params.max_angle_deg,
                    params.yaw_bias,
                    params.backward
                );
                link.write(&[RESP_OK])?;
                Ok(ProtocolEvent::ParametersSet(params))
            }
            None => {
                warn!("command: parameters rejected, previous values kept");
                Self::reject(link, ProtocolError::InvalidParameters)
            }
        }
    }

    /// Decode and range-check a complete 10-byte payload.
    ///
    /// Layout: f32 LE period (s) · i16 LE angle ×10 (base) · i16 LE angle
    /// ×10 (max) · i8 ratio ×100 (yaw) · u8 flags (bit 0 = backward).
    fn decode_params(buf: &[u8], config: &crate::config::SystemConfig) -> Option<MotionParameters> {
        let period_secs = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let base_angle_deg = f32::from(i16::from_le_bytes([buf[4], buf[5]])) / 10.0;
        let max_angle_deg = f32::from(i16::from_le_bytes([buf[6], buf[7]])) / 10.0;
        let yaw_bias = f32::from(buf[8] as i8) / 100.0;
        let backward = buf[9] & 0x01 != 0;

        let limit = config.wing_limit_deg;
        let valid = period_secs.is_finite()
            && period_secs > 0.0
            && (-limit..=limit).contains(&base_angle_deg)
            && (-limit..=limit).contains(&max_angle_deg)
            && (-1.0..=1.0).contains(&yaw_bias);

        valid.then_some(MotionParameters {
            period_secs,
            base_angle_deg,
            max_angle_deg,
            yaw_bias,
            backward,
        })
    }

    /// The fixed-size status reply:
    /// `[mode, reserved, reserved, error_flags, 0, 0, 0, 0]`.
    fn status_frame(ctx: &ControlContext) -> [u8; STATUS_FRAME_LEN] {
        let mut frame = [0u8; STATUS_FRAME_LEN];
        frame[0] = ctx.mode.code();
        frame[3] = ctx.status.flags();
        frame
    }
}
