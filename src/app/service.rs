//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns the shared context, command protocol, motion
//! controller, link watchdog, and indicator pattern engine. It exposes one
//! clean, hardware-agnostic `tick()`; all I/O flows through port traits
//! injected at the call site, making the entire service testable with
//! recording mocks.
//!
//! ```text
//!  CommandLink ──▶ ┌─────────────────────────────┐ ──▶ ServoBus
//!  NetworkPort ──▶ │       ControlService        │ ──▶ IndicatorPort
//!                  │ protocol · motion · watchdog │ ──▶ EventSink
//!                  └─────────────────────────────┘
//! ```
//!
//! Each iteration is strictly ordered, with no parallel execution units:
//! link maintenance first, then at most one drained command, then — if the
//! control-tick interval has elapsed — one motion update. All shared state
//! lives in the one [`ControlContext`] this service owns; nothing is
//! global, nothing needs a lock.

use log::{info, warn};

use crate::app::context::ControlContext;
use crate::app::events::AppEvent;
use crate::app::ports::{Clock, CommandLink, EventSink, IndicatorPort, NetworkPort, ServoBus};
use crate::config::SystemConfig;
use crate::drivers::link_led::LinkLed;
use crate::link::{LinkState, LinkWatchdog};
use crate::motion::MotionController;
use crate::protocol::{CommandProtocol, ProtocolEvent};

pub struct ControlService {
    ctx: ControlContext,
    protocol: CommandProtocol,
    motion: MotionController,
    watchdog: LinkWatchdog,
    led: LinkLed,
    last_motion_ms: Option<u64>,
    client_was_connected: bool,
}

impl ControlService {
    pub fn new(config: SystemConfig) -> Self {
        let motion = MotionController::new(&config);
        let watchdog = LinkWatchdog::new(&config);
        Self {
            ctx: ControlContext::new(config),
            protocol: CommandProtocol::new(),
            motion,
            watchdog,
            led: LinkLed::new(),
            last_motion_ms: None,
            client_was_connected: false,
        }
    }

    /// Announce startup. Call once before the first `tick()`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!("ControlService started in {:?}", self.ctx.mode);
        sink.emit(&AppEvent::Started(self.ctx.mode));
    }

    /// Run one loop iteration: link maintenance → drain one command →
    /// motion update (if due) → indicator.
    ///
    /// The `hw` parameter satisfies every driven port at once — one
    /// platform object, so the service never juggles multiple mutable
    /// hardware borrows.
    pub fn tick(
        &mut self,
        hw: &mut (impl ServoBus + CommandLink + NetworkPort + IndicatorPort),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        let now = clock.now_ms();
        let prev_mode = self.ctx.mode;
        let prev_link = self.watchdog.state();
        let prev_flags = self.ctx.status.flags();

        // Client session bookkeeping. A client that vanished mid-payload
        // must not poison the next session's framing, and stall detection
        // is per-session: a fresh client that has not spoken yet is
        // idle-but-alive, not stalled.
        let client = hw.client_connected();
        if self.client_was_connected && !client {
            self.protocol.reset();
        } else if !self.client_was_connected && client {
            self.ctx.last_command_ms = None;
        }
        self.client_was_connected = client;

        // 1. Link / connection maintenance (may override the mode).
        self.watchdog.poll(hw, &mut self.ctx, now);

        // 2. Drain at most one pending command.
        if client {
            match self.protocol.process(hw, &mut self.ctx, now) {
                Ok(ProtocolEvent::ParametersSet(params)) => {
                    sink.emit(&AppEvent::ParametersUpdated(params));
                }
                Ok(_) => {}
                Err(e) => warn!("command processing failed: {e}"),
            }
        }

        // 3. Motion update on the fixed control-tick interval, independent
        //    of whether a command was just processed.
        let due = match self.last_motion_ms {
            None => true,
            Some(t) => now.saturating_sub(t) >= u64::from(self.ctx.config.control_tick_ms),
        };
        if due {
            self.last_motion_ms = Some(now);
            self.motion.update(&mut self.ctx, hw, clock);
        }

        // 4. Liveness indicator.
        let level = self.led.tick(self.watchdog.state(), now);
        hw.set_level(level);

        // 5. Structured events for whatever changed this iteration.
        if self.ctx.mode != prev_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: prev_mode,
                to: self.ctx.mode,
            });
        }
        let link_state = self.watchdog.state();
        if link_state != prev_link {
            sink.emit(&AppEvent::LinkChanged {
                from: prev_link,
                to: link_state,
            });
        }
        let raised = self.ctx.status.flags() & !prev_flags;
        if raised != 0 {
            sink.emit(&AppEvent::FaultRaised(raised));
        }
    }

    /// Observed connectivity (drives the indicator; exposed for adapters).
    pub fn link_state(&self) -> LinkState {
        self.watchdog.state()
    }

    /// Read-only view of the shared state (status queries, tests).
    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }
}
