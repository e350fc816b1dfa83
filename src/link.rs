//! Link watchdog: connectivity observation and safety overrides.
//!
//! Watches the network link and the commander client, and injects mode
//! overrides into the shared context when either goes quiet:
//!
//! - **Link loss** forces `EmergencySurface` — exactly once per loss event,
//!   not re-applied every tick — and raises the `LinkLost` flag. The robot
//!   stays in that pose until the link recovers *and* an explicit set-mode
//!   command supersedes it.
//! - **Client stall** (connected but silent past the inactivity timeout)
//!   forces `ServoOff`. A stalled session is a commander problem, not a
//!   link problem, so the robot de-energises instead of surfacing.
//!
//! While the link is down the watchdog paces reconnect attempts at a fixed
//! interval, alternating between the two provisioned network profiles when
//! the current one keeps failing.

use log::{info, warn};

use crate::app::context::{ControlContext, Mode};
use crate::app::ports::{CommandLink, NetProfile, NetworkPort};
use crate::config::SystemConfig;
use crate::error::ErrorFlag;

/// Observed connectivity, from the robot's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Radio link down.
    Disconnected,
    /// Link up, no live commander session.
    Connected,
    /// Link up and a client is actively commanding.
    ClientActive,
}

pub struct LinkWatchdog {
    state: LinkState,
    profile: NetProfile,
    last_attempt_ms: Option<u64>,
    /// The EmergencySurface override has been applied for the current loss.
    loss_handled: bool,
    /// The ServoOff override has been applied for the current stall.
    stall_handled: bool,
    reconnect_interval_ms: u32,
    client_timeout_ms: u32,
}

impl LinkWatchdog {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: LinkState::Disconnected,
            profile: NetProfile::Primary,
            last_attempt_ms: None,
            loss_handled: false,
            stall_handled: false,
            reconnect_interval_ms: config.reconnect_interval_ms,
            client_timeout_ms: config.client_timeout_ms,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// One maintenance pass: observe connectivity, apply overrides, pace
    /// reconnects. Called at the top of every loop iteration.
    pub fn poll(
        &mut self,
        hw: &mut (impl NetworkPort + CommandLink),
        ctx: &mut ControlContext,
        now_ms: u64,
    ) {
        if !hw.link_up() {
            self.handle_link_down(hw, ctx, now_ms);
            return;
        }

        if self.state == LinkState::Disconnected {
            info!("link restored via {:?}", self.profile);
            ctx.status.clear(ErrorFlag::LinkLost);
            self.loss_handled = false;
            self.last_attempt_ms = None;
        }

        if !hw.client_connected() {
            self.state = LinkState::Connected;
            self.stall_handled = false;
            return;
        }

        let stalled = ctx
            .last_command_ms
            .is_some_and(|last| now_ms.saturating_sub(last) > u64::from(self.client_timeout_ms));

        if stalled {
            if !self.stall_handled {
                self.stall_handled = true;
                let prev = ctx.set_mode(Mode::ServoOff);
                warn!(
                    "client stalled (>{} ms silent): forcing ServoOff (was {prev:?})",
                    self.client_timeout_ms
                );
            }
            self.state = LinkState::Connected;
        } else {
            self.stall_handled = false;
            self.state = LinkState::ClientActive;
        }
    }

    fn handle_link_down(
        &mut self,
        net: &mut impl NetworkPort,
        ctx: &mut ControlContext,
        now_ms: u64,
    ) {
        if self.state != LinkState::Disconnected {
            self.state = LinkState::Disconnected;
        }

        if !self.loss_handled {
            self.loss_handled = true;
            ctx.status
                .raise(ErrorFlag::LinkLost, format_args!("network link lost"));
            if ctx.mode != Mode::EmergencySurface {
                let prev = ctx.set_mode(Mode::EmergencySurface);
                warn!("link loss: forcing EmergencySurface (was {prev:?})");
            }
        }

        let due = match self.last_attempt_ms {
            None => true,
            Some(t) => now_ms.saturating_sub(t) >= u64::from(self.reconnect_interval_ms),
        };
        if due {
            self.last_attempt_ms = Some(now_ms);
            info!("reconnect attempt via {:?}", self.profile);
            if net.reconnect(self.profile).is_err() {
                // Keep alternating between the two provisioned networks.
                self.profile = self.profile.other();
            }
        }
    }
}
