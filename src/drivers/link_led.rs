//! Liveness indicator pattern engine.
//!
//! Generates the two-level output waveform for the connectivity LED. The
//! control loop calls `tick()` every iteration and forwards the returned
//! level to the [`IndicatorPort`](crate::app::ports::IndicatorPort) adapter.
//!
//! | Link state   | Pattern                     |
//! |--------------|-----------------------------|
//! | Disconnected | slow toggle, 3 s per level  |
//! | Connected    | 2 s on / 0.5 s off          |
//! | ClientActive | fast toggle, 200 ms per level |
//!
//! Pure state + timestamps; no GPIO here, so the timing table is unit
//! testable on the host.

use crate::link::LinkState;

pub struct LinkLed {
    level: bool,
    last_toggle_ms: u64,
    last_state: Option<LinkState>,
}

impl Default for LinkLed {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkLed {
    pub fn new() -> Self {
        Self {
            level: false,
            last_toggle_ms: 0,
            last_state: None,
        }
    }

    /// Advance the pattern and return the level to drive.
    pub fn tick(&mut self, state: LinkState, now_ms: u64) -> bool {
        if self.last_state != Some(state) {
            // Pattern change restarts its cycle from "on".
            self.last_state = Some(state);
            self.level = true;
            self.last_toggle_ms = now_ms;
            return self.level;
        }

        let hold_ms: u64 = match state {
            LinkState::Disconnected => 3000,
            LinkState::Connected => {
                if self.level {
                    2000
                } else {
                    500
                }
            }
            LinkState::ClientActive => 200,
        };

        if now_ms.saturating_sub(self.last_toggle_ms) >= hold_ms {
            self.level = !self.level;
            self.last_toggle_ms = now_ms;
        }
        self.level
    }

    pub fn level(&self) -> bool {
        self.level
    }
}
