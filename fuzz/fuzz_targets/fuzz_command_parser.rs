//! Fuzz target: `CommandProtocol::process`
//!
//! Drives arbitrary byte sequences through the command parser and asserts
//! that it never panics and never publishes out-of-range motion parameters,
//! no matter how the bytes are framed.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use manta::app::context::ControlContext;
use manta::app::ports::CommandLink;
use manta::config::SystemConfig;
use manta::error::CommsError;
use manta::protocol::CommandProtocol;

struct ByteLink {
    rx: VecDeque<u8>,
}

impl CommandLink for ByteLink {
    fn client_connected(&self) -> bool {
        true
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
    fn write(&mut self, _data: &[u8]) -> Result<(), CommsError> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut proto = CommandProtocol::new();
    let mut link = ByteLink {
        rx: data.iter().copied().collect(),
    };
    let mut ctx = ControlContext::new(SystemConfig::default());
    let limit = ctx.config.wing_limit_deg;

    for now in 0..=data.len() as u64 {
        let _ = proto.process(&mut link, &mut ctx, now);

        // Published parameters must always honour the protocol's ranges.
        assert!(ctx.params.period_secs > 0.0);
        assert!(ctx.params.base_angle_deg.abs() <= limit);
        assert!(ctx.params.max_angle_deg.abs() <= limit);
        assert!(ctx.params.yaw_bias.abs() <= 1.0);
    }

    // A reset must leave the parser ready for a fresh stream.
    proto.reset();
    let mut link2 = ByteLink {
        rx: data.iter().copied().collect(),
    };
    let _ = proto.process(&mut link2, &mut ctx, 0);
});
