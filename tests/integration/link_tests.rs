//! Connectivity-loss scenarios through the control service.

use manta::app::context::Mode;
use manta::app::events::AppEvent;
use manta::app::ports::NetProfile;
use manta::app::service::ControlService;
use manta::bus::{axis, deg_to_units, ICS_NEUTRAL};
use manta::config::SystemConfig;
use manta::error::ErrorFlag;
use manta::link::LinkState;

use crate::mock_hw::{MockClock, MockHardware, RecordingSink};

fn service() -> ControlService {
    ControlService::new(SystemConfig::default())
}

#[test]
fn link_loss_forces_emergency_surface_within_one_tick() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x13]); // Swim
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::Swim);

    // The radio drops; the client session dies with it.
    hw.link = false;
    hw.client = false;
    hw.accept_reconnect = false;
    clock.advance(20);
    svc.tick(&mut hw, &clock, &mut sink);

    assert_eq!(svc.context().mode, Mode::EmergencySurface);
    assert!(svc.context().status.has(ErrorFlag::LinkLost));
    assert_eq!(svc.link_state(), LinkState::Disconnected);

    // Both wings pitch up to the surface pose.
    assert_eq!(
        hw.last_position(axis::RIGHT_PITCH),
        Some(deg_to_units(30.0))
    );
    assert_eq!(hw.last_position(axis::LEFT_PITCH), Some(deg_to_units(30.0)));
    assert_eq!(hw.last_position(axis::RIGHT_SWEEP), Some(ICS_NEUTRAL));

    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ModeChanged { to: Mode::EmergencySurface, .. }
    )));
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::FaultRaised(f) if *f & ErrorFlag::LinkLost.mask() != 0)));
}

#[test]
fn reconnection_alone_keeps_the_surface_pose_until_a_command_arrives() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x13]);
    svc.tick(&mut hw, &clock, &mut sink);

    hw.link = false;
    hw.client = false;
    clock.advance(20);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::EmergencySurface);

    // Link comes back, no commander yet: flag clears, pose stays.
    hw.link = true;
    clock.advance(1000);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::EmergencySurface);
    assert!(!svc.context().status.has(ErrorFlag::LinkLost));
    assert_eq!(svc.link_state(), LinkState::Connected);

    // An explicit mode command supersedes the override.
    hw.client = true;
    hw.push_bytes(&[0x12]); // Stay
    clock.advance(20);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::Stay);
}

#[test]
fn reconnect_attempts_alternate_profiles_at_the_configured_pace() {
    let cfg = SystemConfig::default();
    let interval = u64::from(cfg.reconnect_interval_ms);
    let mut svc = ControlService::new(cfg);
    let mut hw = MockHardware::online();
    hw.link = false;
    hw.client = false;
    hw.accept_reconnect = false;
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.reconnect_attempts, vec![NetProfile::Primary]);

    clock.advance(100);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.reconnect_attempts.len(), 1, "attempts are paced");

    clock.set(interval);
    svc.tick(&mut hw, &clock, &mut sink);
    clock.set(2 * interval);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(
        hw.reconnect_attempts,
        vec![NetProfile::Primary, NetProfile::Fallback, NetProfile::Primary]
    );
}

#[test]
fn stalled_client_gets_servo_off_not_surface() {
    let cfg = SystemConfig::default();
    let timeout = u64::from(cfg.client_timeout_ms);
    let mut svc = ControlService::new(cfg);
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x13]);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::Swim);
    assert_eq!(svc.link_state(), LinkState::ClientActive);

    // Client stays connected but says nothing past the timeout.
    clock.set(timeout + 1);
    hw.clear_recordings();
    svc.tick(&mut hw, &clock, &mut sink);

    assert_eq!(svc.context().mode, Mode::ServoOff);
    assert_eq!(svc.link_state(), LinkState::Connected);
    assert_eq!(hw.released_axes().len(), usize::from(axis::COUNT));
}

#[test]
fn a_fresh_client_session_is_not_stalled_by_the_previous_one() {
    let cfg = SystemConfig::default();
    let timeout = u64::from(cfg.client_timeout_ms);
    let mut svc = ControlService::new(cfg);
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x13]);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::Swim);

    // The session drops cleanly, well before any stall.
    hw.client = false;
    clock.advance(100);
    svc.tick(&mut hw, &clock, &mut sink);

    // A new client connects long after the old session's last command and
    // says nothing. Stall is measured per session, so Swim continues.
    hw.client = true;
    clock.set(2 * timeout);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(svc.context().mode, Mode::Swim);
    assert_eq!(svc.link_state(), LinkState::ClientActive);
}

#[test]
fn indicator_flashes_fastest_while_a_client_is_active() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x11]);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.led_levels.last(), Some(&true));

    // 200 ms later the fast client-active pattern has toggled off…
    clock.advance(200);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.led_levels.last(), Some(&false));

    // …and back on again.
    clock.advance(200);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.led_levels.last(), Some(&true));
}
