//! End-to-end command → motion scenarios through the control service.

use manta::app::context::Mode;
use manta::app::events::AppEvent;
use manta::app::service::ControlService;
use manta::bus::{axis, deg_to_units, ICS_NEUTRAL};
use manta::config::SystemConfig;
use manta::protocol::{RESP_INVALID_MODE, RESP_INVALID_PARAMS, RESP_OK, STATUS_FRAME_LEN};

use crate::mock_hw::{BusCall, MockClock, MockHardware, RecordingSink};

fn service() -> ControlService {
    ControlService::new(SystemConfig::default())
}

fn params_payload(period: f32, base_x10: i16, max_x10: i16, yaw_x100: i8, flags: u8) -> Vec<u8> {
    let mut out = vec![0x20];
    out.extend_from_slice(&period.to_le_bytes());
    out.extend_from_slice(&base_x10.to_le_bytes());
    out.extend_from_slice(&max_x10.to_le_bytes());
    out.push(yaw_x100 as u8);
    out.push(flags);
    out
}

#[test]
fn first_tick_drives_every_wing_axis_to_neutral() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &clock, &mut sink);

    for axis_id in [
        axis::RIGHT_PITCH,
        axis::RIGHT_SWEEP,
        axis::RIGHT_TWIST,
        axis::LEFT_PITCH,
        axis::LEFT_SWEEP,
        axis::LEFT_TWIST,
    ] {
        assert_eq!(hw.last_position(axis_id), Some(ICS_NEUTRAL), "axis {axis_id}");
    }
    // The mouth follows on its own cadence, closed by default.
    assert_eq!(hw.last_position(axis::MOUTH), Some(ICS_NEUTRAL));
}

#[test]
fn init_pose_repeats_identically() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &clock, &mut sink);
    let first: Vec<BusCall> = hw.bus_calls.clone();
    hw.clear_recordings();

    clock.advance(200);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.bus_calls, first);
}

#[test]
fn set_mode_then_status_reflects_the_new_code() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x13]); // set mode Swim
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.tx, vec![RESP_OK]);
    assert_eq!(svc.context().mode, Mode::Swim);
    hw.tx.clear();

    hw.push_bytes(&[0xF0]); // status query
    clock.advance(5);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.tx.len(), STATUS_FRAME_LEN);
    assert_eq!(hw.tx[0], Mode::Swim.code());

    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::ModeChanged { to: Mode::Swim, .. })));
}

#[test]
fn invalid_mode_selector_is_rejected_and_mode_unchanged() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x17]); // selector 7
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.tx, vec![RESP_INVALID_MODE]);
    assert_eq!(svc.context().mode, Mode::InitPose);
}

#[test]
fn parameters_roundtrip_and_bad_payload_keeps_previous() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&params_payload(2.0, 100, 250, 30, 0));
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.tx, vec![RESP_OK]);
    assert!((svc.context().params.period_secs - 2.0).abs() < 1e-6);
    assert!((svc.context().params.max_angle_deg - 25.0).abs() < 1e-6);
    hw.tx.clear();

    // Out-of-range max angle: rejected, previous parameters survive.
    hw.push_bytes(&params_payload(2.0, 0, 700, 0, 0));
    clock.advance(5);
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.tx, vec![RESP_INVALID_PARAMS]);
    assert!((svc.context().params.max_angle_deg - 25.0).abs() < 1e-6);

    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::ParametersUpdated(_))));
}

#[test]
fn swim_splits_amplitude_by_yaw_bias() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    // period 1 s, wing direction 90° (pure pitch), amplitude 40°, yaw +0.5
    hw.push_bytes(&params_payload(1.0, 900, 400, 50, 0));
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.tx, vec![RESP_OK]);

    hw.push_bytes(&[0x13]);
    clock.advance(20);
    svc.tick(&mut hw, &clock, &mut sink); // Swim entered, phase restarts

    clock.advance(250); // quarter cycle
    hw.clear_recordings();
    svc.tick(&mut hw, &clock, &mut sink);

    let right = i32::from(hw.last_position(axis::RIGHT_PITCH).unwrap()) - i32::from(ICS_NEUTRAL);
    let left = i32::from(hw.last_position(axis::LEFT_PITCH).unwrap()) - i32::from(ICS_NEUTRAL);
    assert!(right > 100, "right wing should be well into its stroke, got {right}");
    assert!(left > 0);
    // right amplitude = 40·(1+0.5)/2 = 30°, left = 40·(1−0.5)/2 = 10°
    let ratio = f64::from(right) / f64::from(left);
    assert!((ratio - 3.0).abs() < 0.15, "expected 3:1 split, got {ratio}");
}

#[test]
fn raise_lifts_the_selected_wing_only() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&params_payload(1.0, 0, 350, 0, 0));
    svc.tick(&mut hw, &clock, &mut sink);

    hw.push_bytes(&[0x31]); // wing selector Right
    clock.advance(20);
    svc.tick(&mut hw, &clock, &mut sink);

    hw.push_bytes(&[0x14]); // mode Raise
    clock.advance(20);
    hw.clear_recordings();
    svc.tick(&mut hw, &clock, &mut sink);

    assert_eq!(
        hw.last_position(axis::RIGHT_SWEEP),
        Some(deg_to_units(35.0))
    );
    assert_eq!(hw.last_position(axis::LEFT_SWEEP), Some(ICS_NEUTRAL));
}

#[test]
fn servo_off_releases_every_axis_without_position_writes() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    hw.push_bytes(&[0x10]); // ServoOff
    svc.tick(&mut hw, &clock, &mut sink);

    let released = hw.released_axes();
    assert_eq!(released.len(), usize::from(axis::COUNT));
    assert!(!hw
        .bus_calls
        .iter()
        .any(|c| matches!(c, BusCall::Position { .. })));
}

#[test]
fn mouth_command_moves_the_mouth_axis_on_its_cadence() {
    let mut svc = service();
    let mut hw = MockHardware::online();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &clock, &mut sink); // mouth closed at boot

    hw.push_bytes(&[0x41]); // open
    clock.advance(50); // motion due, mouth cadence (100 ms) not yet
    hw.clear_recordings();
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.last_position(axis::MOUTH), None, "mouth not due yet");

    clock.advance(60); // past the 100 ms cadence
    svc.tick(&mut hw, &clock, &mut sink);
    assert_eq!(hw.last_position(axis::MOUTH), Some(deg_to_units(30.0)));
}
