//! Manta Firmware — Main Entry Point
//!
//! Hexagonal architecture around one cooperative control loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  IcsSerialBus    WifiNetwork    TcpCommandLink    SystemClock│
//! │  (ServoBus)      (NetworkPort)  (CommandLink)     (Clock)    │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            ControlService (pure logic)                 │  │
//! │  │  CommandProtocol · MotionController · LinkWatchdog     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::info;

use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;

use manta::adapters::hardware::HardwareAdapter;
use manta::adapters::ics_bus::IcsSerialBus;
use manta::adapters::log_sink::LogEventSink;
use manta::adapters::tcp_link::TcpCommandLink;
use manta::adapters::time::SystemClock;
use manta::adapters::wifi::{WifiNetwork, WifiProfile};
use manta::app::ports::Clock;
use manta::app::service::ControlService;
use manta::config::SystemConfig;
use manta::drivers::watchdog::Watchdog;

// Provisioned at build time; replaced per deployment.
const PRIMARY_SSID: &str = "manta-lab";
const PRIMARY_PASSWORD: &str = "manta-lab-psk";
const FALLBACK_SSID: &str = "manta-home";
const FALLBACK_PASSWORD: &str = "manta-home-psk";

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Manta v{} starting", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let led = PinDriver::output(peripherals.pins.gpio2).context("LED pin init")?;

    // ── 2. Configuration + adapters ───────────────────────────
    let config = SystemConfig::default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration rejected: {e}"))?;
    let clock = SystemClock::new();

    let wifi = WifiNetwork::new(
        WifiProfile::new(PRIMARY_SSID, PRIMARY_PASSWORD)
            .map_err(|e| anyhow::anyhow!("primary profile: {e}"))?,
        WifiProfile::new(FALLBACK_SSID, FALLBACK_PASSWORD)
            .map_err(|e| anyhow::anyhow!("fallback profile: {e}"))?,
    );
    let tcp = TcpCommandLink::bind(config.command_port).context("command server bind")?;
    let mut hw = HardwareAdapter::new(IcsSerialBus::new(), wifi, tcp, led);

    let watchdog = Watchdog::new();
    let mut sink = LogEventSink;

    // ── 3. Control loop ───────────────────────────────────────
    let mut service = ControlService::new(config);
    service.start(&mut sink);

    loop {
        hw.maintain();
        service.tick(&mut hw, &clock, &mut sink);
        watchdog.feed();

        // Brief yield; the service paces its own motion ticks.
        clock.delay_ms(5);
    }
}
