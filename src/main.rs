//! AccelBeacon Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single event-driven loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Adxl345<BoundedI2c>   BleAdapter      LogEventSink  Esp32Time │
//! │  (AccelerometerPort)   (TransportPort) (EventSink)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  SampleStore · Subscription · send handshake           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Heartbeat (delegate-driven) ──▶ EVENTS ◀── Bluedroid task     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info};

use accelbeacon::adapters::ble::{self, BleAdapter};
use accelbeacon::adapters::log_sink::LogEventSink;
use accelbeacon::adapters::time::Esp32TimeAdapter;
use accelbeacon::app::ports::{AccelerometerPort, SchedulerDelegate};
use accelbeacon::app::service::AppService;
use accelbeacon::config::DeviceConfig;
use accelbeacon::drivers::adxl345::Adxl345;
use accelbeacon::drivers::i2c_bus::BoundedI2c;
use accelbeacon::error::{self as fw, Error};
use accelbeacon::events::{DeviceEvent, EVENTS, push_event};
use accelbeacon::pins;
use accelbeacon::scheduler::Heartbeat;

/// Sleep between loop iterations; bounds heartbeat jitter.
const LOOP_IDLE_MS: u32 = 10;

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the heartbeat (which knows nothing about the event system)
// to the device event queue.

struct EventQueueDelegate;

impl SchedulerDelegate for EventQueueDelegate {
    fn on_heartbeat(&mut self, _fire_count: u64) {
        push_event(DeviceEvent::HeartbeatTick);
    }
}

/// Fatal init failure: log and park. The device never advertises.
fn halt(reason: &Error) -> ! {
    error!("Bring-up failed: {}, halting", reason);
    loop {
        FreeRtos::delay_ms(1000);
    }
}

/// Bus and sensor bring-up. Any failure here is fatal.
fn init_sensor(config: &DeviceConfig) -> fw::Result<Adxl345<BoundedI2c>> {
    let bus = BoundedI2c::new(
        pins::I2C_PORT,
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        config.bus_frequency_hz,
        config.bus_timeout_ms,
    )
    .map_err(|e| {
        error!("I2C{}: {}", pins::I2C_PORT, e);
        Error::Init("I2C bus")
    })?;
    let mut sensor = Adxl345::new(bus, config.axis_offsets);
    sensor.init()?;
    info!("ADXL345 ready");
    Ok(sensor)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AccelBeacon v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = DeviceConfig::default();
    if let Err(e) = run(&config) {
        halt(&e);
    }
    Ok(())
}

/// Bring-up followed by the event loop. Returns only on a bring-up error.
fn run(config: &DeviceConfig) -> fw::Result<()> {
    config.validate()?;

    // ── 2. Sensor bring-up ────────────────────────────────────
    let mut sensor = init_sensor(config)?;

    // ── 3. Core + boot sample ─────────────────────────────────
    let mut log_sink = LogEventSink::new();
    let mut app = AppService::new(config);
    app.start(&mut sensor, &mut log_sink);
    ble::publish_value(app.payload());
    let mut published_generation = app.store().generation();

    // ── 4. BLE ────────────────────────────────────────────────
    let mut ble = BleAdapter::new(config.device_name.clone(), config.adv_interval, &EVENTS);
    ble.start()?;

    // ── 5. Heartbeat ──────────────────────────────────────────
    let time = Esp32TimeAdapter::new();
    let mut heartbeat = Heartbeat::new(config.heartbeat_period_ms);
    let mut delegate = EventQueueDelegate;
    heartbeat.arm(time.uptime_ms());

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        heartbeat.poll_with(time.uptime_ms(), &mut delegate);
        // Hand out a send grant the queue had no room for last pass.
        ble.poll();

        EVENTS.drain(|event| {
            if let DeviceEvent::Transport(t) = &event {
                ble.on_transport_event(*t);
            }
            app.handle_event(event, &mut sensor, &mut ble, &mut log_sink);
        });

        // Reads are served from the published snapshot in the BT task.
        let generation = app.store().generation();
        if generation != published_generation {
            ble::publish_value(app.payload());
            published_generation = generation;
        }

        FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
