//! End-to-end runs of the firmware loop on the host: heartbeat → queue →
//! AppService → simulated BLE transport → queue.

use crate::mock_hw::{MockSensor, RecordingSink};

use accelbeacon::adapters::ble::BleAdapter;
use accelbeacon::app::events::AppEvent;
use accelbeacon::app::ports::{SchedulerDelegate, TransportEvent};
use accelbeacon::app::service::AppService;
use accelbeacon::config::DeviceConfig;
use accelbeacon::events::{DeviceEvent, EVENT_QUEUE_DEPTH, EventQueue};
use accelbeacon::gatt::{CCCD_HANDLE, ConnHandle, VALUE_HANDLE};
use accelbeacon::sample::RawAxes;
use accelbeacon::scheduler::Heartbeat;

const H: ConnHandle = ConnHandle(3);

struct QueueDelegate<'a>(&'a EventQueue);

impl SchedulerDelegate for QueueDelegate<'_> {
    fn on_heartbeat(&mut self, _fire_count: u64) {
        self.0.push(DeviceEvent::HeartbeatTick);
    }
}

struct Rig<'q> {
    queue: &'q EventQueue,
    app: AppService,
    ble: BleAdapter<'q>,
    sensor: MockSensor,
    sink: RecordingSink,
    heartbeat: Heartbeat,
}

impl<'q> Rig<'q> {
    fn new(queue: &'q EventQueue) -> Self {
        let config = DeviceConfig::default();
        let mut sensor = MockSensor::fixed(RawAxes { x: 320, y: -320, z: 160 });
        let mut sink = RecordingSink::new();
        let mut app = AppService::new(&config);
        app.start(&mut sensor, &mut sink);
        let mut ble = BleAdapter::new(config.device_name.clone(), config.adv_interval, queue);
        ble.start().unwrap();
        let mut heartbeat = Heartbeat::new(config.heartbeat_period_ms);
        heartbeat.arm(0);
        Self {
            queue,
            app,
            ble,
            sensor,
            sink,
            heartbeat,
        }
    }

    /// One loop iteration at `now_ms`.
    fn step(&mut self, now_ms: u64) {
        let mut delegate = QueueDelegate(self.queue);
        self.heartbeat.poll_with(now_ms, &mut delegate);
        self.ble.poll();
        let Self {
            queue,
            app,
            ble,
            sensor,
            sink,
            ..
        } = self;
        queue.drain(|event| {
            if let DeviceEvent::Transport(t) = &event {
                ble.on_transport_event(*t);
            }
            app.handle_event(event, sensor, ble, sink);
        });
    }

    fn run_until(&mut self, from_ms: u64, to_ms: u64) {
        for t in (from_ms..=to_ms).step_by(10) {
            self.step(t);
        }
    }

    fn notified(&self) -> usize {
        self.sink
            .count(|e| matches!(e, AppEvent::Notified { .. }))
    }
}

fn subscribe(queue: &EventQueue) {
    queue.push(DeviceEvent::Transport(TransportEvent::Connected(H)));
    queue.push(DeviceEvent::write(H, CCCD_HANDLE, 0, 0, &[0x01, 0x00]));
}

#[test]
fn one_notification_per_heartbeat_while_subscribed() {
    let queue = EventQueue::new();
    let mut rig = Rig::new(&queue);
    subscribe(&queue);

    rig.run_until(0, 5_000);
    assert_eq!(rig.notified(), 5);
    assert_eq!(rig.ble.sim_notified(), 5);
    assert!(queue.is_empty());
}

#[test]
fn nothing_is_pushed_without_a_subscriber() {
    let queue = EventQueue::new();
    let mut rig = Rig::new(&queue);
    queue.push(DeviceEvent::Transport(TransportEvent::Connected(H)));

    rig.run_until(0, 3_000);
    assert_eq!(rig.notified(), 0);
    assert_eq!(rig.app.counters().heartbeats, 3);
}

#[test]
fn congestion_delays_but_does_not_lose_the_push() {
    let queue = EventQueue::new();
    let mut rig = Rig::new(&queue);
    subscribe(&queue);
    queue.push(DeviceEvent::Transport(TransportEvent::Congestion {
        handle: H,
        congested: true,
    }));

    rig.run_until(0, 2_500);
    assert_eq!(rig.notified(), 0);
    // Only one request while the first is outstanding.
    assert_eq!(rig.app.counters().send_requests, 1);

    queue.push(DeviceEvent::Transport(TransportEvent::Congestion {
        handle: H,
        congested: false,
    }));
    rig.step(2_510);
    assert_eq!(rig.notified(), 1);
}

#[test]
fn disconnect_stops_pushes_until_resubscribed() {
    let queue = EventQueue::new();
    let mut rig = Rig::new(&queue);
    subscribe(&queue);
    rig.run_until(0, 2_000);
    assert_eq!(rig.notified(), 2);

    queue.push(DeviceEvent::Transport(TransportEvent::Disconnected(H)));
    rig.run_until(2_010, 5_000);
    assert_eq!(rig.notified(), 2);

    subscribe(&queue);
    rig.run_until(5_010, 6_000);
    assert_eq!(rig.notified(), 3);
}

#[test]
fn full_queue_delays_but_does_not_lose_the_push() {
    let queue = EventQueue::new();
    let mut rig = Rig::new(&queue);
    subscribe(&queue);
    rig.step(0);
    assert!(rig.app.subscription().is_enabled());

    // A burst of peer writes leaves no room for the send grant.
    for _ in 0..EVENT_QUEUE_DEPTH {
        assert!(queue.push(DeviceEvent::write(H, VALUE_HANDLE, 0, 0, &[0xAA])));
    }
    rig.app.on_heartbeat(&mut rig.sensor, &mut rig.ble, &mut rig.sink);
    assert!(rig.app.send_pending());
    assert_eq!(rig.ble.deferred(), Some(H));

    // Next pass still finds the queue full; the one after delivers.
    rig.step(10);
    assert_eq!(rig.notified(), 0);
    rig.step(20);
    assert_eq!(rig.notified(), 1);
    assert!(!rig.app.send_pending());

    // Later beats keep pushing.
    rig.run_until(30, 3_000);
    assert_eq!(rig.notified(), 4);
    assert_eq!(rig.app.counters().send_ready_dropped, 0);
}
