//! BLE transport adapter.
//!
//! Implements [`TransportPort`] (the push side of the GATT server) and
//! bridges Bluedroid callbacks into the device [`EventQueue`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Attribute            | UUID     | Perms                              |
//! |----------------------|----------|------------------------------------|
//! | Accelerometer service| `0xFF10` | primary                            |
//! | Accelerometer value  | `0xFF11` | Read · Write · WriteNoRsp · Notify |
//! | CCCD                 | `0x2902` | Read · Write                       |
//!
//! ## Threading
//!
//! GATTS callbacks run in the Bluedroid task. They never touch the
//! application state: reads are answered from [`PUBLISHED`], everything
//! else is pushed into the queue and handled by the firmware loop.

use core::fmt;

use log::{info, warn};

use super::utils::is_printable_ascii;
use crate::app::ports::{TransportEvent, TransportPort};
use crate::error::CommsError;
use crate::events::{DeviceEvent, EventQueue};
use crate::gatt::{AttributeId, CCCD_HANDLE, ConnHandle, PublishedValue, VALUE_HANDLE};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID16: u16 = 0xFF10;
pub const CHAR_VALUE_UUID16: u16 = 0xFF11;
pub const CCCD_UUID16: u16 = 0x2902;

/// LE General Discoverable, BR/EDR not supported.
pub const ADV_FLAGS: u8 = 0x06;
/// Legacy advertising PDU payload limit.
pub const MAX_ADV_LEN: usize = 31;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_INCOMPLETE_UUID16: u8 = 0x02;
const AD_TYPE_COMPLETE_NAME: u8 = 0x09;

/// Default ATT MTU before the peer negotiates.
pub const DEFAULT_MTU: u16 = 23;

/// Logical id for attributes outside the table. 0 is never a valid ATT handle.
pub const UNKNOWN_ATTRIBUTE: AttributeId = AttributeId(0x0000);

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingError {
    EmptyName,
    InvalidName,
    /// The name does not fit next to the flags and service list.
    TooLong { needed: usize },
}

impl fmt::Display for AdvertisingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "device name is empty"),
            Self::InvalidName => write!(f, "device name must be printable ASCII"),
            Self::TooLong { needed } => {
                write!(f, "advertising data needs {needed} bytes (max {MAX_ADV_LEN})")
            }
        }
    }
}

impl From<AdvertisingError> for CommsError {
    fn from(_: AdvertisingError) -> Self {
        Self::AdvertisingFailed
    }
}

// ───────────────────────────────────────────────────────────────
// Pure helpers
// ───────────────────────────────────────────────────────────────

/// Build the raw advertising payload: flags, complete local name, and the
/// incomplete list of 16-bit service UUIDs.
pub fn build_adv_data(name: &str) -> Result<heapless::Vec<u8, MAX_ADV_LEN>, AdvertisingError> {
    if name.is_empty() {
        return Err(AdvertisingError::EmptyName);
    }
    if !is_printable_ascii(name) {
        return Err(AdvertisingError::InvalidName);
    }
    let needed = 3 + (2 + name.len()) + 4;
    if needed > MAX_ADV_LEN {
        return Err(AdvertisingError::TooLong { needed });
    }

    let [uuid_lo, uuid_hi] = SERVICE_UUID16.to_le_bytes();
    let mut out = heapless::Vec::new();
    // Length checked above, every extend fits.
    let _ = out.extend_from_slice(&[0x02, AD_TYPE_FLAGS, ADV_FLAGS]);
    let _ = out.extend_from_slice(&[(name.len() + 1) as u8, AD_TYPE_COMPLETE_NAME]);
    let _ = out.extend_from_slice(name.as_bytes());
    let _ = out.extend_from_slice(&[0x03, AD_TYPE_INCOMPLETE_UUID16, uuid_lo, uuid_hi]);
    Ok(out)
}

/// Map a stack-assigned attribute handle onto the logical table.
pub fn map_attribute(raw: u16, value_raw: u16, cccd_raw: u16) -> AttributeId {
    match raw {
        0 => UNKNOWN_ATTRIBUTE,
        r if r == value_raw => VALUE_HANDLE,
        r if r == cccd_raw => CCCD_HANDLE,
        _ => UNKNOWN_ATTRIBUTE,
    }
}

/// Bytes to answer a write request with. A prepared (long) write segment
/// is echoed back so the peer can verify it; a plain write gets an empty
/// response.
pub fn write_response_value(is_prepared: bool, data: &[u8]) -> &[u8] {
    if is_prepared {
        data
    } else {
        &[]
    }
}

// ───────────────────────────────────────────────────────────────
// Published value (served from the Bluetooth task)
// ───────────────────────────────────────────────────────────────

/// Snapshot of the value attribute answered to peer reads.
pub static PUBLISHED: PublishedValue = PublishedValue::new();

/// Make `payload` the value peers read from now on.
pub fn publish_value(payload: &[u8]) {
    PUBLISHED.publish(payload);
}

/// Answer one (long) read of the value attribute: at most `mtu - 1` bytes
/// starting at `offset`.
pub fn serve_value_read(offset: usize, mtu: u16, out: &mut [u8]) -> usize {
    let max = usize::from(mtu.saturating_sub(1)).min(out.len());
    if max == 0 {
        return 0;
    }
    PUBLISHED.read(offset, &mut out[..max])
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ── ESP-IDF BLE static state (ISR-safe atomics) ───────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_VALUE_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CCCD_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CCCD_VALUE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_MTU: AtomicU32 = AtomicU32::new(DEFAULT_MTU as u32);
#[cfg(target_os = "espidf")]
static BLE_ADV_INTERVAL: AtomicU32 = AtomicU32::new(0x30);
/// Last congestion state reported by the stack. Lets the adapter recover
/// when the queued uncongest event itself was dropped.
#[cfg(target_os = "espidf")]
static BLE_CONGESTED: AtomicBool = AtomicBool::new(false);

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn raw_attribute(raw: u16) -> AttributeId {
    map_attribute(
        raw,
        BLE_VALUE_HANDLE.load(AtomicOrdering::Relaxed) as u16,
        BLE_CCCD_HANDLE.load(AtomicOrdering::Relaxed) as u16,
    )
}

#[cfg(target_os = "espidf")]
unsafe fn start_advertising() {
    use esp_idf_svc::sys::*;
    let interval = BLE_ADV_INTERVAL.load(AtomicOrdering::Relaxed) as u16;
    let mut adv_params = esp_ble_adv_params_t {
        adv_int_min: interval,
        adv_int_max: interval,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    };
    unsafe { esp_ble_gap_start_advertising(&mut adv_params) };
}

#[cfg(target_os = "espidf")]
unsafe fn send_response(
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    conn_id: u16,
    trans_id: u32,
    attr_handle: u16,
    offset: u16,
    value: &[u8],
) {
    use esp_idf_svc::sys::*;
    let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
    unsafe {
        let n = value.len().min(rsp.attr_value.value.len());
        rsp.attr_value.value[..n].copy_from_slice(&value[..n]);
        rsp.attr_value.len = n as u16;
        rsp.attr_value.handle = attr_handle;
        rsp.attr_value.offset = offset;
        esp_ble_gatts_send_response(
            gatts_if,
            conn_id,
            trans_id,
            esp_gatt_status_t_ESP_GATT_OK,
            &mut rsp,
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            unsafe { start_advertising() };
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::push_event;
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid16_to_esp(SERVICE_UUID16),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // service + char decl + value + CCCD
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 4) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let p = unsafe { &(*param).create };
            let svc_handle = p.service_handle;
            BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            let mut char_uuid = uuid16_to_esp(CHAR_VALUE_UUID16);
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    (ESP_GATT_CHAR_PROP_BIT_READ
                        | ESP_GATT_CHAR_PROP_BIT_WRITE_NR
                        | ESP_GATT_CHAR_PROP_BIT_WRITE
                        | ESP_GATT_CHAR_PROP_BIT_NOTIFY) as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let p = unsafe { &(*param).add_char };
            BLE_VALUE_HANDLE.store(p.attr_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: value char (handle={})", p.attr_handle);
            let mut descr_uuid = uuid16_to_esp(CCCD_UUID16);
            unsafe {
                esp_ble_gatts_add_char_descr(
                    BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16,
                    &mut descr_uuid,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let p = unsafe { &(*param).add_char_descr };
            BLE_CCCD_HANDLE.store(p.attr_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: CCCD (handle={}), table complete", p.attr_handle);
        }
        esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
            let p = unsafe { &(*param).mtu };
            BLE_MTU.store(p.mtu as u32, AtomicOrdering::Relaxed);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_MTU.store(DEFAULT_MTU as u32, AtomicOrdering::Relaxed);
            BLE_CONGESTED.store(false, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client connected (conn_id={})", p.conn_id);
            push_event(DeviceEvent::Transport(TransportEvent::Connected(ConnHandle(
                p.conn_id,
            ))));
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            let p = unsafe { &(*param).disconnect };
            BLE_CCCD_VALUE.store(0, AtomicOrdering::Relaxed);
            BLE_CONGESTED.store(false, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client disconnected (conn_id={})", p.conn_id);
            push_event(DeviceEvent::Transport(TransportEvent::Disconnected(
                ConnHandle(p.conn_id),
            )));
            unsafe { start_advertising() };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONGEST_EVT => {
            let p = unsafe { &(*param).congest };
            BLE_CONGESTED.store(p.congested, AtomicOrdering::Relaxed);
            push_event(DeviceEvent::Transport(TransportEvent::Congestion {
                handle: ConnHandle(p.conn_id),
                congested: p.congested,
            }));
        }
        esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => {
            let p = unsafe { &(*param).read };
            if !p.need_rsp {
                return;
            }
            let mut buf = [0u8; crate::sample::MAX_PAYLOAD_LEN];
            let n = match raw_attribute(p.handle) {
                VALUE_HANDLE => serve_value_read(
                    usize::from(p.offset),
                    BLE_MTU.load(AtomicOrdering::Relaxed) as u16,
                    &mut buf,
                ),
                CCCD_HANDLE => {
                    let v = BLE_CCCD_VALUE.load(AtomicOrdering::Relaxed) as u16;
                    buf[..2].copy_from_slice(&v.to_le_bytes());
                    2
                }
                _ => 0,
            };
            unsafe { send_response(gatts_if, p.conn_id, p.trans_id, p.handle, p.offset, &buf[..n]) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
            let attribute = raw_attribute(p.handle);
            if attribute == CCCD_HANDLE {
                let v = crate::gatt::decode_cccd(data);
                BLE_CCCD_VALUE.store(u32::from(v), AtomicOrdering::Relaxed);
            }
            if p.need_rsp {
                let echo = write_response_value(p.is_prep, data);
                unsafe { send_response(gatts_if, p.conn_id, p.trans_id, p.handle, p.offset, echo) };
            }
            push_event(DeviceEvent::write(
                ConnHandle(p.conn_id),
                attribute,
                u16::from(p.is_prep),
                p.offset,
                data,
            ));
        }
        esp_gatts_cb_event_t_ESP_GATTS_EXEC_WRITE_EVT => {
            // Segments were already forwarded as they arrived; commit and
            // cancel are both acknowledged.
            let p = unsafe { &(*param).exec_write };
            log::debug!(
                "BLE GATTS: exec write (conn_id={}, flag={})",
                p.conn_id,
                p.exec_write_flag
            );
            unsafe {
                esp_ble_gatts_send_response(
                    gatts_if,
                    p.conn_id,
                    p.trans_id,
                    esp_gatt_status_t_ESP_GATT_OK,
                    core::ptr::null_mut(),
                );
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter<'q> {
    state: BleState,
    device_name: heapless::String<24>,
    adv_interval: u16,
    queue: &'q EventQueue,
    connected: Option<ConnHandle>,
    congested: bool,
    /// Send opportunity requested while congested, granted on uncongest.
    deferred: Option<ConnHandle>,
    /// Simulation: notifications "sent" so far.
    #[cfg(not(target_os = "espidf"))]
    sim_notified: u32,
}

impl<'q> BleAdapter<'q> {
    pub fn new(device_name: heapless::String<24>, adv_interval: u16, queue: &'q EventQueue) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            adv_interval,
            queue,
            connected: None,
            congested: false,
            deferred: None,
            #[cfg(not(target_os = "espidf"))]
            sim_notified: 0,
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BleState::Advertising | BleState::Connected)
    }

    pub fn connected(&self) -> Option<ConnHandle> {
        self.connected
    }

    /// Bring up the stack and start advertising.
    pub fn start(&mut self) -> Result<(), CommsError> {
        let adv = match build_adv_data(&self.device_name) {
            Ok(adv) => adv,
            Err(e) => {
                warn!("BLE: cannot advertise '{}': {}", self.device_name, e);
                self.state = BleState::Failed;
                return Err(e.into());
            }
        };
        info!("BLE: starting advertising as '{}'", self.device_name);
        if let Err(e) = self.platform_start(&adv) {
            self.state = BleState::Failed;
            return Err(e);
        }
        self.state = BleState::Advertising;
        Ok(())
    }

    /// Once per loop pass: hand out a grant the queue had no room for,
    /// as soon as the link is uncongested.
    pub fn poll(&mut self) {
        #[cfg(target_os = "espidf")]
        if self.connected.is_some() {
            self.congested = BLE_CONGESTED.load(AtomicOrdering::Relaxed);
        }
        if self.congested {
            return;
        }
        if let Some(h) = self.deferred.take() {
            self.grant(h);
        }
    }

    /// Pending grant waiting for queue room or an uncongested link.
    pub fn deferred(&self) -> Option<ConnHandle> {
        self.deferred
    }

    /// Queue a send-ready for `handle`, or hold it for [`poll`](Self::poll)
    /// when the queue is full. A request must never go unanswered.
    fn grant(&mut self, handle: ConnHandle) {
        if !self.queue.push(DeviceEvent::SendReady(handle)) {
            warn!("BLE: event queue full, holding send grant for {:?}", handle);
            self.deferred = Some(handle);
        }
    }

    /// Track link state. Called by the firmware loop before the event
    /// reaches the application.
    pub fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(handle) => {
                info!("BLE: central connected ({:?})", handle);
                self.connected = Some(handle);
                self.congested = false;
                self.state = BleState::Connected;
            }
            TransportEvent::Disconnected(handle) => {
                info!("BLE: central disconnected ({:?})", handle);
                self.connected = None;
                self.congested = false;
                self.deferred = None;
                if self.state != BleState::Idle {
                    self.state = BleState::Advertising;
                }
            }
            TransportEvent::Congestion { handle, congested } => {
                self.congested = congested;
                if !congested {
                    if let Some(h) = self.deferred.take() {
                        info!("BLE: link {:?} uncongested, granting deferred send", handle);
                        self.grant(h);
                    }
                }
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self, adv: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;

        fn check(what: &str, ret: esp_err_t) -> Result<(), CommsError> {
            if ret == ESP_OK as i32 {
                Ok(())
            } else {
                log::error!("BLE: {} failed ({})", what, ret);
                Err(CommsError::BleInitFailed)
            }
        }

        BLE_ADV_INTERVAL.store(u32::from(self.adv_interval), AtomicOrdering::Relaxed);
        let mut name: heapless::Vec<u8, 25> = heapless::Vec::new();
        let _ = name.extend_from_slice(self.device_name.as_bytes());
        let _ = name.push(0);

        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check("bt_controller_init", esp_bt_controller_init(&mut bt_cfg))?;
            check(
                "bt_controller_enable",
                esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE),
            )?;
            check("bluedroid_init", esp_bluedroid_init())?;
            check("bluedroid_enable", esp_bluedroid_enable())?;

            check(
                "gap_register_callback",
                esp_ble_gap_register_callback(Some(ble_gap_event_handler)),
            )?;
            check(
                "gatts_register_callback",
                esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)),
            )?;
            check("gatts_app_register", esp_ble_gatts_app_register(0))?;

            esp_ble_gap_set_device_name(name.as_ptr() as *const _);
            // Advertising starts once the stack confirms the raw data.
            check(
                "config_adv_data_raw",
                esp_ble_gap_config_adv_data_raw(adv.as_ptr() as *mut u8, adv.len() as u32),
            )?;
        }
        info!(
            "BLE(espidf): Bluedroid stack initialized, advertising as '{}'",
            self.device_name
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self, adv: &[u8]) -> Result<(), CommsError> {
        info!(
            "BLE(sim): advertising '{}' (service 0x{:04X}, {} adv bytes, interval 0x{:04X})",
            self.device_name,
            SERVICE_UUID16,
            adv.len(),
            self.adv_interval
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, handle: ConnHandle, payload: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;
        let attr = BLE_VALUE_HANDLE.load(AtomicOrdering::Relaxed) as u16;
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t,
                handle.0,
                attr,
                payload.len() as u16,
                payload.as_ptr() as *mut u8,
                false,
            )
        };
        if ret == ESP_OK as i32 {
            Ok(())
        } else {
            Err(CommsError::NotifyFailed(ret))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, handle: ConnHandle, payload: &[u8]) -> Result<(), CommsError> {
        self.sim_notified += 1;
        info!("BLE(sim): notify {:?} ({} bytes)", handle, payload.len());
        Ok(())
    }

    /// Simulation: notifications pushed so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_notified(&self) -> u32 {
        self.sim_notified
    }
}

// ───────────────────────────────────────────────────────────────
// TransportPort implementation
// ───────────────────────────────────────────────────────────────

impl TransportPort for BleAdapter<'_> {
    fn request_send_opportunity(&mut self, handle: ConnHandle) {
        if self.congested {
            info!("BLE: link congested, deferring send for {:?}", handle);
            self.deferred = Some(handle);
        } else {
            self.grant(handle);
        }
    }

    fn notify(
        &mut self,
        handle: ConnHandle,
        attribute: AttributeId,
        payload: &[u8],
    ) -> Result<(), CommsError> {
        if self.connected != Some(handle) {
            return Err(CommsError::NotConnected);
        }
        if attribute != VALUE_HANDLE {
            warn!("BLE: notify for non-notifying attribute {:?}", attribute);
            return Err(CommsError::NotifyFailed(-1));
        }
        self.platform_notify(handle, payload)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
