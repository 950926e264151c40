//! Bounded I2C master bus.
//!
//! Wraps the ESP-IDF legacy I2C master driver with raw sys calls and
//! exposes it as an `embedded_hal::i2c::I2c`. Every transfer carries the
//! configured timeout, so a stuck sensor can never stall the firmware loop
//! for longer than that.
//!
//! Timeouts surface as [`ErrorKind::Other`]; the accelerometer driver
//! reads that kind as a timeout.

use core::fmt;

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// `ESP_ERR_TIMEOUT`.
pub const ESP_ERR_TIMEOUT_CODE: i32 = 0x107;
/// `ESP_FAIL`, which the legacy driver returns for a missing ACK.
pub const ESP_FAIL_CODE: i32 = -1;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The transfer did not finish within the bus timeout.
    Timeout,
    /// Any other driver error code.
    Esp(i32),
}

impl BusError {
    pub fn from_code(rc: i32) -> Self {
        if rc == ESP_ERR_TIMEOUT_CODE {
            Self::Timeout
        } else {
            Self::Esp(rc)
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "I2C transfer timed out"),
            Self::Esp(rc) => write!(f, "I2C driver error (rc={})", rc),
        }
    }
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Other,
            Self::Esp(ESP_FAIL_CODE) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Self::Esp(_) => ErrorKind::Bus,
        }
    }
}

/// Convert a millisecond timeout into FreeRTOS ticks, never less than one.
pub fn timeout_ticks(timeout_ms: u32, tick_rate_hz: u32) -> u32 {
    let ticks = u64::from(timeout_ms) * u64::from(tick_rate_hz) / 1000;
    ticks.clamp(1, u64::from(u32::MAX)) as u32
}

// ── ESP-IDF bus ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct BoundedI2c {
    port: i2c_port_t,
    ticks: TickType_t,
}

#[cfg(target_os = "espidf")]
impl BoundedI2c {
    /// Configure `port` as master on the given pins and install the driver.
    pub fn new(
        port: i32,
        sda: i32,
        scl: i32,
        frequency_hz: u32,
        timeout_ms: u32,
    ) -> Result<Self, BusError> {
        // SAFETY: called once from main() before the loop; the config
        // struct outlives the call.
        unsafe {
            let mut conf: i2c_config_t = core::mem::zeroed();
            conf.mode = i2c_mode_t_I2C_MODE_MASTER;
            conf.sda_io_num = sda;
            conf.scl_io_num = scl;
            conf.sda_pullup_en = true;
            conf.scl_pullup_en = true;
            conf.__bindgen_anon_1.master.clk_speed = frequency_hz;

            let rc = i2c_param_config(port as i2c_port_t, &conf);
            if rc != ESP_OK as i32 {
                return Err(BusError::from_code(rc));
            }
            let rc = i2c_driver_install(port as i2c_port_t, conf.mode, 0, 0, 0);
            if rc != ESP_OK as i32 {
                return Err(BusError::from_code(rc));
            }
        }
        let ticks = timeout_ticks(timeout_ms, configTICK_RATE_HZ) as TickType_t;
        log::info!(
            "I2C{}: master on SDA={} SCL={} @ {} Hz, timeout {} ms ({} ticks)",
            port,
            sda,
            scl,
            frequency_hz,
            timeout_ms,
            ticks
        );
        Ok(Self {
            port: port as i2c_port_t,
            ticks,
        })
    }

    fn check(rc: esp_err_t) -> Result<(), BusError> {
        if rc == ESP_OK as i32 {
            Ok(())
        } else {
            Err(BusError::from_code(rc))
        }
    }
}

#[cfg(target_os = "espidf")]
impl embedded_hal::i2c::ErrorType for BoundedI2c {
    type Error = BusError;
}

#[cfg(target_os = "espidf")]
impl embedded_hal::i2c::I2c for BoundedI2c {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        Self::check(unsafe {
            i2c_master_read_from_device(self.port, address, read.as_mut_ptr(), read.len(), self.ticks)
        })
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        Self::check(unsafe {
            i2c_master_write_to_device(self.port, address, write.as_ptr(), write.len(), self.ticks)
        })
    }

    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        Self::check(unsafe {
            i2c_master_write_read_device(
                self.port,
                address,
                write.as_ptr(),
                write.len(),
                read.as_mut_ptr(),
                read.len(),
                self.ticks,
            )
        })
    }

    /// Runs each operation as its own bounded transfer; the common
    /// write-then-read pair goes through `write_read` with a repeated start.
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        use embedded_hal::i2c::Operation;
        match operations {
            [Operation::Write(w), Operation::Read(r)] => self.write_read(address, w, r),
            ops => {
                for op in ops {
                    match op {
                        Operation::Write(w) => self.write(address, w)?,
                        Operation::Read(r) => self.read(address, r)?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for BoundedI2c {
    fn drop(&mut self) {
        unsafe {
            i2c_driver_delete(self.port);
        }
    }
}
