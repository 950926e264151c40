//! ADXL345 3-axis accelerometer driver (I2C).
//!
//! Generic over any `embedded_hal::i2c::I2c` bus, so the same driver runs
//! on the ESP-IDF bus wrapper and on a mock bus in host tests.
//!
//! Register map (subset used here):
//!
//! | Reg  | Name        | Use                                   |
//! |------|-------------|---------------------------------------|
//! | 0x00 | DEVID       | must read 0xE5                        |
//! | 0x1E | OFSX        | X offset trim (15.6 mg/LSB)           |
//! | 0x1F | OFSY        | Y offset trim                         |
//! | 0x20 | OFSZ        | Z offset trim                         |
//! | 0x2D | POWER_CTL   | 0x08 = measure                        |
//! | 0x31 | DATA_FORMAT | 0x03 = ±16 g                          |
//! | 0x32 | DATAX0      | start of 6-byte burst X0 X1 Y0 Y1 Z0 Z1 |

use embedded_hal::i2c::{ErrorKind, I2c};
use log::{debug, info};

use crate::app::ports::{AccelerometerPort, DriverError};
use crate::sample::RawAxes;

/// 7-bit address with SDO/ALT ADDRESS tied low.
pub const DEFAULT_ADDRESS: u8 = 0x53;
pub const DEVICE_ID: u8 = 0xE5;

pub mod reg {
    pub const DEVID: u8 = 0x00;
    pub const OFSX: u8 = 0x1E;
    pub const OFSY: u8 = 0x1F;
    pub const OFSZ: u8 = 0x20;
    pub const POWER_CTL: u8 = 0x2D;
    pub const DATA_FORMAT: u8 = 0x31;
    pub const DATAX0: u8 = 0x32;
}

const DATA_FORMAT_16G: u8 = 0x03;
const POWER_CTL_MEASURE: u8 = 0x08;

/// Collapse a bus error into the port's error vocabulary.
///
/// Bus wrappers that enforce a transfer deadline report it as
/// [`ErrorKind::Other`], so that is read as a timeout.
pub fn map_bus_error<E: embedded_hal::i2c::Error>(e: &E) -> DriverError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => DriverError::Nack,
        ErrorKind::Other => DriverError::Timeout,
        _ => DriverError::Bus,
    }
}

pub struct Adxl345<I2C> {
    i2c: I2C,
    address: u8,
    offsets: [i8; 3],
}

impl<I2C: I2c> Adxl345<I2C> {
    pub fn new(i2c: I2C, offsets: [i8; 3]) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS, offsets)
    }

    pub fn with_address(i2c: I2C, address: u8, offsets: [i8; 3]) -> Self {
        Self {
            i2c,
            address,
            offsets,
        }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn read_reg(&mut self, reg: u8) -> Result<u8, DriverError> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|e| map_bus_error(&e))?;
        Ok(buf[0])
    }

    pub fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), DriverError> {
        debug!("ADXL345 write {:#04X} = {:#04X}", reg, val);
        self.i2c
            .write(self.address, &[reg, val])
            .map_err(|e| map_bus_error(&e))
    }

    pub fn device_id(&mut self) -> Result<u8, DriverError> {
        self.read_reg(reg::DEVID)
    }
}

impl<I2C: I2c> AccelerometerPort for Adxl345<I2C> {
    fn init(&mut self) -> Result<(), DriverError> {
        self.write_reg(reg::DATA_FORMAT, DATA_FORMAT_16G)?;
        self.write_reg(reg::POWER_CTL, POWER_CTL_MEASURE)?;
        let [x, y, z] = self.offsets;
        self.write_reg(reg::OFSX, x as u8)?;
        self.write_reg(reg::OFSY, y as u8)?;
        self.write_reg(reg::OFSZ, z as u8)?;

        let id = self.device_id()?;
        if id != DEVICE_ID {
            return Err(DriverError::DeviceIdMismatch(id));
        }
        info!("ADXL345 ready at {:#04X} (offsets {:?})", self.address, self.offsets);
        Ok(())
    }

    fn read_axes(&mut self) -> Result<RawAxes, DriverError> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[reg::DATAX0], &mut buf)
            .map_err(|e| map_bus_error(&e))?;
        Ok(RawAxes::from_le_bytes(buf))
    }
}
