//! Sensor driver and the bus it talks over.

pub mod adxl345;
pub mod i2c_bus;
