//! GPIO / peripheral pin assignments for the AccelBeacon board.
//!
//! Single source of truth: the bus setup in `main()` references this module
//! rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Accelerometer bus (ADXL345 breakout, SDO tied low → address 0x53)
// ---------------------------------------------------------------------------

/// I2C controller used for the sensor.
pub const I2C_PORT: i32 = 0;
/// I2C data line.
pub const I2C_SDA_GPIO: i32 = 4;
/// I2C clock line.
pub const I2C_SCL_GPIO: i32 = 5;
