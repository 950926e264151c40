//! Sample store: the latest accelerometer reading and its wire payload.
//!
//! Only the most recent sample is ever observable. Each successful read is
//! converted to physical units, serialised into a scratch buffer, and only
//! then swapped into the store in one assignment, so a reader always sees
//! bytes and length that belong together.
//!
//! Wire format (byte-compatible with existing peers):
//!
//! ```text
//! {"x":10.000000,"y":-10.000000,"z":5.000000}
//! ```

use core::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::app::ports::{AccelerometerPort, DriverError};

/// Upper bound of the serialised payload in bytes.
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Raw LSB per output unit at full resolution (ADXL345, ±16 g).
pub const DEFAULT_SENSITIVITY: f32 = 32.0;

/// Bounded payload buffer; capacity is the wire bound.
pub type Payload = heapless::String<MAX_PAYLOAD_LEN>;

// ───────────────────────────────────────────────────────────────
// Types
// ───────────────────────────────────────────────────────────────

/// Raw axis registers as read from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawAxes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawAxes {
    /// Decode DATAX0..DATAZ1 (low byte first).
    pub fn from_le_bytes(b: [u8; 6]) -> Self {
        Self {
            x: i16::from_le_bytes([b[0], b[1]]),
            y: i16::from_le_bytes([b[2], b[3]]),
            z: i16::from_le_bytes([b[4], b[5]]),
        }
    }
}

/// One reading in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    /// Scale raw counts by the fixed sensitivity divisor.
    pub fn from_raw(raw: RawAxes, divisor: f32) -> Self {
        Self {
            x: f32::from(raw.x) / divisor,
            y: f32::from(raw.y) / divisor,
            z: f32::from(raw.z) / divisor,
        }
    }

    /// Format as the JSON wire payload into `out` (cleared first).
    pub fn write_json<const N: usize>(
        &self,
        out: &mut heapless::String<N>,
    ) -> Result<(), SampleError> {
        out.clear();
        write!(
            out,
            "{{\"x\":{:.6},\"y\":{:.6},\"z\":{:.6}}}",
            self.x, self.y, self.z
        )
        .map_err(|_| SampleError::Overflow)
    }
}

/// Decode a wire payload back into a [`Sample`] (peer side / diagnostics).
pub fn parse_payload(bytes: &[u8]) -> Result<Sample, serde_json::Error> {
    serde_json::from_slice(bytes)
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// The driver read failed; nothing changed.
    Driver(DriverError),
    /// The formatted payload would not fit in [`MAX_PAYLOAD_LEN`].
    Overflow,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "{e}"),
            Self::Overflow => write!(f, "payload exceeds {MAX_PAYLOAD_LEN} bytes"),
        }
    }
}

impl From<DriverError> for SampleError {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

// ───────────────────────────────────────────────────────────────
// Store
// ───────────────────────────────────────────────────────────────

/// Single-writer holder of the latest sample and its payload.
pub struct SampleStore {
    divisor: f32,
    latest: Option<Sample>,
    payload: Payload,
    /// Bumped on every commit; lets the firmware loop republish lazily.
    generation: u32,
}

impl SampleStore {
    pub fn new(divisor: f32) -> Self {
        Self {
            divisor,
            latest: None,
            payload: Payload::new(),
            generation: 0,
        }
    }

    /// Read the sensor and commit the result.
    ///
    /// On any error the previously committed sample stays in place.
    pub fn sample(&mut self, sensor: &mut impl AccelerometerPort) -> Result<Sample, SampleError> {
        let raw = sensor.read_axes()?;
        self.update(raw)
    }

    /// Convert, serialise and commit one raw reading.
    pub fn update(&mut self, raw: RawAxes) -> Result<Sample, SampleError> {
        let sample = Sample::from_raw(raw, self.divisor);
        let mut scratch = Payload::new();
        sample.write_json(&mut scratch)?;

        // Commit: bytes and length move together.
        self.payload = scratch;
        self.latest = Some(sample);
        self.generation = self.generation.wrapping_add(1);
        Ok(sample)
    }

    /// Latest committed sample, `None` before the first successful read.
    pub fn latest(&self) -> Option<Sample> {
        self.latest
    }

    /// Current payload bytes (empty before the first successful read).
    pub fn payload(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
