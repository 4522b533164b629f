//! Conversion of raw sample bytes to physical values.

use serde::{Deserialize, Serialize};

use crate::error::{SigmetError, SigmetResult};
use crate::ray::{DataType, MISSING_VALUE};
use crate::rounding::round_half_down;

/// Velocity scaling per multi-PRF mode (1:1, 2:3, 3:4, 4:5).
const MULTI_PRF_COEFFICIENTS: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

/// Per-file constants needed to calibrate samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationContext {
    multiprf: i16,
    nyquist: f32,
}

impl CalibrationContext {
    /// Build a context, rejecting multi-PRF modes outside 0-3.
    pub fn new(multiprf: i16, nyquist: f32) -> SigmetResult<Self> {
        if !(0..MULTI_PRF_COEFFICIENTS.len() as i16).contains(&multiprf) {
            return Err(SigmetError::invalid_header(format!(
                "multi-PRF mode {multiprf} outside 0-3"
            )));
        }
        Ok(Self { multiprf, nyquist })
    }

    pub fn multiprf(&self) -> i16 {
        self.multiprf
    }

    /// Nyquist velocity (m/s).
    pub fn nyquist(&self) -> f32 {
        self.nyquist
    }

    /// Velocity scaling coefficient for the multi-PRF mode.
    pub fn coefficient(&self) -> f64 {
        MULTI_PRF_COEFFICIENTS[self.multiprf as usize]
    }

    /// Calibrate one raw byte. See [`calibrate`].
    pub fn calibrate(&self, data_type: DataType, raw: u8) -> f32 {
        calibrate(data_type, raw, self)
    }

    fn velocity(&self, raw: u8) -> f64 {
        ((raw as f64 - 128.0) / 127.0) * self.nyquist as f64 * self.coefficient()
    }
}

/// Convert a raw sample to its physical value, rounded to 2 decimals.
///
/// Raw 0 means no data for every moment and yields [`MISSING_VALUE`].
pub fn calibrate(data_type: DataType, raw: u8, ctx: &CalibrationContext) -> f32 {
    if raw == 0 {
        return MISSING_VALUE;
    }
    let value = match data_type {
        DataType::TotalPower | DataType::Reflectivity => (raw as f64 - 64.0) * 0.5,
        DataType::Velocity => ctx.velocity(raw),
        DataType::Width => (raw as f64 / 256.0) * ctx.velocity(raw),
        DataType::DifferentialReflectivity => (raw as f64 - 128.0) / 16.0,
    };
    round_half_down(value, 2)
}
