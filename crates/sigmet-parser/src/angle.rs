//! Binary angle and derived radar quantities.
//!
//! SIGMET stores angles as binary fractions of a full circle: 16-bit angles
//! have 65536 counts per revolution, 32-bit angles 2^32. All conversions
//! here return degrees rounded with [`round_half_down`].

use crate::rounding::round_half_down;

const BIN16_COUNTS: f64 = 65_536.0;
const BIN32_COUNTS: f64 = 4_294_967_296.0;

/// Convert a 16-bit binary angle to degrees (2 decimals).
///
/// The raw value is read as unsigned, so `-1` is just short of a full turn.
pub fn angle16(raw: i16) -> f32 {
    let counts = raw as u16 as f64;
    round_half_down(counts / BIN16_COUNTS * 360.0, 2)
}

/// Convert a 32-bit binary angle to degrees (3 decimals), unsigned.
pub fn angle32(raw: i32) -> f32 {
    let counts = raw as u32 as f64;
    round_half_down(counts / BIN32_COUNTS * 360.0, 3)
}

/// Convert a signed 32-bit binary angle to degrees (3 decimals).
///
/// Station latitude and longitude use this form so that southern and
/// western positions come out negative.
pub fn geo_angle32(raw: i32) -> f32 {
    round_half_down(raw as f64 / BIN32_COUNTS * 360.0, 3)
}

/// Elevation of a ray in degrees (2 decimals).
///
/// Negative raw values are negated before conversion, so the result is
/// never below zero.
pub fn elevation(raw: i16) -> f32 {
    let counts = (raw as i32).unsigned_abs() as f64;
    round_half_down(counts / BIN16_COUNTS * 360.0, 2)
}

/// Azimuth at the middle of a ray from its begin and end binary angles.
///
/// A ray whose begin angle is in the upper half-turn (negative raw value)
/// and whose end angle is in the lower one crosses north, and the span is
/// measured through 360°. The result is wrapped into `[0, 360)`.
pub fn azimuth_midpoint(begin: i16, end: i16) -> f32 {
    let az0 = angle16(begin);
    let az1 = angle16(end);
    let span = if begin < 0 && end > 0 {
        (360.0f32 - az0).abs() + az1.abs()
    } else {
        (az0 - az1).abs()
    };

    let mut mid = az0 as f64 + span as f64 * 0.5;
    if mid >= 360.0 {
        mid -= 360.0;
    }
    let rounded = round_half_down(mid, 2);
    if rounded >= 360.0 {
        rounded - 360.0
    } else {
        rounded
    }
}

/// Distance between consecutive gates (2 decimals).
///
/// Computed in single precision from the first and last gate ranges.
/// Fewer than two bins has no spacing and yields `0.0`.
pub fn gate_step(range_first: f32, range_last: f32, bins: i16) -> f32 {
    if bins <= 1 {
        return 0.0;
    }
    let step = (range_last - range_first) / (bins as f32 - 1.0);
    round_half_down(step as f64, 2)
}

/// Nyquist velocity in m/s (2 decimals) from PRF in Hz and wavelength in
/// hundredths of a centimetre.
pub fn nyquist(prf: i32, wavelength: i32) -> f32 {
    let product = prf as i64 * wavelength as i64;
    let quarter_wave = product as f64 * 0.01 * 0.25;
    round_half_down(quarter_wave * 0.01, 2)
}
