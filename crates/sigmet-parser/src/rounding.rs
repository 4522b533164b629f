//! Decimal rounding with ties toward zero.
//!
//! Every angle, gate step and calibrated value in a SIGMET volume is reported
//! rounded to a fixed number of decimals with "half down" semantics: the exact
//! binary value of the `f64` input is rounded to `scale` decimal places, ties
//! go toward zero, and the decimal result is converted to the nearest `f32`.
//! Default float formatting rounds ties to even and works on the shortest
//! decimal representation, so it cannot be used here.

/// Round `value` to `scale` decimal places, ties toward zero.
///
/// Non-finite inputs are passed through. Results that round to zero are
/// returned as `+0.0`.
pub fn round_half_down(value: f64, scale: u32) -> f32 {
    if !value.is_finite() {
        return value as f32;
    }
    if value == 0.0 {
        return 0.0;
    }

    let negative = value.is_sign_negative();
    let bits = value.abs().to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exp - 1075)
    };

    // Integers carry no fractional digits to round away.
    if exponent >= 0 {
        return value as f32;
    }

    // |value| * 10^scale = mantissa * 10^scale / 2^shift
    let pow10 = 10u128.pow(scale);
    let scaled = mantissa as u128 * pow10;
    let shift = exponent.unsigned_abs();
    let quotient = if shift >= 128 {
        0
    } else {
        let q = scaled >> shift;
        let remainder = scaled & ((1u128 << shift) - 1);
        let half = 1u128 << (shift - 1);
        if remainder > half {
            q + 1
        } else {
            q
        }
    };

    if quotient == 0 {
        return 0.0;
    }

    let magnitude = decimal_to_f32(quotient, scale, pow10);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Nearest `f32` to `quotient / 10^scale`.
fn decimal_to_f32(quotient: u128, scale: u32, pow10: u128) -> f32 {
    // Both operands are exact in f32 below 2^24, so one IEEE division is
    // correctly rounded.
    if quotient < (1 << 24) && pow10 < (1 << 24) {
        return quotient as f32 / pow10 as f32;
    }
    format!("{quotient}e-{scale}")
        .parse::<f32>()
        .unwrap_or(quotient as f32 / pow10 as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_ties_round_toward_zero() {
        assert_eq!(round_half_down(13.375, 2), 13.37);
        assert_eq!(round_half_down(0.125, 2), 0.12);
        assert_eq!(round_half_down(2.5, 0), 2.0);
        assert_eq!(round_half_down(-2.5, 0), -2.0);
        assert_eq!(round_half_down(-0.125, 2), -0.12);
    }

    #[test]
    fn test_uses_binary_value_not_shortest_decimal() {
        // 0.015 is stored slightly below the tie, 0.035 slightly above it
        assert_eq!(round_half_down(0.015, 2), 0.01);
        assert_eq!(round_half_down(0.035, 2), 0.04);
    }

    #[test]
    fn test_rounds_above_half_up() {
        assert_eq!(round_half_down(359.994_506_835_937_5, 2), 359.99);
        assert_eq!(round_half_down(1.4999, 2), 1.5);
        assert_eq!(round_half_down(-999.99, 2), -999.99);
    }

    #[test]
    fn test_zero_and_tiny_values() {
        assert_eq!(round_half_down(0.0, 2).to_bits(), 0.0f32.to_bits());
        assert_eq!(round_half_down(-0.0, 2).to_bits(), 0.0f32.to_bits());
        assert_eq!(round_half_down(-0.001, 2).to_bits(), 0.0f32.to_bits());
        assert_eq!(round_half_down(1e-300, 3), 0.0);
    }

    #[test]
    fn test_integers_and_non_finite() {
        assert_eq!(round_half_down(180.0, 2), 180.0);
        assert_eq!(round_half_down(-64.0, 2), -64.0);
        assert!(round_half_down(f64::NAN, 2).is_nan());
        assert_eq!(round_half_down(f64::INFINITY, 2), f32::INFINITY);
    }

    #[test]
    fn test_three_decimals() {
        assert_eq!(round_half_down(45.0625, 3), 45.062);
        assert_eq!(round_half_down(12.345_678, 3), 12.346);
    }
}
