//! Single-byte orientation packing.
//!
//! Yaw covers the full circle `[0, 2π)` and pitch covers `[-π/2, π/2]`, each
//! mapped linearly onto byte codes `0..=255`. Encoding rounds to the nearest
//! code, so a decoded angle is within half a step of the original (modulo 2π
//! for yaw).

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Radians per yaw code.
pub const YAW_STEP: f64 = TAU / 255.0;

/// Radians per pitch code.
pub const PITCH_STEP: f64 = PI / 255.0;

/// Packs a yaw angle (any value, radians) into one byte.
///
/// Code 255 would alias 2π, so yaws that round up to it wrap to 0.
pub fn pack_yaw(yaw: f64) -> u8 {
    if !yaw.is_finite() {
        return 0;
    }
    let code = (yaw.rem_euclid(TAU) / YAW_STEP).round() as u32;
    (code % 255) as u8
}

/// Unpacks a yaw code into `[0, 2π)`.
pub fn unpack_yaw(code: u8) -> f64 {
    let yaw = f64::from(code) * YAW_STEP;
    if yaw >= TAU { yaw - TAU } else { yaw }
}

/// Packs a pitch angle (radians), clamping to `[-π/2, π/2]`.
pub fn pack_pitch(pitch: f64) -> u8 {
    if pitch.is_nan() {
        return pack_pitch(0.0);
    }
    ((pitch + FRAC_PI_2) / PITCH_STEP).round().clamp(0.0, 255.0) as u8
}

/// Unpacks a pitch code into `[-π/2, π/2]`.
pub fn unpack_pitch(code: u8) -> f64 {
    (f64::from(code) * PITCH_STEP - FRAC_PI_2).clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// Smallest distance between two angles on the circle.
pub fn yaw_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_yaw_roundtrips_exactly() {
        assert_eq!(pack_yaw(0.0), 0);
        assert_eq!(unpack_yaw(pack_yaw(0.0)), 0.0);
    }

    #[test]
    fn test_yaw_near_full_turn_wraps_to_zero() {
        let code = pack_yaw(TAU - 1e-6);
        assert_eq!(code, 0);
        assert!(yaw_distance(unpack_yaw(code), TAU - 1e-6) < YAW_STEP);
    }

    #[test]
    fn test_negative_yaw_normalised() {
        let yaw = -FRAC_PI_2;
        let decoded = unpack_yaw(pack_yaw(yaw));
        assert!(yaw_distance(decoded, yaw) <= YAW_STEP / 2.0 + 1e-12);
    }

    #[test]
    fn test_yaw_error_within_half_step() {
        for i in 0..1000 {
            let yaw = i as f64 * 0.0137 - 3.0;
            let decoded = unpack_yaw(pack_yaw(yaw));
            assert!(
                yaw_distance(decoded, yaw) <= YAW_STEP / 2.0 + 1e-12,
                "yaw {yaw} decoded to {decoded}"
            );
        }
    }

    #[test]
    fn test_pitch_extremes_within_one_step() {
        for pitch in [-FRAC_PI_2, FRAC_PI_2, 0.0] {
            let decoded = unpack_pitch(pack_pitch(pitch));
            assert!((decoded - pitch).abs() <= PITCH_STEP, "{pitch} -> {decoded}");
        }
        assert_eq!(pack_pitch(-FRAC_PI_2), 0);
        assert_eq!(pack_pitch(FRAC_PI_2), 255);
    }

    #[test]
    fn test_pitch_out_of_range_clamps() {
        assert_eq!(pack_pitch(10.0), 255);
        assert_eq!(pack_pitch(-10.0), 0);
        assert_eq!(pack_pitch(f64::NAN), pack_pitch(0.0));
    }

    #[test]
    fn test_every_code_decodes_in_range() {
        for code in 0..=255u8 {
            let yaw = unpack_yaw(code);
            assert!((0.0..TAU).contains(&yaw), "yaw code {code} -> {yaw}");
            let pitch = unpack_pitch(code);
            assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&pitch), "pitch code {code} -> {pitch}");
        }
    }

    #[test]
    fn test_codes_are_stable() {
        for code in 0..255u8 {
            assert_eq!(pack_yaw(unpack_yaw(code)), code);
        }
        for code in 0..=255u8 {
            assert_eq!(pack_pitch(unpack_pitch(code)), code);
        }
    }
}
