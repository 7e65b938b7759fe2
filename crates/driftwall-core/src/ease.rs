#![forbid(unsafe_code)]

//! Frame-rate-independent motion helpers.
//!
//! The kinetic model runs on variable frame deltas, so both easing toward a
//! target and bleeding off momentum are expressed as exponential curves in
//! `dt` rather than fixed per-frame multipliers.

/// Move `current` toward `target` by an exponential ease.
///
/// `rate` is the approach rate constant in 1/s; the per-frame blend factor
/// is `min(1, dt * rate)`, so large deltas converge in a single step instead
/// of overshooting.
#[inline]
#[must_use]
pub fn approach(current: f32, target: f32, dt: f32, rate: f32) -> f32 {
    let blend = (dt * rate).clamp(0.0, 1.0);
    current + (target - current) * blend
}

/// Exponential decay of `value` over `dt` seconds.
///
/// `base` is the fraction retained after one full second; e.g. `base = 0.12`
/// keeps 12% of the value per second regardless of how the second is split
/// into frames.
#[inline]
#[must_use]
pub fn decay(value: f32, base: f32, dt: f32) -> f32 {
    value * base.max(0.0).powf(dt.max(0.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- approach tests ----

    #[test]
    fn approach_moves_toward_target() {
        let next = approach(0.0, 1.0, 0.016, 5.0);
        assert!(next > 0.0 && next < 1.0);
    }

    #[test]
    fn approach_large_dt_lands_on_target() {
        let next = approach(0.0, 1.0, 1.0, 5.0);
        assert!((next - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn approach_zero_dt_is_noop() {
        let next = approach(0.3, 1.0, 0.0, 5.0);
        assert!((next - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn approach_converges_over_repeated_ticks() {
        let mut v = 0.0_f32;
        for _ in 0..200 {
            v = approach(v, 1.0, 0.016, 5.0);
        }
        assert!((v - 1.0).abs() < 1e-3);
    }

    #[test]
    fn approach_works_downward() {
        let mut v = 1.0_f32;
        for _ in 0..200 {
            v = approach(v, 0.08, 0.016, 5.0);
        }
        assert!((v - 0.08).abs() < 1e-3);
    }

    // ---- decay tests ----

    #[test]
    fn decay_retains_base_after_one_second() {
        let v = decay(100.0, 0.12, 1.0);
        assert!((v - 12.0).abs() < 1e-3);
    }

    #[test]
    fn decay_is_frame_rate_independent() {
        // Splitting one second into 60 frames must match a single 1s step.
        let mut split = 100.0_f32;
        for _ in 0..60 {
            split = decay(split, 0.12, 1.0 / 60.0);
        }
        let whole = decay(100.0, 0.12, 1.0);
        assert!((split - whole).abs() < 0.05);
    }

    #[test]
    fn decay_zero_dt_is_noop() {
        let v = decay(42.0, 0.12, 0.0);
        assert!((v - 42.0).abs() < f32::EPSILON);
    }

    #[test]
    fn decay_negative_dt_clamped() {
        let v = decay(42.0, 0.12, -1.0);
        assert!((v - 42.0).abs() < f32::EPSILON);
    }

    #[test]
    fn decay_preserves_sign() {
        assert!(decay(-80.0, 0.12, 0.5) < 0.0);
    }
}
