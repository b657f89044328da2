//! Smooth-iteration colouring shared by every backend.

use crate::EscapeResult;

/// Default length of one colour cycle, in smooth iterations.
pub const DEFAULT_COLOUR_PERIOD: f64 = 128.0;

const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

/// Continuous iteration count `n - ln(log2(|z|²))`.
///
/// Only meaningful for escaped points, where |z|² > 4.
#[inline]
pub fn smooth_iteration(iterations: u32, final_magnitude_sq: f64) -> f64 {
    iterations as f64 - (final_magnitude_sq.ln() / std::f64::consts::LN_2).ln()
}

/// Position in the colour cycle, in [0, 1).
///
/// Uses the Euclidean remainder so the first few iterations, whose smooth
/// count can dip below zero, wrap to the end of the cycle instead of going
/// negative.
#[inline]
pub fn cycle_position(smooth: f64, colour_period: f64) -> f64 {
    let t = smooth.rem_euclid(colour_period) / colour_period;
    // rem_euclid can round up to exactly colour_period for tiny negatives
    if t >= 1.0 {
        0.0
    } else {
        t
    }
}

/// Four-segment gradient: blue → cyan → yellow → red → fade to black.
#[inline]
pub fn gradient(t: f64) -> [f32; 3] {
    let rgb = if t < 0.25 {
        let s = t * 4.0;
        [0.0, 0.5 * s, s]
    } else if t < 0.5 {
        let s = (t - 0.25) * 4.0;
        [s, 0.5 + 0.5 * s, 1.0]
    } else if t < 0.75 {
        let s = (t - 0.5) * 4.0;
        [1.0, 1.0 - 0.5 * s, 1.0 - s]
    } else {
        let s = 1.0 - (t - 0.75) * 4.0;
        [s, 0.5 * s, 0.0]
    };
    rgb.map(|c| c.clamp(0.0, 1.0) as f32)
}

/// Colour for one pixel. Points that used the whole budget are black.
#[inline]
pub fn colorize(result: &EscapeResult, max_iterations: u32, colour_period: f64) -> [f32; 3] {
    if result.is_interior(max_iterations) {
        return BLACK;
    }
    let smooth = smooth_iteration(result.iterations, result.final_magnitude_sq);
    gradient(cycle_position(smooth, colour_period))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_unit_range(rgb: [f32; 3]) -> bool {
        rgb.iter().all(|c| (0.0..=1.0).contains(c))
    }

    #[test]
    fn interior_is_black() {
        let r = EscapeResult::interior(50);
        assert_eq!(colorize(&r, 50, 128.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn first_iteration_escape_stays_in_range() {
        // c = 2+2i: n = 1, |z|² = 8, smooth = 1 - ln 3 < 0
        let r = EscapeResult {
            iterations: 1,
            final_magnitude_sq: 8.0,
        };
        let smooth = smooth_iteration(1, 8.0);
        assert!(smooth < 0.0);
        let t = cycle_position(smooth, 128.0);
        assert!((0.0..1.0).contains(&t));
        assert!(in_unit_range(colorize(&r, 50, 128.0)));
    }

    #[test]
    fn gradient_is_continuous_at_breakpoints() {
        let eps = 1e-9;
        for b in [0.25, 0.5, 0.75] {
            let below = gradient(b - eps);
            let above = gradient(b);
            for c in 0..3 {
                assert!(
                    (below[c] - above[c]).abs() < 1e-6,
                    "jump at {b} channel {c}: {below:?} vs {above:?}"
                );
            }
        }
    }

    #[test]
    fn gradient_endpoints() {
        assert_eq!(gradient(0.0), [0.0, 0.0, 0.0]);
        assert_eq!(gradient(0.25), [0.0, 0.5, 1.0]);
        assert_eq!(gradient(0.5), [1.0, 1.0, 1.0]);
        assert_eq!(gradient(0.75), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn gradient_stays_in_unit_range() {
        for i in 0..1000 {
            let t = i as f64 / 1000.0;
            assert!(in_unit_range(gradient(t)), "t = {t}");
        }
    }

    #[test]
    fn colour_cycles_with_period() {
        let a = EscapeResult {
            iterations: 10,
            final_magnitude_sq: 20.0,
        };
        let b = EscapeResult {
            iterations: 10 + 64,
            final_magnitude_sq: 20.0,
        };
        let ca = colorize(&a, 1000, 64.0);
        let cb = colorize(&b, 1000, 64.0);
        for c in 0..3 {
            assert!((ca[c] - cb[c]).abs() < 1e-5);
        }
    }

    #[test]
    fn cycle_position_wraps_negative_values() {
        let t = cycle_position(-1.0, 128.0);
        assert!((t - 127.0 / 128.0).abs() < 1e-12);
    }
}
