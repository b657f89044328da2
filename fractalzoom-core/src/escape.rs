//! Escape-time reference kernel for a single point.

/// |z|² beyond which the orbit is known to diverge.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Per-pixel outcome of the escape-time iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscapeResult {
    /// Updates of z performed before |z|² exceeded 4, or `max_iterations`.
    pub iterations: u32,
    /// |z|² after the last update. 0 for early-bailout points.
    pub final_magnitude_sq: f64,
}

impl EscapeResult {
    /// Result for a point that never escapes.
    pub fn interior(max_iterations: u32) -> Self {
        Self {
            iterations: max_iterations,
            final_magnitude_sq: 0.0,
        }
    }

    pub fn is_interior(&self, max_iterations: u32) -> bool {
        self.iterations >= max_iterations
    }
}

/// Closed-form test for the main cardioid and the period-2 bulb.
/// Points that pass provably never escape.
#[inline]
pub fn in_main_cardioid_or_bulb(re: f64, im: f64) -> bool {
    let im_sq = im * im;
    let shifted = re - 0.25;
    let q = shifted * shifted + im_sq;
    if q * (q + shifted) < im_sq * 0.25 {
        return true;
    }
    let re_plus_one = re + 1.0;
    re_plus_one * re_plus_one + im_sq < 0.0625
}

/// Iterate z ← z² + c from z = 0 until |z|² > 4 or the budget runs out.
#[inline]
pub fn escape_time(re: f64, im: f64, max_iterations: u32) -> EscapeResult {
    if in_main_cardioid_or_bulb(re, im) {
        return EscapeResult::interior(max_iterations);
    }
    iterate(re, im, max_iterations)
}

/// The bare iteration with no early bailout.
#[inline]
pub fn iterate(re: f64, im: f64, max_iterations: u32) -> EscapeResult {
    let mut u = 0.0_f64;
    let mut v = 0.0_f64;
    let mut u_sq = 0.0_f64;
    let mut v_sq = 0.0_f64;
    let mut iterations = 0;

    while u_sq + v_sq <= ESCAPE_RADIUS_SQ && iterations < max_iterations {
        let u_new = u_sq - v_sq + re;
        v = 2.0 * (u * v) + im;
        u = u_new;
        u_sq = u * u;
        v_sq = v * v;
        iterations += 1;
    }

    EscapeResult {
        iterations,
        final_magnitude_sq: u_sq + v_sq,
    }
}
