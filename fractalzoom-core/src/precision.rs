//! Precision checks for a view at a given resolution.
//!
//! Two questions: has f64 run out (adjacent pixels map to the same
//! coordinate), and how many mantissa bits would a big-float render need.

use crate::{BigViewBounds, ViewBounds};

/// Safety margin for rounding errors in arithmetic operations.
const SAFETY_BITS: u64 = 64;

/// Smallest precision handed to the arbitrary-precision backend.
pub const MIN_PRECISION_BITS: usize = 128;

/// True when one pixel step is lost in f64 rounding on either axis.
///
/// The first pixel's neighbour is interpolated exactly the way the kernels
/// map pixels; if it rounds back onto `min` the image degenerates into
/// blocks and a higher-precision backend is needed.
pub fn precision_loss(bounds: &ViewBounds, resolution_x: u32, resolution_y: u32) -> bool {
    let step_x = 1.0 / resolution_x as f64;
    let step_y = 1.0 / resolution_y as f64;
    let next_x = (1.0 - step_x) * bounds.x_min + step_x * bounds.x_max;
    let next_y = (1.0 - step_y) * bounds.y_min + step_y * bounds.y_max;
    next_x == bounds.x_min || next_y == bounds.y_min
}

/// Mantissa bits a big-float render of `bounds` needs at this resolution.
///
/// Covers the bits to tell adjacent pixels apart relative to the largest
/// coordinate magnitude, plus log2(iterations) for error growth along the
/// orbit, plus a fixed safety margin. Rounded up to a power of two.
pub fn suggested_precision_bits(
    bounds: &BigViewBounds,
    resolution: (u32, u32),
    max_iterations: u32,
) -> usize {
    let width = bounds.x_max.sub(&bounds.x_min);
    let height = bounds.y_max.sub(&bounds.y_min);

    let log2_delta_x = width.log2_approx() - (resolution.0 as f64).log2();
    let log2_delta_y = height.log2_approx() - (resolution.1 as f64).log2();
    let log2_min_delta = log2_delta_x.min(log2_delta_y);

    let log2_m = [&bounds.x_min, &bounds.x_max, &bounds.y_min, &bounds.y_max]
        .iter()
        .map(|b| b.log2_approx())
        .fold(f64::NEG_INFINITY, f64::max)
        .max(0.0);

    let log2_ratio = log2_m - log2_min_delta;
    let bits_from_ratio = if log2_ratio.is_finite() {
        log2_ratio.ceil().max(0.0) as u64
    } else {
        0
    };

    let iter_bits = if max_iterations > 1 {
        (max_iterations as f64).log2().ceil() as u64
    } else {
        0
    };

    let total_bits = bits_from_ratio + iter_bits + SAFETY_BITS;
    (total_bits as usize).next_power_of_two().max(MIN_PRECISION_BITS)
}
