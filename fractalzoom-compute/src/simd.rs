//! Four pixels per trip with `wide::f64x4`, rows spread across the rayon pool.
//!
//! Lanes carry independent pixels. A lane stops contributing once it escapes,
//! but the vector keeps iterating until every lane is done or the budget runs
//! out. Counts and final magnitudes match the scalar kernel exactly.

use crate::backend::render_rows;
use crate::{ComputeBackend, ComputeError, Frame};
use fractalzoom_core::{
    colorize, in_main_cardioid_or_bulb, BackendKind, EscapeResult, ViewRequest, CHANNELS,
    ESCAPE_RADIUS_SQ,
};
use wide::{f64x4, CmpLe};

pub const LANES: usize = 4;

#[derive(Clone, Copy, Debug, Default)]
pub struct SimdBackend;

impl SimdBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Escape-time iteration for four points at once.
pub fn escape_time_x4(
    re: [f64; LANES],
    im: [f64; LANES],
    max_iterations: u32,
) -> [EscapeResult; LANES] {
    let max = max_iterations as f64;
    let mut preset = [0.0_f64; LANES];
    let mut live = [0.0_f64; LANES];
    for lane in 0..LANES {
        if in_main_cardioid_or_bulb(re[lane], im[lane]) {
            preset[lane] = max;
        } else {
            // All bits set marks the lane active
            live[lane] = f64::from_bits(u64::MAX);
        }
    }

    let c_re = f64x4::from(re);
    let c_im = f64x4::from(im);
    let two = f64x4::splat(2.0);
    let one = f64x4::splat(1.0);
    let radius_sq = f64x4::splat(ESCAPE_RADIUS_SQ);

    let mut active = f64x4::from(live);
    let mut count = f64x4::from(preset);
    let mut final_mag = f64x4::ZERO;

    let mut u = f64x4::ZERO;
    let mut v = f64x4::ZERO;
    let mut u_sq = f64x4::ZERO;
    let mut v_sq = f64x4::ZERO;

    let mut trip = 0;
    while trip < max_iterations && active.any() {
        let u_new = (u_sq - v_sq) + c_re;
        v = two * (u * v) + c_im;
        u = u_new;
        u_sq = u * u;
        v_sq = v * v;
        let mag = u_sq + v_sq;

        // Only lanes that were still iterating take this update
        final_mag = active.blend(mag, final_mag);
        count = active.blend(count + one, count);
        active = active & mag.cmp_le(radius_sq);
        trip += 1;
    }

    let count = count.to_array();
    let final_mag = final_mag.to_array();
    std::array::from_fn(|lane| EscapeResult {
        iterations: count[lane] as u32,
        final_magnitude_sq: final_mag[lane],
    })
}

/// Fill one row of RGB floats, four pixels at a time.
pub fn render_row(request: &ViewRequest, y: u32, row: &mut [f32]) {
    let width = request.resolution_x;
    for (block, chunk) in row.chunks_mut(LANES * CHANNELS).enumerate() {
        let first = block as u32 * LANES as u32;
        let mut re = [0.0; LANES];
        let mut im = [0.0; LANES];
        for lane in 0..LANES {
            // Tail lanes repeat the last pixel and are discarded
            let x = (first + lane as u32).min(width - 1);
            let (r, i) = request
                .bounds
                .point_at(x, y, request.resolution_x, request.resolution_y);
            re[lane] = r;
            im[lane] = i;
        }

        let results = escape_time_x4(re, im, request.max_iterations);
        for (rgb, result) in chunk.chunks_exact_mut(CHANNELS).zip(results.iter()) {
            rgb.copy_from_slice(&colorize(
                result,
                request.max_iterations,
                request.colour_period,
            ));
        }
    }
}

impl ComputeBackend for SimdBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simd
    }

    fn render(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError> {
        render_rows(request, |y, row| render_row(request, y, row))
    }
}
