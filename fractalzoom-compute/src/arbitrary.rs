//! Escape time in big-float arithmetic for views deeper than f64 resolves.

use crate::backend::render_rows_unchecked;
use crate::{ComputeBackend, ComputeError, Frame};
use fractalzoom_core::{
    colorize, suggested_precision_bits, BackendKind, BigFloat, BigViewBounds, BoundsError,
    EscapeResult, RenderParameters, ViewRequest, CHANNELS, ESCAPE_RADIUS_SQ,
};

pub const DEFAULT_PRECISION_BITS: usize = 256;

#[derive(Clone, Copy, Debug)]
pub struct ArbitraryPrecisionBackend {
    precision_bits: usize,
}

impl Default for ArbitraryPrecisionBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION_BITS)
    }
}

impl ArbitraryPrecisionBackend {
    pub fn new(precision_bits: usize) -> Self {
        Self { precision_bits }
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    pub fn set_precision_bits(&mut self, precision_bits: usize) {
        self.precision_bits = precision_bits;
    }

    /// Render bounds given directly as big floats.
    ///
    /// Arithmetic runs at the larger of the backend's precision and the
    /// precision the bounds carry. The frame's precision warning is set when
    /// that is below what the view needs.
    pub fn render_deep(
        &self,
        bounds: &BigViewBounds,
        params: &RenderParameters,
    ) -> Result<Frame, ComputeError> {
        for (axis, min, max) in [
            ('x', &bounds.x_min, &bounds.x_max),
            ('y', &bounds.y_min, &bounds.y_max),
        ] {
            if max <= min {
                return Err(BoundsError::EmptyRange {
                    axis,
                    min: min.to_f64(),
                    max: max.to_f64(),
                }
                .into());
            }
        }
        params.validate()?;

        let bits = self.precision_bits.max(bounds.precision_bits());
        let needed = suggested_precision_bits(
            bounds,
            (params.resolution_x, params.resolution_y),
            params.max_iterations,
        );
        let precision_warning = bits < needed;
        if precision_warning {
            log::warn!(
                "View needs about {} bits but rendering at {}; expect blocky output",
                needed,
                bits
            );
        }

        let columns = axis_coordinates(&bounds.x_min, &bounds.x_max, params.resolution_x, bits);
        let rows = axis_coordinates(&bounds.y_min, &bounds.y_max, params.resolution_y, bits);
        let max_iterations = params.max_iterations;
        let colour_period = params.colour_period;

        log::debug!(
            "Big-float render {}x{} at {} bits",
            params.resolution_x,
            params.resolution_y,
            bits
        );

        render_rows_unchecked(
            params.resolution_x,
            params.resolution_y,
            params.blur_enabled,
            precision_warning,
            |y, row| {
                let im = &rows[y as usize];
                for (re, rgb) in columns.iter().zip(row.chunks_exact_mut(CHANNELS)) {
                    let result = escape_time_big(re, im, max_iterations, bits);
                    rgb.copy_from_slice(&colorize(&result, max_iterations, colour_period));
                }
            },
        )
    }
}

/// `(1 - i/n) * min + (i/n) * max` for every pixel index on one axis.
fn axis_coordinates(min: &BigFloat, max: &BigFloat, n: u32, bits: usize) -> Vec<BigFloat> {
    let one = BigFloat::one(bits);
    let count = BigFloat::from_u32(n, bits);
    (0..n)
        .map(|i| {
            let t = BigFloat::from_u32(i, bits).div(&count);
            one.sub(&t).mul(min).add(&t.mul(max))
        })
        .collect()
}

/// Cardioid and period-2 bulb test in big-float arithmetic.
pub fn in_main_cardioid_or_bulb_big(re: &BigFloat, im: &BigFloat, bits: usize) -> bool {
    let quarter = BigFloat::with_precision(0.25, bits);
    let im_sq = im.square();
    let shifted = re.sub(&quarter);
    let q = shifted.square().add(&im_sq);
    if q.mul(&q.add(&shifted)) < im_sq.mul(&quarter) {
        return true;
    }
    let re_plus_one = re.add(&BigFloat::one(bits));
    re_plus_one.square().add(&im_sq) < BigFloat::with_precision(0.0625, bits)
}

/// The reference escape-time kernel with every operation in big floats.
pub fn escape_time_big(
    re: &BigFloat,
    im: &BigFloat,
    max_iterations: u32,
    bits: usize,
) -> EscapeResult {
    if in_main_cardioid_or_bulb_big(re, im, bits) {
        return EscapeResult::interior(max_iterations);
    }

    let radius_sq = BigFloat::with_precision(ESCAPE_RADIUS_SQ, bits);
    let two = BigFloat::with_precision(2.0, bits);
    let mut u = BigFloat::zero(bits);
    let mut v = BigFloat::zero(bits);
    let mut u_sq = BigFloat::zero(bits);
    let mut v_sq = BigFloat::zero(bits);
    let mut mag = BigFloat::zero(bits);
    let mut iterations = 0;

    while mag <= radius_sq && iterations < max_iterations {
        let u_new = u_sq.sub(&v_sq).add(re);
        v = two.mul(&u.mul(&v)).add(im);
        u = u_new;
        u_sq = u.square();
        v_sq = v.square();
        mag = u_sq.add(&v_sq);
        iterations += 1;
    }

    EscapeResult {
        iterations,
        final_magnitude_sq: mag.to_f64(),
    }
}

impl ComputeBackend for ArbitraryPrecisionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ArbitraryPrecision
    }

    fn render(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError> {
        request.validate()?;
        let bounds = BigViewBounds::from_view_bounds(&request.bounds, self.precision_bits);
        let params = RenderParameters {
            resolution_x: request.resolution_x,
            resolution_y: request.resolution_y,
            max_iterations: request.max_iterations,
            colour_period: request.colour_period,
            blur_enabled: request.blur_enabled,
        };
        self.render_deep(&bounds, &params)
    }

    fn describe(&self) -> String {
        format!("{} ({} bits)", self.kind(), self.precision_bits)
    }
}
