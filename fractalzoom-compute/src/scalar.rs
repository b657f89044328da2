//! One pixel at a time in f64, rows spread across the rayon pool.

use crate::backend::render_rows;
use crate::{ComputeBackend, ComputeError, Frame};
use fractalzoom_core::{colorize, escape_time, BackendKind, ViewRequest, CHANNELS};

#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarBackend;

impl ScalarBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Fill one row of RGB floats with the reference kernel.
pub fn render_row(request: &ViewRequest, y: u32, row: &mut [f32]) {
    for (x, rgb) in row.chunks_exact_mut(CHANNELS).enumerate() {
        let (re, im) =
            request
                .bounds
                .point_at(x as u32, y, request.resolution_x, request.resolution_y);
        let result = escape_time(re, im, request.max_iterations);
        rgb.copy_from_slice(&colorize(
            &result,
            request.max_iterations,
            request.colour_period,
        ));
    }
}

impl ComputeBackend for ScalarBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Scalar
    }

    fn render(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError> {
        render_rows(request, |y, row| render_row(request, y, row))
    }
}
