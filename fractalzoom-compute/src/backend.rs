//! The capability every compute backend provides.

use crate::ComputeError;
use fractalzoom_core::{BackendKind, PixelBuffer, ViewRequest};

/// One rendered frame, handed to the presentation layer.
#[derive(Clone, Debug)]
pub struct Frame {
    pub pixels: PixelBuffer,
    /// Adjacent pixels collapsed onto the same f64 coordinate.
    pub precision_warning: bool,
    pub compute_time_ms: f64,
}

/// Produces coloured frames for view requests.
///
/// Each backend owns its working buffers. Calls on one backend never overlap;
/// `&mut self` makes that explicit.
pub trait ComputeBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Render `request` into a new frame.
    fn render(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError>;

    /// Short human-readable description for logs and benchmark output.
    fn describe(&self) -> String {
        self.kind().to_string()
    }
}

/// Shared frame pipeline for the f64 CPU backends.
///
/// Validates the request, checks for f64 precision loss and hands off to
/// [`render_rows_unchecked`]. `row_kernel` fills one row of RGB floats for
/// pixel row `y`.
pub(crate) fn render_rows<F>(request: &ViewRequest, row_kernel: F) -> Result<Frame, ComputeError>
where
    F: Fn(u32, &mut [f32]) + Sync,
{
    request.validate()?;

    let precision_warning = fractalzoom_core::precision_loss(
        &request.bounds,
        request.resolution_x,
        request.resolution_y,
    );
    if precision_warning {
        log::warn!(
            "Precision loss at x=[{:e}, {:e}], y=[{:e}, {:e}]: adjacent pixels share a coordinate",
            request.bounds.x_min,
            request.bounds.x_max,
            request.bounds.y_min,
            request.bounds.y_max
        );
    }

    render_rows_unchecked(
        request.resolution_x,
        request.resolution_y,
        request.blur_enabled,
        precision_warning,
        row_kernel,
    )
}

/// Fan rows out over the rayon pool, blur if asked and stamp the elapsed time.
pub(crate) fn render_rows_unchecked<F>(
    width: u32,
    height: u32,
    blur_enabled: bool,
    precision_warning: bool,
    row_kernel: F,
) -> Result<Frame, ComputeError>
where
    F: Fn(u32, &mut [f32]) + Sync,
{
    use rayon::prelude::*;

    let bytes = width as u64 * height as u64 * fractalzoom_core::BYTES_PER_PIXEL;
    if usize::try_from(bytes).is_err() {
        return Err(ComputeError::TooLarge {
            requested: bytes,
            limit: usize::MAX as u64,
        });
    }
    let start = std::time::Instant::now();

    let mut pixels = PixelBuffer::new(width, height);
    let stride = pixels.row_stride();
    pixels
        .as_mut_slice()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| row_kernel(y as u32, row));

    if blur_enabled {
        crate::blur::blur_in_place(&mut pixels);
    }

    let compute_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    log::debug!("Rendered {}x{} in {:.1}ms", width, height, compute_time_ms);

    Ok(Frame {
        pixels,
        precision_warning,
        compute_time_ms,
    })
}
