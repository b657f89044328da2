//! 3×3 cross-shaped smoothing pass over a coloured frame.

use fractalzoom_core::{PixelBuffer, CHANNELS};
use rayon::prelude::*;

/// Kernel weights, row-major. They sum to 8 and are divided by 8.
pub const BLUR_WEIGHTS: [[f32; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 0.0]];
const BLUR_NORM: f32 = 8.0;

/// Blur `pixels` in place. Neighbours outside the image clamp to the edge.
///
/// Reads come from a snapshot of the input so every output pixel sees the
/// unblurred neighbourhood.
pub fn blur_in_place(pixels: &mut PixelBuffer) {
    let width = pixels.width() as usize;
    let height = pixels.height() as usize;
    if width == 0 || height == 0 {
        return;
    }
    let source = pixels.as_slice().to_vec();
    let stride = width * CHANNELS;

    pixels
        .as_mut_slice()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = [0.0_f32; 3];
                for (ky, weights) in BLUR_WEIGHTS.iter().enumerate() {
                    let sy = clamp_offset(y, ky, height);
                    for (kx, &w) in weights.iter().enumerate() {
                        if w == 0.0 {
                            continue;
                        }
                        let sx = clamp_offset(x, kx, width);
                        let i = sy * stride + sx * CHANNELS;
                        for c in 0..CHANNELS {
                            acc[c] += w * source[i + c];
                        }
                    }
                }
                let o = x * CHANNELS;
                for c in 0..CHANNELS {
                    row[o + c] = acc[c] / BLUR_NORM;
                }
            }
        });
}

/// `pos + k - 1`, clamped to `[0, len)`.
#[inline]
fn clamp_offset(pos: usize, k: usize, len: usize) -> usize {
    (pos + k).saturating_sub(1).min(len - 1)
}
