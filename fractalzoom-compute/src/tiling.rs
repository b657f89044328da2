//! Split a request into horizontal row tiles when its buffers exceed what a
//! backend can allocate in one piece.
//!
//! Each tile is rendered with one extra halo row above and below (clamped at
//! the image edges) so the blur pass sees the same neighbourhood it would in a
//! single full-size render. Only the interior rows are copied into the result.
//! Renderers that dispatch fixed-size work groups also need every tile's pixel
//! count to be a multiple of the group size; the bottom tile reaches further
//! up into already-rendered rows when that keeps it aligned.

use crate::{ComputeError, Frame};
use fractalzoom_core::{PixelBuffer, ViewRequest};

/// Halo rows rendered on each side of a tile.
pub const HALO_ROWS: u32 = 1;

/// A backend that can render one tile-sized request at a time.
pub trait TileRenderer {
    /// Largest single allocation the renderer can make, in bytes.
    fn max_allocation_bytes(&self) -> u64;

    /// Render a request no larger than the renderer's tile capacity.
    fn render_tile(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError>;

    /// Tile pixel counts must be a multiple of this.
    fn work_group_size(&self) -> u32 {
        1
    }
}

/// One horizontal band of the output image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    /// First output row this tile produces.
    pub first_row: u32,
    /// Output rows this tile produces.
    pub rows: u32,
    /// Halo rows rendered above `first_row` (0 on the top tile).
    pub halo_top: u32,
    /// Halo rows rendered below the last row (0 on the bottom tile).
    pub halo_bottom: u32,
}

impl Tile {
    /// Rows the renderer actually produces for this tile.
    pub fn rendered_rows(&self) -> u32 {
        self.rows + self.halo_top + self.halo_bottom
    }

    /// First image row the renderer produces for this tile.
    pub fn rendered_first_row(&self) -> u32 {
        self.first_row - self.halo_top
    }
}

/// How a request is cut into tiles for a given allocation limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TilePlan {
    /// Rows rendered per tile, halo included. The bottom tile may render fewer.
    pub rendered_rows: u32,
    pub tiles: Vec<Tile>,
}

impl TilePlan {
    /// Plan for `request` under `max_allocation` bytes, with no work-group
    /// constraint.
    pub fn new(request: &ViewRequest, max_allocation: u64) -> Result<Self, ComputeError> {
        Self::with_work_group(request, max_allocation, 1)
    }

    /// Plan for `request` under `max_allocation` bytes where every tile's
    /// pixel count must divide into groups of `work_group_size`.
    ///
    /// A tile's raw buffer and output buffer must both fit, so a tile may use
    /// half the limit. Each tile renders the same aligned row count except the
    /// bottom one, which runs to the image edge and is padded upward onto rows
    /// it then discards.
    pub fn with_work_group(
        request: &ViewRequest,
        max_allocation: u64,
        work_group_size: u32,
    ) -> Result<Self, ComputeError> {
        let height = request.resolution_y;
        let step = row_step(request.resolution_x, work_group_size);
        let capacity_rows = (max_allocation / 2) / request.row_bytes().max(1);
        let aligned_rows = capacity_rows / u64::from(step) * u64::from(step);
        let rendered_rows = aligned_rows.min(u64::from(height)) as u32;
        if rendered_rows < height && rendered_rows <= 2 * HALO_ROWS {
            return Err(ComputeError::Tiling(format!(
                "{} bytes cannot hold a tile of {}-pixel rows with halo in groups of {}",
                max_allocation, request.resolution_x, work_group_size
            )));
        }
        // Only a frame that is itself aligned can be split into aligned tiles
        let frame_aligned = height % step == 0;

        let mut tiles = Vec::new();
        let mut first_row = 0;
        while first_row < height {
            let halo_top = first_row.min(HALO_ROWS);
            let start = first_row - halo_top;
            if start + rendered_rows >= height {
                let mut tile = Tile {
                    first_row,
                    rows: height - first_row,
                    halo_top,
                    halo_bottom: 0,
                };
                if frame_aligned {
                    let rendered = tile.rendered_rows();
                    tile.halo_top += rendered.next_multiple_of(step) - rendered;
                }
                tiles.push(tile);
                break;
            }
            let rows = rendered_rows - halo_top - HALO_ROWS;
            tiles.push(Tile {
                first_row,
                rows,
                halo_top,
                halo_bottom: HALO_ROWS,
            });
            first_row += rows;
        }

        Ok(Self {
            rendered_rows,
            tiles,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// The request that renders `tile` including its halo rows.
    pub fn tile_request(&self, request: &ViewRequest, tile: &Tile) -> ViewRequest {
        let rendered = tile.rendered_rows();
        ViewRequest {
            bounds: request.bounds.row_band(
                tile.rendered_first_row(),
                rendered,
                request.resolution_y,
            ),
            resolution_y: rendered,
            ..*request
        }
    }
}

/// Smallest row count whose pixel count divides into `work_group_size` groups.
fn row_step(width: u32, work_group_size: u32) -> u32 {
    let group = work_group_size.max(1);
    let (mut a, mut b) = (width.max(1), group);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    group / a
}

/// `request` at `multiplier` times its resolution on each axis, for export.
pub fn export_request(
    request: &ViewRequest,
    multiplier: u32,
) -> Result<ViewRequest, ComputeError> {
    let multiplier = multiplier.max(1);
    request.scaled(multiplier).ok_or_else(|| {
        let widest = request.resolution_x.max(request.resolution_y).max(1);
        let largest = u64::from(u32::MAX / widest);
        let m = u64::from(multiplier);
        ComputeError::TooLarge {
            requested: request.buffer_bytes().saturating_mul(m * m),
            limit: request.buffer_bytes().saturating_mul(largest * largest),
        }
    })
}

/// Whether `request` must be tiled under `max_allocation`.
pub fn needs_tiling(request: &ViewRequest, max_allocation: u64) -> bool {
    request.buffer_bytes() > max_allocation
}

/// Render `request` tile by tile and stitch the result.
///
/// Requests that fit are rendered in one piece.
pub fn render_tiled<R>(renderer: &mut R, request: &ViewRequest) -> Result<Frame, ComputeError>
where
    R: TileRenderer + ?Sized,
{
    request.validate()?;
    let max_allocation = renderer.max_allocation_bytes();
    if !needs_tiling(request, max_allocation) {
        return renderer.render_tile(request);
    }

    let plan = TilePlan::with_work_group(request, max_allocation, renderer.work_group_size())?;
    log::info!(
        "Tiling {}x{} into {} tiles of {} rows",
        request.resolution_x,
        request.resolution_y,
        plan.tile_count(),
        plan.rendered_rows
    );

    let mut pixels = PixelBuffer::new(request.resolution_x, request.resolution_y);
    let mut precision_warning = false;
    let mut compute_time_ms = 0.0;

    for (i, tile) in plan.tiles.iter().enumerate() {
        let tile_request = plan.tile_request(request, tile);
        let frame = renderer.render_tile(&tile_request)?;
        pixels
            .copy_rows_from(&frame.pixels, tile.halo_top, tile.first_row, tile.rows)
            .map_err(ComputeError::Tiling)?;
        precision_warning |= frame.precision_warning;
        compute_time_ms += frame.compute_time_ms;
        log::debug!(
            "Tile {}/{}: rows {}..{} in {:.1}ms",
            i + 1,
            plan.tile_count(),
            tile.first_row,
            tile.first_row + tile.rows,
            frame.compute_time_ms
        );
    }

    Ok(Frame {
        pixels,
        precision_warning,
        compute_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalzoom_core::{RenderParameters, ViewBounds, BYTES_PER_PIXEL};

    fn request(width: u32, height: u32) -> ViewRequest {
        let params = RenderParameters {
            resolution_x: width,
            resolution_y: height,
            max_iterations: 50,
            colour_period: 128.0,
            blur_enabled: true,
        };
        ViewRequest::new(ViewBounds::initial(width, height), &params)
    }

    fn assert_covers(plan: &TilePlan, height: u32) {
        let mut next = 0;
        for t in &plan.tiles {
            assert_eq!(t.first_row, next);
            assert!(t.rows > 0);
            next += t.rows;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn plan_covers_every_row_once() {
        let req = request(100, 103);
        let row = 100 * BYTES_PER_PIXEL;
        // 12 rendered rows: 11 on the top tile, 10 in the middle
        let plan = TilePlan::new(&req, 2 * 12 * row).unwrap();
        assert_eq!(plan.rendered_rows, 12);
        assert_eq!(plan.tile_count(), 11);
        assert_eq!(plan.tiles[0].rows, 11);
        assert_eq!(plan.tiles[1].rows, 10);
        assert_eq!(plan.tiles.last().unwrap().rows, 2);
        assert!(plan.tiles.iter().all(|t| t.rendered_rows() <= 12));
        assert_covers(&plan, 103);
    }

    #[test]
    fn halo_is_clamped_at_image_edges() {
        let req = request(10, 40);
        let plan = TilePlan::new(&req, 2 * 12 * 10 * BYTES_PER_PIXEL).unwrap();
        assert_eq!(plan.tile_count(), 4);
        let first = plan.tiles[0];
        let last = plan.tiles[3];
        assert_eq!((first.halo_top, first.halo_bottom), (0, 1));
        assert_eq!((last.halo_top, last.halo_bottom), (1, 0));
        assert_eq!(last.rows, 9);
        assert_eq!(plan.tiles[1].rendered_rows(), 12);
    }

    #[test]
    fn tile_request_covers_its_band() {
        let req = request(10, 40);
        let plan = TilePlan::new(&req, 2 * 12 * 10 * BYTES_PER_PIXEL).unwrap();
        let tile = plan.tiles[1];
        assert_eq!(tile.first_row, 11);
        let sub = plan.tile_request(&req, &tile);
        assert_eq!(sub.resolution_x, 10);
        assert_eq!(sub.resolution_y, 12);
        let expected = req.bounds.row_band(10, 12, 40);
        assert_eq!(sub.bounds, expected);
    }

    #[test]
    fn tiles_stay_aligned_to_work_groups() {
        // 2732 = 4 * 683, so groups of 64 need rows in multiples of 16
        let req = request(2732, 1536);
        assert_eq!(row_step(2732, 64), 16);
        let plan = TilePlan::with_work_group(&req, req.buffer_bytes(), 64).unwrap();
        assert!(plan.tile_count() > 1);
        for t in &plan.tiles {
            let pixels = 2732 * u64::from(t.rendered_rows());
            assert_eq!(pixels % 64, 0, "{t:?}");
            assert!(u64::from(t.rendered_rows()) * req.row_bytes() <= req.buffer_bytes() / 2);
        }
        assert_covers(&plan, 1536);
    }

    #[test]
    fn bottom_tile_pads_upward_to_stay_aligned() {
        // 25 px rows in groups of 4: rows come in fours, 8 per tile
        let req = request(25, 48);
        let plan = TilePlan::with_work_group(&req, 2 * 9 * 25 * BYTES_PER_PIXEL, 4).unwrap();
        assert_eq!(plan.rendered_rows, 8);
        let last = *plan.tiles.last().unwrap();
        assert_eq!((last.first_row, last.rows), (43, 5));
        // One halo row plus two rows already produced by the tile above
        assert_eq!((last.halo_top, last.halo_bottom), (3, 0));
        assert_eq!(last.rendered_rows(), 8);
        assert!(plan.tiles.iter().all(|t| t.rendered_rows() % 4 == 0));
        assert_covers(&plan, 48);
    }

    #[test]
    fn tiny_limit_is_rejected() {
        let req = request(100, 100);
        let err = TilePlan::new(&req, 2 * 2 * 100 * BYTES_PER_PIXEL).unwrap_err();
        assert!(matches!(err, ComputeError::Tiling(_)));
        // Four rows fit, but groups of 256 need rows of 64 at a time
        let err = TilePlan::with_work_group(&req, 2 * 4 * 100 * BYTES_PER_PIXEL, 256).unwrap_err();
        assert!(matches!(err, ComputeError::Tiling(_)));
    }

    #[test]
    fn export_request_rejects_overflowing_multiplier() {
        let req = request(1920, 1080);
        let big = export_request(&req, 4).unwrap();
        assert_eq!((big.resolution_x, big.resolution_y), (7680, 4320));
        assert_eq!(export_request(&req, 0).unwrap(), req);

        let err = export_request(&req, 3_000_000).unwrap_err();
        assert!(matches!(err, ComputeError::TooLarge { requested, limit } if requested >= limit));
        assert!(!err.is_fatal());
    }

    #[test]
    fn small_request_needs_no_tiling() {
        let req = request(16, 16);
        assert!(!needs_tiling(&req, req.buffer_bytes()));
        assert!(needs_tiling(&req, req.buffer_bytes() - 1));
    }
}
