use crate::config::EngineConfig;
use crate::{BoundsError, ViewBounds};
use serde::{Deserialize, Serialize};

/// Bytes per pixel in a colour buffer: three f32 channels.
pub const BYTES_PER_PIXEL: u64 = 3 * std::mem::size_of::<f32>() as u64;

/// Image-side rendering parameters. Lives for the whole session and is
/// mutated in place by zoom, pan, reset and iteration adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderParameters {
    pub resolution_x: u32,
    pub resolution_y: u32,
    /// Iteration budget before a point counts as inside the set.
    pub max_iterations: u32,
    /// Length of one colour cycle, in smooth iterations.
    pub colour_period: f64,
    pub blur_enabled: bool,
}

impl RenderParameters {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            resolution_x: config.resolution_x,
            resolution_y: config.resolution_y,
            max_iterations: config.initial_max_iterations,
            colour_period: config.colour_period,
            blur_enabled: config.blur_enabled,
        }
    }

    /// Checks the image-side fields a backend divides by or allocates from.
    pub fn validate(&self) -> Result<(), BoundsError> {
        check_image(self.resolution_x, self.resolution_y, self.colour_period)
    }
}

fn check_image(width: u32, height: u32, colour_period: f64) -> Result<(), BoundsError> {
    if width == 0 || height == 0 {
        return Err(BoundsError::ZeroResolution { width, height });
    }
    if !(colour_period.is_finite() && colour_period > 0.0) {
        return Err(BoundsError::InvalidColourPeriod(colour_period));
    }
    Ok(())
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// One frame's worth of work for a compute backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    pub bounds: ViewBounds,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub max_iterations: u32,
    pub colour_period: f64,
    pub blur_enabled: bool,
}

impl ViewRequest {
    pub fn new(bounds: ViewBounds, params: &RenderParameters) -> Self {
        Self {
            bounds,
            resolution_x: params.resolution_x,
            resolution_y: params.resolution_y,
            max_iterations: params.max_iterations,
            colour_period: params.colour_period,
            blur_enabled: params.blur_enabled,
        }
    }

    /// Pixel count, widened so 4K-times-multiplier exports cannot overflow.
    pub fn pixel_count(&self) -> u64 {
        self.resolution_x as u64 * self.resolution_y as u64
    }

    /// Size of one RGB f32 buffer for this request.
    pub fn buffer_bytes(&self) -> u64 {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Bytes in one row of the RGB buffer.
    pub fn row_bytes(&self) -> u64 {
        self.resolution_x as u64 * BYTES_PER_PIXEL
    }

    /// Same view at `multiplier` times the resolution on each axis, or
    /// `None` when either axis would overflow `u32`.
    pub fn scaled(&self, multiplier: u32) -> Option<Self> {
        Some(Self {
            resolution_x: self.resolution_x.checked_mul(multiplier)?,
            resolution_y: self.resolution_y.checked_mul(multiplier)?,
            ..*self
        })
    }

    pub fn validate(&self) -> Result<(), BoundsError> {
        check_image(self.resolution_x, self.resolution_y, self.colour_period)?;
        self.bounds.validate()
    }
}

/// The mutable view the controllers act on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub bounds: ViewBounds,
    pub params: RenderParameters,
}

impl ViewState {
    pub fn from_config(config: &EngineConfig) -> Self {
        let params = RenderParameters::from_config(config);
        Self {
            bounds: ViewBounds::initial(params.resolution_x, params.resolution_y),
            params,
        }
    }

    /// Back to the whole-set view and the starting iteration budget.
    pub fn reset(&mut self, config: &EngineConfig) {
        self.bounds = ViewBounds::initial(self.params.resolution_x, self.params.resolution_y);
        self.params.max_iterations = config.initial_max_iterations;
    }

    pub fn request(&self) -> ViewRequest {
        ViewRequest::new(self.bounds, &self.params)
    }
}
