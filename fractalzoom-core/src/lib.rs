pub mod bigfloat;
pub mod bounds;
pub mod colorize;
pub mod config;
pub mod error;
pub mod escape;
pub mod pixel_buffer;
pub mod precision;
pub mod request;

pub use bigfloat::BigFloat;
pub use bounds::{lerp, BigViewBounds, ViewBounds};
pub use colorize::{colorize, cycle_position, gradient, smooth_iteration, DEFAULT_COLOUR_PERIOD};
pub use config::{BackendKind, EngineConfig, ZoomConfig};
pub use error::{BoundsError, ConfigError};
pub use escape::{escape_time, in_main_cardioid_or_bulb, iterate, EscapeResult, ESCAPE_RADIUS_SQ};
pub use pixel_buffer::{PixelBuffer, CHANNELS};
pub use precision::{precision_loss, suggested_precision_bits, MIN_PRECISION_BITS};
pub use request::{RenderParameters, ViewRequest, ViewState, BYTES_PER_PIXEL};
