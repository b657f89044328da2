//! Validation errors for view geometry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("bounds must be finite: x=[{x_min}, {x_max}], y=[{y_min}, {y_max}]")]
    NotFinite {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    #[error("empty {axis} range: min {min} is not below max {max}")]
    EmptyRange { axis: char, min: f64, max: f64 },

    #[error("resolution must be positive, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },

    #[error("colour period must be positive and finite, got {0}")]
    InvalidColourPeriod(f64),

    #[error("invalid coordinate string: {0}")]
    Parse(String),
}

/// Failure loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
