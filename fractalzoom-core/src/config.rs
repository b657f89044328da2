//! Engine configuration.
//!
//! `EngineConfig::default()` is the canonical source of every tunable the
//! backends and controllers read. Partial JSON documents fill the remaining
//! fields from the defaults.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which compute backend renders frames. Chosen once at start-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Scalar,
    Simd,
    ArbitraryPrecision,
    #[default]
    Accelerator,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Scalar,
        BackendKind::Simd,
        BackendKind::ArbitraryPrecision,
        BackendKind::Accelerator,
    ];

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Scalar => "scalar",
            BackendKind::Simd => "simd",
            BackendKind::ArbitraryPrecision => "arbitrary_precision",
            BackendKind::Accelerator => "accelerator",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zoom and pan tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Frames per zoom gesture at start-up. Adapted at runtime.
    pub zoom_steps: u32,
    /// Upper bound for the adapted frame count.
    pub max_zoom_steps: u32,
    /// Per-gesture shrink (zoom in) or grow (zoom out) of the half-extents.
    pub zoom_factor: f64,
    /// Per-gesture multiplier (in) or divisor (out) of the iteration budget.
    pub iters_factor: f64,
    /// Floor for the iteration budget after zooming out or adjusting.
    pub min_iterations: u32,
    /// Gestures slower than this shed frames.
    pub slow_threshold_ms: u64,
    /// Gestures faster than this gain frames.
    pub fast_threshold_ms: u64,
    /// Cursor travel, in pixels, before a drag starts panning.
    pub pan_dead_zone_px: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            zoom_steps: 20,
            max_zoom_steps: 60,
            zoom_factor: 2.0,
            iters_factor: 1.2,
            min_iterations: 50,
            slow_threshold_ms: 1500,
            fast_threshold_ms: 750,
            pan_dead_zone_px: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub initial_max_iterations: u32,
    /// Length of one colour cycle in smooth iterations. Applied by every
    /// backend.
    pub colour_period: f64,
    pub blur_enabled: bool,
    pub backend: BackendKind,
    /// Mantissa bits for the arbitrary-precision backend.
    pub arbitrary_precision_bits: usize,
    /// Accelerator work-group size. The pixel count must be a multiple.
    pub local_work_size: u32,
    pub zoom: ZoomConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution_x: 1920,
            resolution_y: 1080,
            initial_max_iterations: 50,
            colour_period: crate::DEFAULT_COLOUR_PERIOD,
            blur_enabled: true,
            backend: BackendKind::default(),
            arbitrary_precision_bits: 256,
            local_work_size: 64,
            zoom: ZoomConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!(
            "Loaded config: {}x{}, backend {}, {} iterations",
            config.resolution_x,
            config.resolution_y,
            config.backend,
            config.initial_max_iterations
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values no backend can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| Err(ConfigError::Invalid { field, reason });

        if self.resolution_x == 0 || self.resolution_y == 0 {
            return invalid(
                "resolution",
                format!("{}x{} has no pixels", self.resolution_x, self.resolution_y),
            );
        }
        if self.initial_max_iterations == 0 {
            return invalid("initial_max_iterations", "must be at least 1".into());
        }
        if !(self.colour_period.is_finite() && self.colour_period > 0.0) {
            return invalid("colour_period", format!("{} is not positive", self.colour_period));
        }
        if self.local_work_size == 0 {
            return invalid("local_work_size", "must be at least 1".into());
        }
        if self.arbitrary_precision_bits == 0 {
            return invalid("arbitrary_precision_bits", "must be at least 1".into());
        }

        let zoom = &self.zoom;
        if zoom.zoom_steps == 0 || zoom.zoom_steps > zoom.max_zoom_steps {
            return invalid(
                "zoom.zoom_steps",
                format!("{} not in 1..={}", zoom.zoom_steps, zoom.max_zoom_steps),
            );
        }
        if !(zoom.zoom_factor > 1.0) {
            return invalid("zoom.zoom_factor", format!("{} must exceed 1", zoom.zoom_factor));
        }
        if !(zoom.iters_factor >= 1.0) {
            return invalid("zoom.iters_factor", format!("{} is below 1", zoom.iters_factor));
        }
        if zoom.fast_threshold_ms >= zoom.slow_threshold_ms {
            return invalid(
                "zoom.fast_threshold_ms",
                format!(
                    "{} must be below slow_threshold_ms {}",
                    zoom.fast_threshold_ms, zoom.slow_threshold_ms
                ),
            );
        }
        if !(zoom.pan_dead_zone_px >= 0.0) {
            return invalid("zoom.pan_dead_zone_px", "must not be negative".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = EngineConfig::default();
        assert_eq!((c.resolution_x, c.resolution_y), (1920, 1080));
        assert_eq!(c.initial_max_iterations, 50);
        assert_eq!(c.colour_period, 128.0);
        assert!(c.blur_enabled);
        assert_eq!(c.local_work_size, 64);
        assert_eq!(c.zoom.zoom_steps, 20);
        assert_eq!(c.zoom.zoom_factor, 2.0);
        assert_eq!(c.zoom.iters_factor, 1.2);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = EngineConfig::from_json(r#"{"backend": "simd", "zoom": {"zoom_steps": 8}}"#).unwrap();
        assert_eq!(c.backend, BackendKind::Simd);
        assert_eq!(c.zoom.zoom_steps, 8);
        assert_eq!(c.zoom.max_zoom_steps, 60);
        assert_eq!(c.resolution_x, 1920);
    }

    #[test]
    fn json_round_trip() {
        let c = EngineConfig {
            backend: BackendKind::ArbitraryPrecision,
            colour_period: 64.0,
            ..EngineConfig::default()
        };
        let back = EngineConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn rejects_zero_resolution() {
        let err = EngineConfig::from_json(r#"{"resolution_x": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "resolution", .. }));
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = EngineConfig::from_json(r#"{"backend": "quantum"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = EngineConfig::from_json(
            r#"{"zoom": {"slow_threshold_ms": 500, "fast_threshold_ms": 750}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "zoom.fast_threshold_ms", .. }));
    }

    #[test]
    fn backend_names_match_serde() {
        for kind in BackendKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
