pub mod arbitrary;
pub mod backend;
pub mod benchmark;
pub mod blur;
pub mod error;
pub mod scalar;
pub mod simd;
pub mod tiling;
pub mod zoom;

pub use arbitrary::ArbitraryPrecisionBackend;
pub use backend::{ComputeBackend, Frame};
pub use benchmark::{
    run_benchmark, run_standard_benchmarks, BenchmarkResult, BenchmarkView, BENCHMARK_VIEWS,
    PRECISION_TEST_VIEW,
};
pub use blur::{blur_in_place, BLUR_WEIGHTS};
pub use error::ComputeError;
pub use scalar::ScalarBackend;
pub use simd::SimdBackend;
pub use tiling::{export_request, needs_tiling, render_tiled, Tile, TilePlan, TileRenderer};
pub use zoom::{ease, PanTracker, ZoomController, ZoomDirection, ZoomPhase, ZoomSession};

// Re-export core types for convenience
pub use fractalzoom_core::*;

/// Create one of the CPU backends.
///
/// The accelerator needs a device and is created by the GPU crate's factory.
pub fn create_cpu_backend(
    kind: BackendKind,
    config: &EngineConfig,
) -> Result<Box<dyn ComputeBackend>, ComputeError> {
    let backend: Box<dyn ComputeBackend> = match kind {
        BackendKind::Scalar => Box::new(ScalarBackend::new()),
        BackendKind::Simd => Box::new(SimdBackend::new()),
        BackendKind::ArbitraryPrecision => Box::new(ArbitraryPrecisionBackend::new(
            config.arbitrary_precision_bits,
        )),
        BackendKind::Accelerator => return Err(ComputeError::Unavailable(kind)),
    };
    log::info!("Using {} backend", backend.describe());
    Ok(backend)
}
