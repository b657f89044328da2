//! Frame-rate measurement over fixed views.

use crate::{ComputeBackend, ComputeError};
use fractalzoom_core::{RenderParameters, ViewBounds, ViewRequest};
use serde::Serialize;
use std::time::{Duration, Instant};

pub const MIN_FRAMES: u32 = 5;
pub const MIN_DURATION: Duration = Duration::from_secs(1);

/// A named view with the iteration budget it is benchmarked at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchmarkView {
    pub name: &'static str,
    pub bounds: ViewBounds,
    pub max_iterations: u32,
}

impl BenchmarkView {
    pub fn request(&self, params: &RenderParameters) -> ViewRequest {
        let mut params = *params;
        params.max_iterations = self.max_iterations;
        ViewRequest::new(self.bounds, &params)
    }
}

pub const BENCHMARK_VIEWS: [BenchmarkView; 3] = [
    BenchmarkView {
        name: "whole fractal",
        bounds: ViewBounds {
            x_min: -2.5,
            x_max: 1.5,
            y_min: -1.125,
            y_max: 1.125,
        },
        max_iterations: 50,
    },
    BenchmarkView {
        name: "half cardioid",
        bounds: ViewBounds {
            x_min: -1.5,
            x_max: 0.25,
            y_min: -0.6,
            y_max: 0.6,
        },
        max_iterations: 50,
    },
    BenchmarkView {
        name: "highly zoomed",
        bounds: ViewBounds {
            x_min: -0.673_096_144_499_140_79,
            x_max: -0.673_035_109_342_890_79,
            y_min: -0.313_348_354_666_959_43,
            y_max: -0.313_314_022_391_568_80,
        },
        max_iterations: 2000,
    },
];

/// Deep enough that f64 pixel spacing collapses: the plain backends render
/// visible blocks here.
pub const PRECISION_TEST_VIEW: BenchmarkView = BenchmarkView {
    name: "precision test",
    bounds: ViewBounds {
        x_min: -1.253_343_253_354_873_62,
        x_max: -1.253_343_253_354_816_78,
        y_min: -0.344_462_323_961_193_53,
        y_max: -0.344_462_323_961_161_55,
    },
    max_iterations: 1_389_952,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub frames: u32,
    pub elapsed: Duration,
    pub fps: f64,
}

/// Render `request` repeatedly until at least `min_frames` frames and
/// `min_duration` have both passed.
pub fn run_benchmark(
    backend: &mut dyn ComputeBackend,
    request: &ViewRequest,
    min_frames: u32,
    min_duration: Duration,
) -> Result<BenchmarkResult, ComputeError> {
    let start = Instant::now();
    let mut frames = 0;
    while frames < min_frames || start.elapsed() < min_duration {
        backend.render(request)?;
        frames += 1;
    }
    let elapsed = start.elapsed();
    let fps = frames as f64 / elapsed.as_secs_f64();

    log::info!(
        "{}: {} frames in {:.2}s, {:.2} fps",
        backend.describe(),
        frames,
        elapsed.as_secs_f64(),
        fps
    );
    Ok(BenchmarkResult {
        frames,
        elapsed,
        fps,
    })
}

/// Run every view in [`BENCHMARK_VIEWS`] with the default frame and time
/// minimums.
pub fn run_standard_benchmarks(
    backend: &mut dyn ComputeBackend,
    params: &RenderParameters,
) -> Result<Vec<(&'static str, BenchmarkResult)>, ComputeError> {
    BENCHMARK_VIEWS
        .iter()
        .map(|view| {
            log::info!("Benchmark: {}", view.name);
            let result = run_benchmark(backend, &view.request(params), MIN_FRAMES, MIN_DURATION)?;
            Ok((view.name, result))
        })
        .collect()
}
