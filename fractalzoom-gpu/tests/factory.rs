//! Backend creation through the public factory.

use fractalzoom_core::{BackendKind, EngineConfig, RenderParameters, ViewBounds, ViewRequest};
use fractalzoom_gpu::{create_backend, create_backend_with, enumerate_devices, DeviceSelection};

fn small_request() -> ViewRequest {
    let params = RenderParameters {
        resolution_x: 64,
        resolution_y: 16,
        max_iterations: 50,
        colour_period: 128.0,
        blur_enabled: true,
    };
    ViewRequest::new(ViewBounds::initial(64, 16), &params)
}

#[test]
fn cpu_kinds_are_always_available() {
    let config = EngineConfig::default();
    for kind in [
        BackendKind::Scalar,
        BackendKind::Simd,
        BackendKind::ArbitraryPrecision,
    ] {
        let mut backend = create_backend(kind, &config).unwrap();
        assert_eq!(backend.kind(), kind);
        let frame = backend.render(&small_request()).unwrap();
        assert_eq!(frame.pixels.as_slice().len(), 64 * 16 * 3);
    }
}

#[test]
fn enumerated_devices_are_indexed_in_order() {
    let devices = enumerate_devices();
    for (i, device) in devices.iter().enumerate() {
        println!("{device}");
        assert_eq!(device.index, i);
    }
}

#[test]
fn accelerator_is_created_or_reports_error() {
    let config = EngineConfig::default();
    match create_backend(BackendKind::Accelerator, &config) {
        Ok(mut backend) => {
            assert_eq!(backend.kind(), BackendKind::Accelerator);
            let frame = backend.render(&small_request()).unwrap();
            assert!(frame.pixels.as_slice().iter().all(|c| (0.0..=1.0).contains(c)));
        }
        Err(e) => {
            println!("Skipping test: {e}");
            assert!(e.is_fatal());
        }
    }
}

#[test]
fn cancelled_manual_selection_fails() {
    let config = EngineConfig::default();
    let cancel = DeviceSelection::Manual(Box::new(|_| None));
    let result = create_backend_with(BackendKind::Accelerator, &config, &cancel);
    assert!(result.is_err());
}
