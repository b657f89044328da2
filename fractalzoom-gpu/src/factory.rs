//! Backend construction for every [`BackendKind`].

use crate::device::{DeviceContext, DeviceSelection};
use crate::renderer::AcceleratorBackend;
use fractalzoom_compute::{create_cpu_backend, ComputeBackend, ComputeError};
use fractalzoom_core::{BackendKind, EngineConfig};

/// Create the backend `kind`, picking a device automatically if it needs one.
pub fn create_backend(
    kind: BackendKind,
    config: &EngineConfig,
) -> Result<Box<dyn ComputeBackend>, ComputeError> {
    create_backend_with(kind, config, &DeviceSelection::Auto)
}

/// Create the backend `kind`, using `selection` for the accelerator.
pub fn create_backend_with(
    kind: BackendKind,
    config: &EngineConfig,
    selection: &DeviceSelection,
) -> Result<Box<dyn ComputeBackend>, ComputeError> {
    match kind {
        BackendKind::Accelerator => {
            let context = DeviceContext::init_blocking(selection)?;
            let backend = AcceleratorBackend::new(context, config.local_work_size)?;
            log::info!("Using {} backend", backend.describe());
            Ok(Box::new(backend))
        }
        _ => create_cpu_backend(kind, config),
    }
}
