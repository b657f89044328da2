//! Escape-time rendering on the GPU with wgpu.
//!
//! Needs a device with `SHADER_F64`. Frames either come back to the host as
//! a [`PixelBuffer`](fractalzoom_core::PixelBuffer) or are written straight
//! into a [`SharedSurface`] that the display layer reads.

mod buffers;
mod device;
mod error;
mod factory;
mod interop;
mod pipeline;
mod renderer;

pub use buffers::{DeviceBuffers, Uniforms};
pub use device::{
    enumerate_devices, select_device, DeviceAvailability, DeviceChooser, DeviceContext,
    DeviceInfo, DeviceSelection, SURFACE_FORMAT,
};
pub use error::{GpuError, GpuErrorKind};
pub use factory::{create_backend, create_backend_with};
pub use interop::{ComputeGuard, DisplayGuard, SharedSurface, SurfaceLock, SurfaceOwner};
pub use pipeline::{workgroup_grid, Pipelines, LOCAL_WORK_SIZE, MAX_GROUPS_PER_DIMENSION};
pub use renderer::{AcceleratorBackend, SurfaceFrame};
