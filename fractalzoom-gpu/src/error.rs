//! GPU error types.

use fractalzoom_compute::ComputeError;
use std::panic::Location;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuErrorKind {
    #[error("no GPU adapter found")]
    NoAdapter,

    #[error("no adapter supports 64-bit floats in compute shaders")]
    NoDoublePrecisionDevice,

    #[error("device {index} requested but only {count} found")]
    DeviceIndex { index: usize, count: usize },

    #[error("device selection cancelled")]
    SelectionCancelled,

    #[error("failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("readback channel closed")]
    ChannelClosed,

    #[error("{0}")]
    Validation(String),

    #[error("global work size {global} is not a multiple of local work size {local}")]
    WorkSizeMismatch { global: u64, local: u32 },

    #[error("{requested}-byte buffer exceeds the {limit}-byte device limit")]
    AllocationTooLarge { requested: u64, limit: u64 },

    #[error("selected device cannot write the shared surface")]
    InteropUnsupported,

    #[error("surface is {surface:?} but the frame is {frame:?}")]
    SurfaceSizeMismatch {
        surface: (u32, u32),
        frame: (u32, u32),
    },
}

impl GpuErrorKind {
    /// Stable upper-case name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            GpuErrorKind::NoAdapter => "NO_ADAPTER",
            GpuErrorKind::NoDoublePrecisionDevice => "NO_DOUBLE_PRECISION_DEVICE",
            GpuErrorKind::DeviceIndex { .. } => "INVALID_DEVICE_INDEX",
            GpuErrorKind::SelectionCancelled => "SELECTION_CANCELLED",
            GpuErrorKind::DeviceCreation(_) => "DEVICE_CREATION_FAILED",
            GpuErrorKind::BufferMap(_) => "BUFFER_MAP_FAILED",
            GpuErrorKind::ChannelClosed => "CHANNEL_CLOSED",
            GpuErrorKind::Validation(_) => "VALIDATION_ERROR",
            GpuErrorKind::WorkSizeMismatch { .. } => "INVALID_WORK_GROUP_SIZE",
            GpuErrorKind::AllocationTooLarge { .. } => "INVALID_BUFFER_SIZE",
            GpuErrorKind::InteropUnsupported => "INTEROP_UNSUPPORTED",
            GpuErrorKind::SurfaceSizeMismatch { .. } => "SURFACE_SIZE_MISMATCH",
        }
    }
}

/// A device error together with the call site that raised it.
#[derive(Debug, Error)]
#[error("{}: {} (at {})", .kind.name(), .kind, .location)]
pub struct GpuError {
    #[source]
    kind: GpuErrorKind,
    location: &'static Location<'static>,
}

impl GpuError {
    #[track_caller]
    pub fn new(kind: GpuErrorKind) -> Self {
        Self {
            kind,
            location: Location::caller(),
        }
    }

    pub fn kind(&self) -> &GpuErrorKind {
        &self.kind
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Whether the device context is unusable after this error.
    ///
    /// Size and surface errors only reject the request that caused them.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.kind,
            GpuErrorKind::WorkSizeMismatch { .. }
                | GpuErrorKind::AllocationTooLarge { .. }
                | GpuErrorKind::InteropUnsupported
                | GpuErrorKind::SurfaceSizeMismatch { .. }
        )
    }
}

impl From<GpuErrorKind> for GpuError {
    #[track_caller]
    fn from(kind: GpuErrorKind) -> Self {
        GpuError::new(kind)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    #[track_caller]
    fn from(err: wgpu::RequestDeviceError) -> Self {
        GpuError::new(GpuErrorKind::DeviceCreation(err))
    }
}

impl From<wgpu::BufferAsyncError> for GpuError {
    #[track_caller]
    fn from(err: wgpu::BufferAsyncError) -> Self {
        GpuError::new(GpuErrorKind::BufferMap(err))
    }
}

impl From<GpuError> for ComputeError {
    fn from(err: GpuError) -> Self {
        if err.is_fatal() {
            log::error!("{err}");
        } else {
            log::warn!("{err}");
        }
        let fatal = err.is_fatal();
        ComputeError::Accelerator {
            source: Box::new(err),
            fatal,
        }
    }
}
