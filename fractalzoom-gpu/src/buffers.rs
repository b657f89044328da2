//! Uniform layout and the device buffers for one frame size.

use crate::error::{GpuError, GpuErrorKind};
use bytemuck::{Pod, Zeroable};
use fractalzoom_core::{ViewRequest, BYTES_PER_PIXEL};

/// Per-frame parameters. Layout matches `Params` in both shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,

    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub colour_period: f32,

    pub blur_enabled: u32,
    pub pixel_count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl Uniforms {
    pub fn new(request: &ViewRequest) -> Self {
        Self {
            x_min: request.bounds.x_min,
            x_max: request.bounds.x_max,
            y_min: request.bounds.y_min,
            y_max: request.bounds.y_max,
            width: request.resolution_x,
            height: request.resolution_y,
            max_iterations: request.max_iterations,
            colour_period: request.colour_period as f32,
            blur_enabled: request.blur_enabled as u32,
            pixel_count: u32::try_from(request.pixel_count()).unwrap_or(u32::MAX),
            _pad0: 0,
            _pad1: 0,
        }
    }
}

/// Buffers sized for one resolution. Destroyed when dropped.
pub struct DeviceBuffers {
    pub uniforms: wgpu::Buffer,
    /// Colours straight from the escape kernel.
    pub raw: wgpu::Buffer,
    /// Blurred colours on the host-copy path.
    pub output: wgpu::Buffer,
    pub staging: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl DeviceBuffers {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        max_allocation: u64,
    ) -> Result<Self, GpuError> {
        let bytes = u64::from(width) * u64::from(height) * BYTES_PER_PIXEL;
        if bytes > max_allocation {
            return Err(GpuErrorKind::AllocationTooLarge {
                requested: bytes,
                limit: max_allocation,
            }
            .into());
        }
        log::debug!("Allocating 3 x {} bytes for {}x{}", bytes, width, height);

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractalzoom_uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let raw = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractalzoom_raw"),
            size: bytes,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractalzoom_output"),
            size: bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractalzoom_staging"),
            size: bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            uniforms,
            raw,
            output,
            staging,
            width,
            height,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of one colour buffer in bytes.
    pub fn byte_len(&self) -> u64 {
        self.raw.size()
    }
}

impl Drop for DeviceBuffers {
    fn drop(&mut self) {
        self.uniforms.destroy();
        self.raw.destroy();
        self.output.destroy();
        self.staging.destroy();
    }
}
