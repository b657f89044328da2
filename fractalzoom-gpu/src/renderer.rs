//! Accelerator backend: escape and blur kernels on a wgpu device.

use crate::buffers::{DeviceBuffers, Uniforms};
use crate::device::DeviceContext;
use crate::error::{GpuError, GpuErrorKind};
use crate::interop::SharedSurface;
use crate::pipeline::{workgroup_grid, Pipelines};
use fractalzoom_compute::{
    export_request, needs_tiling, render_tiled, ComputeBackend, ComputeError, Frame, TileRenderer,
};
use fractalzoom_core::{precision_loss, BackendKind, PixelBuffer, ViewRequest};
use std::sync::Arc;
use std::time::Instant;

/// Result of a frame written straight into the shared surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceFrame {
    /// Surface generation once this frame was released to the display.
    pub generation: u64,
    pub precision_warning: bool,
    pub compute_time_ms: f64,
}

pub struct AcceleratorBackend {
    context: DeviceContext,
    pipelines: Pipelines,
    buffers: Option<DeviceBuffers>,
    surface: Option<Arc<SharedSurface>>,
}

impl AcceleratorBackend {
    pub fn new(context: DeviceContext, workgroup_size: u32) -> Result<Self, GpuError> {
        let pipelines = Pipelines::new(&context.device, workgroup_size, context.interop)?;
        Ok(Self {
            context,
            pipelines,
            buffers: None,
            surface: None,
        })
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn workgroup_size(&self) -> u32 {
        self.pipelines.workgroup_size
    }

    /// Dimensions of the currently allocated frame buffers.
    pub fn buffer_dimensions(&self) -> Option<(u32, u32)> {
        self.buffers.as_ref().map(DeviceBuffers::dimensions)
    }

    /// Create the surface shared with the display and keep a handle to it.
    pub fn create_surface(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Arc<SharedSurface>, GpuError> {
        if self.pipelines.blur_surface.is_none() {
            return Err(GpuErrorKind::InteropUnsupported.into());
        }
        let surface = Arc::new(SharedSurface::new(&self.context.device, width, height));
        self.surface = Some(Arc::clone(&surface));
        log::info!("Shared surface {}x{} created", width, height);
        Ok(surface)
    }

    pub fn surface(&self) -> Option<&Arc<SharedSurface>> {
        self.surface.as_ref()
    }

    /// Render a frame and copy it back to the host.
    pub async fn render_frame(&mut self, request: &ViewRequest) -> Result<Frame, GpuError> {
        let start = Instant::now();
        let groups = workgroup_grid(request.pixel_count(), self.pipelines.workgroup_size)?;
        let precision_warning = check_precision(request);

        let device = &self.context.device;
        let buffers = ensure_buffers(
            &mut self.buffers,
            device,
            request.resolution_x,
            request.resolution_y,
            self.context.info.max_allocation,
        )?;
        self.context.queue.write_buffer(
            &buffers.uniforms,
            0,
            bytemuck::bytes_of(&Uniforms::new(request)),
        );

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let blur_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_bind_group"),
            layout: &self.pipelines.blur_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.raw.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.output.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        encode_escape(&mut encoder, device, &self.pipelines, buffers, groups);
        encode_pass(
            &mut encoder,
            "blur_pass",
            &self.pipelines.blur,
            &blur_bind_group,
            groups,
        );
        encoder.copy_buffer_to_buffer(&buffers.output, 0, &buffers.staging, 0, buffers.byte_len());
        self.context.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuErrorKind::Validation(err.to_string()).into());
        }

        let data = read_buffer_f32(device, &buffers.staging).await?;
        let pixels = PixelBuffer::from_vec(request.resolution_x, request.resolution_y, data)
            .map_err(GpuErrorKind::Validation)?;

        let compute_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "GPU rendered {}x{} in {:.1}ms",
            request.resolution_x,
            request.resolution_y,
            compute_time_ms
        );
        Ok(Frame {
            pixels,
            precision_warning,
            compute_time_ms,
        })
    }

    /// Render a frame straight into the shared surface.
    ///
    /// Blocks until the display has released the surface and again until the
    /// device has finished writing it.
    pub fn render_to_surface(&mut self, request: &ViewRequest) -> Result<SurfaceFrame, ComputeError> {
        request.validate()?;
        let Some(surface) = self.surface.clone() else {
            return Err(GpuError::new(GpuErrorKind::InteropUnsupported).into());
        };
        let frame = (request.resolution_x, request.resolution_y);
        if surface.dimensions() != frame {
            return Err(GpuError::new(GpuErrorKind::SurfaceSizeMismatch {
                surface: surface.dimensions(),
                frame,
            })
            .into());
        }
        let Some((surface_pipeline, surface_layout)) = &self.pipelines.blur_surface else {
            return Err(GpuError::new(GpuErrorKind::InteropUnsupported).into());
        };

        let start = Instant::now();
        let groups = workgroup_grid(request.pixel_count(), self.pipelines.workgroup_size)?;
        let precision_warning = check_precision(request);

        let device = &self.context.device;
        let buffers = ensure_buffers(
            &mut self.buffers,
            device,
            request.resolution_x,
            request.resolution_y,
            self.context.info.max_allocation,
        )?;
        self.context.queue.write_buffer(
            &buffers.uniforms,
            0,
            bytemuck::bytes_of(&Uniforms::new(request)),
        );

        let guard = surface.acquire_for_compute();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let blur_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_surface_bind_group"),
            layout: surface_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.raw.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(surface.view()),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("surface_encoder"),
        });
        encode_escape(&mut encoder, device, &self.pipelines, buffers, groups);
        encode_pass(
            &mut encoder,
            "blur_surface_pass",
            surface_pipeline,
            &blur_bind_group,
            groups,
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));
        device.poll(wgpu::Maintain::Wait);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::new(GpuErrorKind::Validation(err.to_string())).into());
        }
        guard.complete();

        let compute_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "GPU rendered {}x{} to surface in {:.1}ms",
            frame.0,
            frame.1,
            compute_time_ms
        );
        Ok(SurfaceFrame {
            generation: surface.generation(),
            precision_warning,
            compute_time_ms,
        })
    }

    /// Render `request` at `multiplier` times its resolution for export.
    ///
    /// The frame is tiled to fit the device's allocation limit. The
    /// interactive buffers are freed for the duration and reallocated before
    /// returning, whether or not the export succeeded. A multiplier that
    /// overflows the resolution is rejected before anything is freed.
    pub fn render_high_res(
        &mut self,
        request: &ViewRequest,
        multiplier: u32,
    ) -> Result<PixelBuffer, ComputeError> {
        let scaled = export_request(request, multiplier)?;
        let standard = self.buffer_dimensions();
        log::info!(
            "High-res export at {}x{} ({}x)",
            scaled.resolution_x,
            scaled.resolution_y,
            multiplier
        );

        self.buffers = None;
        let result = render_tiled(self, &scaled);
        let restored = self.restore_buffers(standard);

        let frame = result?;
        restored?;
        Ok(frame.pixels)
    }

    fn restore_buffers(&mut self, dimensions: Option<(u32, u32)>) -> Result<(), GpuError> {
        self.buffers = None;
        if let Some((width, height)) = dimensions {
            ensure_buffers(
                &mut self.buffers,
                &self.context.device,
                width,
                height,
                self.context.info.max_allocation,
            )?;
        }
        Ok(())
    }
}

fn check_precision(request: &ViewRequest) -> bool {
    let lost = precision_loss(&request.bounds, request.resolution_x, request.resolution_y);
    if lost {
        log::warn!(
            "Adjacent pixels share coordinates at {:e} wide; switch to arbitrary precision",
            request.bounds.width()
        );
    }
    lost
}

/// Reuse the buffers in `slot` when they match, otherwise replace them.
fn ensure_buffers<'a>(
    slot: &'a mut Option<DeviceBuffers>,
    device: &wgpu::Device,
    width: u32,
    height: u32,
    max_allocation: u64,
) -> Result<&'a DeviceBuffers, GpuError> {
    let buffers = match slot.take() {
        Some(b) if b.dimensions() == (width, height) => b,
        old => {
            // Free the old allocation first
            drop(old);
            DeviceBuffers::new(device, width, height, max_allocation)?
        }
    };
    Ok(slot.insert(buffers))
}

fn encode_escape(
    encoder: &mut wgpu::CommandEncoder,
    device: &wgpu::Device,
    pipelines: &Pipelines,
    buffers: &DeviceBuffers,
    groups: (u32, u32),
) {
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("escape_time_bind_group"),
        layout: &pipelines.escape_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffers.uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: buffers.raw.as_entire_binding(),
            },
        ],
    });
    encode_pass(encoder, "escape_time_pass", &pipelines.escape, &bind_group, groups);
}

fn encode_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    groups: (u32, u32),
) {
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some(label),
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.dispatch_workgroups(groups.0, groups.1, 1);
}

async fn read_buffer_f32(device: &wgpu::Device, buffer: &wgpu::Buffer) -> Result<Vec<f32>, GpuError> {
    let slice = buffer.slice(..);

    let (tx, rx) = futures_channel::oneshot::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device.poll(wgpu::Maintain::Wait);

    rx.await
        .map_err(|_| GpuError::new(GpuErrorKind::ChannelClosed))??;

    let data = {
        let view = slice.get_mapped_range();
        bytemuck::cast_slice(&view).to_vec()
    };
    buffer.unmap();

    Ok(data)
}

impl ComputeBackend for AcceleratorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerator
    }

    fn render(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError> {
        request.validate()?;
        if needs_tiling(request, self.max_allocation_bytes()) {
            return render_tiled(self, request);
        }
        Ok(pollster::block_on(self.render_frame(request))?)
    }

    fn describe(&self) -> String {
        format!("{} on {}", self.kind(), self.context.info.name)
    }
}

impl TileRenderer for AcceleratorBackend {
    fn max_allocation_bytes(&self) -> u64 {
        self.context.info.max_allocation
    }

    fn render_tile(&mut self, request: &ViewRequest) -> Result<Frame, ComputeError> {
        Ok(pollster::block_on(self.render_frame(request))?)
    }

    fn work_group_size(&self) -> u32 {
        self.pipelines.workgroup_size
    }
}
