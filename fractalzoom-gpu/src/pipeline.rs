//! Compute pipelines for the escape and blur kernels.

use crate::error::{GpuError, GpuErrorKind};
use std::borrow::Cow;

const ESCAPE_SHADER: &str = include_str!("../shaders/escape_time.wgsl");
const BLUR_SHADER: &str = include_str!("../shaders/blur.wgsl");

/// Default invocations per workgroup.
pub const LOCAL_WORK_SIZE: u32 = 64;

/// Workgroups allowed along one dispatch dimension.
pub const MAX_GROUPS_PER_DIMENSION: u32 = 65_535;

/// Workgroup grid covering `global` invocations in groups of `local`.
///
/// Pixels are indexed linearly, so grids wider than one dimension allows
/// wrap into a second. Invocations past the end exit early in the shader.
pub fn workgroup_grid(global: u64, local: u32) -> Result<(u32, u32), GpuError> {
    if local == 0 || global % u64::from(local) != 0 {
        return Err(GpuErrorKind::WorkSizeMismatch { global, local }.into());
    }
    let groups = global / u64::from(local);
    let max = u64::from(MAX_GROUPS_PER_DIMENSION);
    let x = groups.min(max) as u32;
    let y = groups.div_ceil(max);
    if y > max {
        return Err(GpuErrorKind::AllocationTooLarge {
            requested: global,
            limit: max * max * u64::from(local),
        }
        .into());
    }
    Ok((x, y as u32))
}

/// Shader text with the workgroup size bound.
fn shader_source(body: &str, workgroup_size: u32) -> String {
    format!("const WORKGROUP_SIZE: u32 = {workgroup_size}u;\n\n{body}")
}

fn create_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    label: &str,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: None,
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

pub struct Pipelines {
    pub escape: wgpu::ComputePipeline,
    pub escape_layout: wgpu::BindGroupLayout,
    pub blur: wgpu::ComputePipeline,
    pub blur_layout: wgpu::BindGroupLayout,
    /// Present only when the device can write the shared surface.
    pub blur_surface: Option<(wgpu::ComputePipeline, wgpu::BindGroupLayout)>,
    pub workgroup_size: u32,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, workgroup_size: u32, interop: bool) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let escape_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("escape_time_shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shader_source(
                ESCAPE_SHADER,
                workgroup_size,
            ))),
        });
        let blur_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blur_shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shader_source(
                BLUR_SHADER,
                workgroup_size,
            ))),
        });

        let escape = create_pipeline(device, &escape_module, "escape_time_pipeline", "main");
        let blur = create_pipeline(device, &blur_module, "blur_pipeline", "main");
        let blur_surface = interop.then(|| {
            let pipeline =
                create_pipeline(device, &blur_module, "blur_surface_pipeline", "main_surface");
            let layout = pipeline.get_bind_group_layout(0);
            (pipeline, layout)
        });
        let escape_layout = escape.get_bind_group_layout(0);
        let blur_layout = blur.get_bind_group_layout(0);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuErrorKind::Validation(err.to_string()).into());
        }
        log::debug!(
            "Compute pipelines ready, workgroup size {}, surface output {}",
            workgroup_size,
            interop
        );

        Ok(Self {
            escape,
            escape_layout,
            blur,
            blur_layout,
            blur_surface,
            workgroup_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_grid_is_one_dimensional() {
        assert_eq!(workgroup_grid(1920 * 1080, 64).unwrap(), (32_400, 1));
    }

    #[test]
    fn large_grid_wraps_into_second_dimension() {
        // 8K frame: 33_177_600 / 64 = 518_400 groups
        let (x, y) = workgroup_grid(7680 * 4320, 64).unwrap();
        assert_eq!(x, MAX_GROUPS_PER_DIMENSION);
        assert_eq!(y, 8);
        assert!(u64::from(x) * u64::from(y) * 64 >= 7680 * 4320);
    }

    #[test]
    fn indivisible_global_size_is_rejected() {
        let err = workgroup_grid(100, 64).unwrap_err();
        assert!(matches!(
            err.kind(),
            GpuErrorKind::WorkSizeMismatch {
                global: 100,
                local: 64
            }
        ));
        assert!(!err.is_fatal());
        assert!(workgroup_grid(128, 0).is_err());
    }

    #[test]
    fn shader_source_binds_workgroup_size() {
        let src = shader_source(ESCAPE_SHADER, 128);
        assert!(src.starts_with("const WORKGROUP_SIZE: u32 = 128u;"));
        assert!(src.contains("@workgroup_size(WORKGROUP_SIZE)"));
        assert!(shader_source(BLUR_SHADER, 64).contains("fn main_surface"));
    }
}
