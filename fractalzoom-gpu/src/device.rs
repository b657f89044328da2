//! Device enumeration, selection and initialization.

use crate::error::{GpuError, GpuErrorKind};
use std::fmt;

/// Format of the surface shared with the display layer.
pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// What an adapter can do, as far as rendering is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    /// Supports f64 arithmetic in compute shaders.
    pub double_precision: bool,
    /// Can write the shared display surface directly.
    pub interop: bool,
    /// Largest single storage buffer, in bytes.
    pub max_allocation: u64,
}

impl DeviceInfo {
    fn from_adapter(index: usize, adapter: &wgpu::Adapter) -> Self {
        let info = adapter.get_info();
        let limits = adapter.limits();
        let surface = adapter.get_texture_format_features(SURFACE_FORMAT);
        Self {
            index,
            name: info.name,
            backend: info.backend,
            device_type: info.device_type,
            double_precision: adapter.features().contains(wgpu::Features::SHADER_F64),
            interop: surface
                .allowed_usages
                .contains(wgpu::TextureUsages::STORAGE_BINDING),
            max_allocation: limits
                .max_buffer_size
                .min(u64::from(limits.max_storage_buffer_binding_size)),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        write!(
            f,
            "[{}] {} ({:?}, f64: {}, interop: {}, max buffer {} MiB)",
            self.index,
            self.name,
            self.backend,
            yes_no(self.double_precision),
            yes_no(self.interop),
            self.max_allocation / (1024 * 1024)
        )
    }
}

/// Picks a device index from the enumerated list, or `None` to give up.
pub type DeviceChooser = Box<dyn Fn(&[DeviceInfo]) -> Option<usize> + Send + Sync>;

#[derive(Default)]
pub enum DeviceSelection {
    /// Prefer an interop-capable f64 device, then any f64 device.
    #[default]
    Auto,
    Index(usize),
    Manual(DeviceChooser),
}

impl fmt::Debug for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelection::Auto => f.write_str("Auto"),
            DeviceSelection::Index(i) => f.debug_tuple("Index").field(i).finish(),
            DeviceSelection::Manual(_) => f.write_str("Manual(..)"),
        }
    }
}

/// Resolve a selection against the enumerated devices.
///
/// Returns the chosen index and whether the device writes the shared
/// surface directly (otherwise frames go through a host copy).
pub fn select_device(
    selection: &DeviceSelection,
    devices: &[DeviceInfo],
) -> Result<(usize, bool), GpuError> {
    if devices.is_empty() {
        return Err(GpuErrorKind::NoAdapter.into());
    }

    let index = match selection {
        DeviceSelection::Auto => {
            if let Some(d) = devices.iter().find(|d| d.double_precision && d.interop) {
                return Ok((d.index, true));
            }
            let Some(d) = devices.iter().find(|d| d.double_precision) else {
                return Err(GpuErrorKind::NoDoublePrecisionDevice.into());
            };
            log::warn!(
                "No f64 device can write the shared surface; {} runs in host-copy mode",
                d.name
            );
            return Ok((d.index, false));
        }
        DeviceSelection::Index(index) => *index,
        DeviceSelection::Manual(choose) => {
            choose(devices).ok_or_else(|| GpuError::new(GpuErrorKind::SelectionCancelled))?
        }
    };

    let Some(device) = devices.get(index) else {
        return Err(GpuErrorKind::DeviceIndex {
            index,
            count: devices.len(),
        }
        .into());
    };
    if !device.double_precision {
        return Err(GpuErrorKind::NoDoublePrecisionDevice.into());
    }
    Ok((index, device.interop))
}

fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Every adapter on the system with its capabilities.
pub fn enumerate_devices() -> Vec<DeviceInfo> {
    let instance = new_instance();
    instance
        .enumerate_adapters(wgpu::Backends::all())
        .iter()
        .enumerate()
        .map(|(i, adapter)| DeviceInfo::from_adapter(i, adapter))
        .collect()
}

/// Holds the wgpu device and queue for the selected adapter.
pub struct DeviceContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub info: DeviceInfo,
    /// Frames are written straight into the shared surface.
    pub interop: bool,
}

/// Result of a device initialization attempt.
pub enum DeviceAvailability {
    Available(DeviceContext),
    Unavailable(String),
}

impl DeviceContext {
    /// Attempt to initialize a device. Returns Unavailable on any failure.
    pub async fn try_init(selection: &DeviceSelection) -> DeviceAvailability {
        match Self::init(selection).await {
            Ok(ctx) => DeviceAvailability::Available(ctx),
            Err(e) => {
                log::warn!("GPU initialization failed: {e}");
                DeviceAvailability::Unavailable(e.to_string())
            }
        }
    }

    pub async fn init(selection: &DeviceSelection) -> Result<Self, GpuError> {
        let instance = new_instance();
        let adapters = instance.enumerate_adapters(wgpu::Backends::all());
        let devices: Vec<DeviceInfo> = adapters
            .iter()
            .enumerate()
            .map(|(i, adapter)| DeviceInfo::from_adapter(i, adapter))
            .collect();
        for d in &devices {
            log::debug!("Found {d}");
        }

        let (index, interop) = select_device(selection, &devices)?;
        let (Some(adapter), Some(info)) = (adapters.get(index), devices.get(index)) else {
            return Err(GpuErrorKind::DeviceIndex {
                index,
                count: devices.len(),
            }
            .into());
        };
        log::info!(
            "Using {}{}",
            info,
            if interop { "" } else { " in host-copy mode" }
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("fractalzoom"),
                    required_features: wgpu::Features::SHADER_F64,
                    required_limits: adapter.limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|err| {
            log::error!("Uncaptured device error: {err}");
        }));

        Ok(Self {
            device,
            queue,
            info: info.clone(),
            interop,
        })
    }

    /// Blocking form of [`DeviceContext::init`].
    pub fn init_blocking(selection: &DeviceSelection) -> Result<Self, GpuError> {
        pollster::block_on(Self::init(selection))
    }

    pub fn max_allocation(&self) -> u64 {
        self.info.max_allocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(index: usize, double_precision: bool, interop: bool) -> DeviceInfo {
        DeviceInfo {
            index,
            name: format!("device {index}"),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::DiscreteGpu,
            double_precision,
            interop,
            max_allocation: 1 << 30,
        }
    }

    #[test]
    fn auto_prefers_interop_with_f64() {
        let devices = [
            device(0, true, false),
            device(1, false, true),
            device(2, true, true),
        ];
        let (index, interop) = select_device(&DeviceSelection::Auto, &devices).unwrap();
        assert_eq!((index, interop), (2, true));
    }

    #[test]
    fn auto_falls_back_to_host_copy() {
        let devices = [device(0, false, true), device(1, true, false)];
        let (index, interop) = select_device(&DeviceSelection::Auto, &devices).unwrap();
        assert_eq!((index, interop), (1, false));
    }

    #[test]
    fn no_f64_device_is_fatal() {
        let devices = [device(0, false, true)];
        let err = select_device(&DeviceSelection::Auto, &devices).unwrap_err();
        assert!(matches!(err.kind(), GpuErrorKind::NoDoublePrecisionDevice));
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_list_has_no_adapter() {
        let err = select_device(&DeviceSelection::Auto, &[]).unwrap_err();
        assert!(matches!(err.kind(), GpuErrorKind::NoAdapter));
    }

    #[test]
    fn explicit_index_is_checked() {
        let devices = [device(0, true, false), device(1, false, false)];
        assert_eq!(
            select_device(&DeviceSelection::Index(0), &devices).unwrap(),
            (0, false)
        );
        let err = select_device(&DeviceSelection::Index(5), &devices).unwrap_err();
        assert!(matches!(
            err.kind(),
            GpuErrorKind::DeviceIndex { index: 5, count: 2 }
        ));
        let err = select_device(&DeviceSelection::Index(1), &devices).unwrap_err();
        assert!(matches!(err.kind(), GpuErrorKind::NoDoublePrecisionDevice));
    }

    #[test]
    fn manual_chooser_sees_all_devices() {
        let devices = [device(0, true, true), device(1, true, false)];
        let pick_last = DeviceSelection::Manual(Box::new(|d| Some(d.len() - 1)));
        assert_eq!(select_device(&pick_last, &devices).unwrap(), (1, false));

        let cancel = DeviceSelection::Manual(Box::new(|_| None));
        let err = select_device(&cancel, &devices).unwrap_err();
        assert!(matches!(err.kind(), GpuErrorKind::SelectionCancelled));
    }

    #[test]
    fn error_reports_name_and_call_site() {
        let err = GpuError::new(GpuErrorKind::NoAdapter);
        let text = err.to_string();
        assert!(text.starts_with("NO_ADAPTER"));
        assert!(text.contains(file!()));
    }
}
