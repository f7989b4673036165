//! Compute session: the adapter, device and queue of one run.

use super::WORKGROUP_SIZE;
use crate::config::{Config, PowerPreference};
use crate::error::{Error, Result};
use crate::partition::WorkerCapability;

/// Adapter selection options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuOptions {
    /// Which adapter class to ask for first.
    pub power_preference: PowerPreference,
    /// Accept adapters that are not GPUs.
    pub allow_non_gpu: bool,
}

impl From<&Config> for GpuOptions {
    fn from(config: &Config) -> Self {
        Self {
            power_preference: config.power_preference,
            allow_non_gpu: config.allow_non_gpu,
        }
    }
}

/// Owns the device and queue for one run. Everything created from the
/// session is released when it drops, on success and error paths alike.
pub struct ComputeSession {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    limits: wgpu::Limits,
}

impl ComputeSession {
    /// Picks one adapter and opens a device on it.
    pub async fn new(options: GpuOptions) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power_preference = match options.power_preference {
            PowerPreference::Low => wgpu::PowerPreference::LowPower,
            PowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(Error::NoPlatform)?;

        let adapter_info = adapter.get_info();
        log::info!(
            "adapter: {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        if !options.allow_non_gpu && !is_gpu(adapter_info.device_type) {
            return Err(Error::NoDevice {
                platform: platform_name(&adapter_info),
                found: format!("{:?} adapter \"{}\"", adapter_info.device_type, adapter_info.name),
            });
        }

        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("gpu-pi-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits.clone(),
                },
                None,
            )
            .await
            .map_err(|e| Error::gpu("request_device", e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter_info,
            limits,
        })
    }

    /// Worker counts one dispatch of the sampler can host.
    ///
    /// The default is one workgroup's worth of invocations; larger counts
    /// are bounded by the dispatch grid and the largest binding that can
    /// hold one count per worker.
    pub fn worker_capability(&self) -> WorkerCapability {
        let preferred = self.limits.max_compute_invocations_per_workgroup;
        let by_grid = self
            .limits
            .max_compute_workgroups_per_dimension
            .saturating_mul(WORKGROUP_SIZE);
        let by_binding = self.limits.max_storage_buffer_binding_size / 4;
        let max = by_grid.min(by_binding);

        WorkerCapability::new(preferred.min(max), max)
    }

    /// Device that owns every buffer and pipeline of the run.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Queue for dispatch and copy submissions.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Limits the device was opened with.
    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    /// Backend API of the adapter, e.g. "Vulkan".
    pub fn platform_name(&self) -> String {
        platform_name(&self.adapter_info)
    }

    /// Adapter name as the driver reports it.
    pub fn device_name(&self) -> &str {
        &self.adapter_info.name
    }
}

impl std::fmt::Debug for ComputeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeSession")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish_non_exhaustive()
    }
}

fn is_gpu(device_type: wgpu::DeviceType) -> bool {
    matches!(
        device_type,
        wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu | wgpu::DeviceType::VirtualGpu
    )
}

fn platform_name(info: &wgpu::AdapterInfo) -> String {
    if info.driver.is_empty() {
        format!("{:?}", info.backend)
    } else {
        format!("{:?} ({})", info.backend, info.driver)
    }
}

/// Text of a captured device error.
pub(crate) fn describe(error: &wgpu::Error) -> String {
    match error {
        wgpu::Error::Validation { description, .. } => description.clone(),
        other => other.to_string(),
    }
}
