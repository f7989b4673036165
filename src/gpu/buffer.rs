//! Device buffers for one dispatch and the readback of partial counts.

use super::runtime::{describe, ComputeSession};
use crate::error::{Error, Result};
use crate::partition::Partition;
use crate::sampler::reserve_counts;
use wgpu::util::DeviceExt;

/// Uniform block of the sampler kernel; layout matches `Params` in the WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SamplerParams {
    /// Trials per worker.
    pub trials: u32,
    /// Run seed.
    pub seed: u32,
    /// Worker count; invocations at or past it write nothing.
    pub workers: u32,
    /// Pads the block to 16 bytes.
    pub _pad: u32,
}

impl SamplerParams {
    /// Parameters for `partition` under `seed`.
    pub fn new(partition: &Partition, seed: u32) -> Self {
        Self {
            trials: partition.trials_per_worker(),
            seed,
            workers: partition.worker_count(),
            _pad: 0,
        }
    }
}

/// Parameter, output and staging buffers. The output buffer holds one
/// `u32` slot per worker; the staging buffer is its host-mappable copy.
pub struct CountBuffers {
    params: wgpu::Buffer,
    output: wgpu::Buffer,
    staging: wgpu::Buffer,
    workers: u32,
}

impl CountBuffers {
    /// Creates the three buffers for `partition`.
    ///
    /// Sizes beyond the device limits, and allocation failures reported by
    /// the device, come back as `Error::OutOfMemory`.
    pub async fn allocate(session: &ComputeSession, partition: &Partition, seed: u32) -> Result<Self> {
        let workers = partition.worker_count();
        let size = output_size(workers);

        let limits = session.limits();
        if size > u64::from(limits.max_storage_buffer_binding_size) || size > limits.max_buffer_size {
            return Err(Error::out_of_memory("device output buffer", size));
        }

        let device = session.device();
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gpu-pi-params"),
            contents: bytemuck::bytes_of(&SamplerParams::new(partition, seed)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpu-pi-counts"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpu-pi-staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        if let Some(e) = device.pop_error_scope().await {
            return Err(Error::gpu("create_buffer", describe(&e)));
        }
        if device.pop_error_scope().await.is_some() {
            return Err(Error::out_of_memory("device buffers", size * 2));
        }

        log::debug!("allocated {} bytes of count buffers for {} workers", size, workers);

        Ok(Self {
            params,
            output,
            staging,
            workers,
        })
    }

    /// Uniform parameter buffer (binding 0).
    pub fn params(&self) -> &wgpu::Buffer {
        &self.params
    }

    /// Per-worker count buffer (binding 1).
    pub fn output(&self) -> &wgpu::Buffer {
        &self.output
    }

    /// Number of count slots.
    pub fn workers(&self) -> u32 {
        self.workers
    }

    /// Copies the counts to the host.
    ///
    /// Blocks until the transfer has finished. Must only be called after the
    /// dispatch that writes the output buffer has completed.
    pub async fn read_counts(&self, session: &ComputeSession) -> Result<Vec<u32>> {
        let size = output_size(self.workers);
        let device = session.device();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gpu-pi-readback-encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.output, 0, &self.staging, 0, size);
        let submission = session.queue().submit(Some(encoder.finish()));
        if let Some(e) = device.pop_error_scope().await {
            return Err(Error::gpu("copy_buffer_to_buffer", describe(&e)));
        }

        let slice = self.staging.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::WaitForSubmissionIndex(submission));

        receiver
            .await
            .map_err(|_| Error::gpu("map_async", "map callback was dropped"))?
            .map_err(|e| Error::gpu("map_async", e.to_string()))?;

        let mut counts = reserve_counts(self.workers as usize)?;
        {
            let data = slice.get_mapped_range();
            counts.extend_from_slice(bytemuck::cast_slice::<u8, u32>(&data));
        }
        self.staging.unmap();

        Ok(counts)
    }
}

impl std::fmt::Debug for CountBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountBuffers")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

fn output_size(workers: u32) -> u64 {
    u64::from(workers) * std::mem::size_of::<u32>() as u64
}
