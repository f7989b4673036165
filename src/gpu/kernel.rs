//! Sampler kernel compilation and dispatch.

use super::buffer::CountBuffers;
use super::runtime::{describe, ComputeSession};
use super::WORKGROUP_SIZE;
use crate::error::{Error, Result};
use crate::kernel_source::KernelSource;

/// Compiled `count_points` pipeline.
pub struct SamplerKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    entry_point: String,
}

impl SamplerKernel {
    /// Builds the shader module and compute pipeline for `entry_point`.
    ///
    /// Any validation failure (WGSL parse errors, a missing entry point, a
    /// binding layout that does not match) comes back as `Error::Build`
    /// carrying the full diagnostic.
    pub async fn compile(
        session: &ComputeSession,
        source: &KernelSource,
        entry_point: &str,
    ) -> Result<Self> {
        let device = session.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gpu-pi-sampler-shader"),
            source: wgpu::ShaderSource::Wgsl(source.text().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gpu-pi-sampler-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gpu-pi-sampler-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("gpu-pi-sampler-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point,
        });

        if let Some(e) = device.pop_error_scope().await {
            return Err(Error::Build {
                entry_point: entry_point.to_string(),
                log: describe(&e),
            });
        }

        match source.origin() {
            Some(path) => log::info!("built kernel {} from {}", entry_point, path.display()),
            None => log::info!("built kernel {} from built-in source", entry_point),
        }

        Ok(Self {
            pipeline,
            bind_group_layout,
            entry_point: entry_point.to_string(),
        })
    }

    /// Entry point the pipeline was built from.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Runs one worker per output slot and blocks until the device has
    /// finished the batch.
    pub async fn dispatch(&self, session: &ComputeSession, buffers: &CountBuffers) -> Result<()> {
        let workgroups = workgroup_count(buffers.workers());
        if workgroups > session.limits().max_compute_workgroups_per_dimension {
            return Err(Error::config(format!(
                "{} workers need {} workgroups, the device allows {}",
                buffers.workers(),
                workgroups,
                session.limits().max_compute_workgroups_per_dimension
            )));
        }

        let device = session.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gpu-pi-sampler-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.params().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.output().as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gpu-pi-sampler-encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("gpu-pi-sampler-pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroups, 1, 1);
        }

        let submission = session.queue().submit(Some(encoder.finish()));
        if let Some(e) = device.pop_error_scope().await {
            return Err(Error::gpu("dispatch", describe(&e)));
        }

        log::debug!(
            "dispatched {} as {} workgroups of {} for {} workers",
            self.entry_point(),
            workgroups,
            WORKGROUP_SIZE,
            buffers.workers()
        );
        device.poll(wgpu::Maintain::WaitForSubmissionIndex(submission));

        Ok(())
    }
}

impl std::fmt::Debug for SamplerKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerKernel")
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}

fn workgroup_count(workers: u32) -> u32 {
    workers.div_ceil(WORKGROUP_SIZE)
}
