//! wgpu compute backend: session, sampler kernel and count buffers.

pub mod buffer;
pub mod kernel;
pub mod runtime;

pub use buffer::{CountBuffers, SamplerParams};
pub use kernel::SamplerKernel;
pub use runtime::{ComputeSession, GpuOptions};

/// Invocations per workgroup; must match `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 64;
