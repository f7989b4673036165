//! Common imports.

pub use crate::config::{Backend, Config, ConfigBuilder, PowerPreference};
pub use crate::error::{Error, Result};
pub use crate::kernel_source::KernelSource;
pub use crate::partition::{Partition, WorkerCapability};
pub use crate::reducer::{reduce, Estimate};
pub use crate::runtime::{run, run_blocking, RunReport};
pub use crate::sampler::HostSampler;
pub use crate::telemetry::{ConsoleExporter, JsonExporter, ReportExporter};

#[cfg(feature = "gpu")]
pub use crate::gpu::{ComputeSession, GpuOptions, SamplerKernel};
