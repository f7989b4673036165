//! One estimation run: partition, sample, read back, reduce.

use crate::config::{Backend, Config};
use crate::error::Result;
use crate::partition::{Partition, WorkerCapability};
use crate::reducer::{self, Estimate};
use crate::sampler::HostSampler;
use crate::telemetry::PhaseTimer;
use serde::Serialize;
use std::time::Duration;

/// Worker count the host backend uses when none is requested.
pub const HOST_DEFAULT_WORKERS: u32 = 256;

/// Timed phase covering the sampler run.
pub const PHASE_DISPATCH: &str = "dispatch";
/// Timed phase covering the copy of counts to the host.
pub const PHASE_READBACK: &str = "readback";

/// Everything a run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Backend that produced the counts.
    pub backend: Backend,
    /// Platform name, or `host`.
    pub platform: String,
    /// Device name, or the host thread count.
    pub device: String,
    /// How the samples were split.
    pub partition: Partition,
    /// Reduced estimate.
    pub estimate: Estimate,
    /// Reference value of π.
    pub reference: f64,
    /// `|estimate - reference|`.
    pub abs_error: f64,
    /// Dispatch plus readback wall-clock time.
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl RunReport {
    fn new(
        backend: Backend,
        platform: String,
        device: String,
        partition: Partition,
        estimate: Estimate,
        elapsed: Duration,
    ) -> Self {
        Self {
            backend,
            platform,
            device,
            partition,
            estimate,
            reference: std::f64::consts::PI,
            abs_error: estimate.abs_error(),
            elapsed,
        }
    }
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Runs the configured backend to completion.
///
/// Every failure is returned, never recovered; resources acquired along the
/// way are released before the error reaches the caller.
pub async fn run(config: &Config) -> Result<RunReport> {
    config.validate()?;

    match config.backend {
        Backend::Host => run_host(config),
        Backend::Gpu => run_gpu(config).await,
    }
}

/// Blocking wrapper around [`run`].
pub fn run_blocking(config: &Config) -> Result<RunReport> {
    #[cfg(feature = "gpu")]
    return pollster::block_on(run(config));

    #[cfg(not(feature = "gpu"))]
    {
        config.validate()?;
        match config.backend {
            Backend::Host => run_host(config),
            Backend::Gpu => Err(gpu_disabled()),
        }
    }
}

fn run_host(config: &Config) -> Result<RunReport> {
    let capability = WorkerCapability::new(HOST_DEFAULT_WORKERS, u32::MAX);
    let partition = Partition::from_capability(config.sample_budget, capability, config.workers)?;
    log_partition(&partition);
    reducer::check_partition(&partition)?;

    let sampler = HostSampler::new(config.host_threads(), config.seed);
    let timer = PhaseTimer::new();

    let counts = {
        let _phase = timer.enter(PHASE_DISPATCH);
        sampler.sample(&partition)?
    };

    let estimate = reducer::reduce(&counts, &partition)?;

    Ok(RunReport::new(
        Backend::Host,
        "host".to_string(),
        format!("{} threads", sampler.threads()),
        partition,
        estimate,
        timer.total(&[PHASE_DISPATCH, PHASE_READBACK]),
    ))
}

#[cfg(feature = "gpu")]
async fn run_gpu(config: &Config) -> Result<RunReport> {
    use crate::gpu::{ComputeSession, CountBuffers, GpuOptions, SamplerKernel};
    use crate::kernel_source::KernelSource;

    let source = KernelSource::load(&config.kernel_path)?;

    let session = ComputeSession::new(GpuOptions::from(config)).await?;

    let kernel = SamplerKernel::compile(&session, &source, &config.entry_point).await?;

    let partition =
        Partition::from_capability(config.sample_budget, session.worker_capability(), config.workers)?;
    log_partition(&partition);
    reducer::check_partition(&partition)?;

    let buffers = CountBuffers::allocate(&session, &partition, config.seed).await?;
    let timer = PhaseTimer::new();

    {
        let _phase = timer.enter(PHASE_DISPATCH);
        kernel.dispatch(&session, &buffers).await?;
    }

    let counts = {
        let _phase = timer.enter(PHASE_READBACK);
        buffers.read_counts(&session).await?
    };

    let estimate = reducer::reduce(&counts, &partition)?;

    Ok(RunReport::new(
        Backend::Gpu,
        session.platform_name(),
        session.device_name().to_string(),
        partition,
        estimate,
        timer.total(&[PHASE_DISPATCH, PHASE_READBACK]),
    ))
}

#[cfg(not(feature = "gpu"))]
async fn run_gpu(_config: &Config) -> Result<RunReport> {
    Err(gpu_disabled())
}

#[cfg(not(feature = "gpu"))]
fn gpu_disabled() -> crate::error::Error {
    crate::error::Error::config("built without the `gpu` feature; use the host backend")
}

fn log_partition(partition: &Partition) {
    log::info!(
        "{} workers x {} trials = {} samples ({} requested)",
        partition.worker_count(),
        partition.trials_per_worker(),
        partition.total_samples(),
        partition.requested()
    );
    if partition.dropped_samples() > 0 {
        log::debug!("{} samples dropped by truncation", partition.dropped_samples());
    }
}
