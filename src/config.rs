//! Run configuration and its builder.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Samples requested when none are given.
pub const DEFAULT_SAMPLE_BUDGET: u64 = 1_000_000_000;
/// WGSL file loaded by the GPU backend.
pub const DEFAULT_KERNEL_PATH: &str = "kernels/count_points.wgsl";
/// Compute entry point of the sampler kernel.
pub const DEFAULT_ENTRY_POINT: &str = "count_points";

/// Where the sampler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Compute shader on a GPU adapter.
    Gpu,
    /// Reference sampler on host threads.
    Host,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "gpu")]
        return Backend::Gpu;

        #[cfg(not(feature = "gpu"))]
        Backend::Host
    }
}

/// Adapter selection hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PowerPreference {
    /// Prefer integrated, power-saving adapters.
    Low,
    /// Prefer discrete, high-performance adapters.
    #[default]
    High,
}

/// Settings for one estimation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Samples requested; the partition may execute fewer.
    pub sample_budget: u64,
    /// Where the sampler runs.
    pub backend: Backend,
    /// Kernel source loaded by the GPU backend.
    pub kernel_path: PathBuf,
    /// Entry point looked up in the kernel source.
    pub entry_point: String,

    /// Worker count override; the backend's capability decides when unset.
    pub workers: Option<u32>,
    /// Run seed mixed into every worker's generator.
    pub seed: u32,

    /// Adapter selection hint for the GPU backend.
    pub power_preference: PowerPreference,
    /// Accept integrated, virtual or software adapters, not just GPUs.
    pub allow_non_gpu: bool,

    /// Host backend thread count; defaults to the number of CPUs.
    pub host_threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_budget: DEFAULT_SAMPLE_BUDGET,
            backend: Backend::default(),
            kernel_path: PathBuf::from(DEFAULT_KERNEL_PATH),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            workers: None,
            seed: 0,
            power_preference: PowerPreference::default(),
            allow_non_gpu: false,
            host_threads: None,
        }
    }
}

impl Config {
    /// Starts from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Rejects settings that cannot produce an estimate.
    pub fn validate(&self) -> Result<()> {
        if self.sample_budget == 0 {
            return Err(Error::config("sample_budget must be > 0"));
        }

        if self.workers == Some(0) {
            return Err(Error::config("workers must be > 0"));
        }

        if let Some(workers) = self.workers {
            if u64::from(workers) > self.sample_budget {
                return Err(Error::config(format!(
                    "{} workers would each run 0 trials of a {} sample budget",
                    workers, self.sample_budget
                )));
            }
        }

        if self.host_threads == Some(0) {
            return Err(Error::config("host_threads must be > 0"));
        }

        if self.entry_point.is_empty() {
            return Err(Error::config("entry_point must not be empty"));
        }

        Ok(())
    }

    /// Thread count the host backend will use.
    pub fn host_threads(&self) -> usize {
        self.host_threads.unwrap_or_else(num_cpus::get)
    }
}

/// Builder for [`Config`]; `build` validates.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Samples to request.
    pub fn sample_budget(mut self, samples: u64) -> Self {
        self.config.sample_budget = samples;
        self
    }

    /// Backend to run on.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Kernel source file.
    pub fn kernel_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.kernel_path = path.into();
        self
    }

    /// Kernel entry point.
    pub fn entry_point<S: Into<String>>(mut self, name: S) -> Self {
        self.config.entry_point = name.into();
        self
    }

    /// Fixed worker count instead of the backend's preference.
    pub fn workers(mut self, n: u32) -> Self {
        self.config.workers = Some(n);
        self
    }

    /// Run seed.
    pub fn seed(mut self, seed: u32) -> Self {
        self.config.seed = seed;
        self
    }

    /// Adapter power preference.
    pub fn power_preference(mut self, preference: PowerPreference) -> Self {
        self.config.power_preference = preference;
        self
    }

    /// Accept adapters that are not GPUs.
    pub fn allow_non_gpu(mut self, allow: bool) -> Self {
        self.config.allow_non_gpu = allow;
        self
    }

    /// Host backend thread count.
    pub fn host_threads(mut self, n: usize) -> Self {
        self.config.host_threads = Some(n);
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sample_budget, 1_000_000_000);
        assert_eq!(config.entry_point, "count_points");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .sample_budget(10_000)
            .backend(Backend::Host)
            .workers(16)
            .seed(9)
            .host_threads(2)
            .build()
            .unwrap();

        assert_eq!(config.workers, Some(16));
        assert_eq!(config.host_threads(), 2);
        assert_eq!(config.backend, Backend::Host);
    }

    #[test]
    fn test_validation() {
        assert!(Config::builder().sample_budget(0).build().is_err());
        assert!(Config::builder().workers(0).build().is_err());
        assert!(Config::builder().sample_budget(4).workers(8).build().is_err());
        assert!(Config::builder().host_threads(0).build().is_err());
        assert!(Config::builder().entry_point("").build().is_err());
    }
}
