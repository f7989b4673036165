//! Splitting a sample budget across the workers of one dispatch.

use crate::error::{Error, Result};
use serde::Serialize;

/// Worker-count bounds reported by a compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCapability {
    /// Worker count used when the caller does not ask for one.
    pub preferred: u32,
    /// Largest worker count a single dispatch can host.
    pub max: u32,
}

impl WorkerCapability {
    /// Capability with the given default and ceiling.
    pub fn new(preferred: u32, max: u32) -> Self {
        Self { preferred, max }
    }
}

/// How many trials each worker runs, and how many run in total.
///
/// `trials_per_worker * worker_count <= requested` always holds. Whatever
/// integer division truncates is dropped, not redistributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    requested: u64,
    worker_count: u32,
    trials_per_worker: u32,
}

impl Partition {
    /// Splits `sample_budget` evenly over `worker_count` workers.
    ///
    /// Fails for zero workers, or when a worker's share does not fit the
    /// kernel's 32-bit trial count.
    pub fn new(sample_budget: u64, worker_count: u32) -> Result<Self> {
        if worker_count == 0 {
            return Err(Error::config("worker count must be > 0"));
        }

        let trials = sample_budget / u64::from(worker_count);
        let trials_per_worker = u32::try_from(trials).map_err(|_| {
            Error::config(format!(
                "{} trials per worker exceeds the 32-bit kernel argument; use more workers",
                trials
            ))
        })?;

        Ok(Self {
            requested: sample_budget,
            worker_count,
            trials_per_worker,
        })
    }

    /// Pick the worker count from `capability`, or from `requested_workers`
    /// when given, then partition.
    pub fn from_capability(
        sample_budget: u64,
        capability: WorkerCapability,
        requested_workers: Option<u32>,
    ) -> Result<Self> {
        let workers = match requested_workers {
            Some(n) if n > capability.max => {
                return Err(Error::config(format!(
                    "{} workers requested but the device hosts at most {}",
                    n, capability.max
                )));
            }
            Some(n) => n,
            None => capability.preferred,
        };

        Self::new(sample_budget, workers)
    }

    /// Samples that were asked for.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Workers in the dispatch.
    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }

    /// Trials each worker runs.
    pub fn trials_per_worker(&self) -> u32 {
        self.trials_per_worker
    }

    /// Samples actually executed.
    pub fn total_samples(&self) -> u64 {
        u64::from(self.trials_per_worker) * u64::from(self.worker_count)
    }

    /// Requested samples lost to truncation.
    pub fn dropped_samples(&self) -> u64 {
        self.requested - self.total_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_even_split() {
        let p = Partition::new(1_000, 10).unwrap();
        assert_eq!(p.trials_per_worker(), 100);
        assert_eq!(p.total_samples(), 1_000);
        assert_eq!(p.dropped_samples(), 0);
    }

    #[test]
    fn test_truncation_is_accepted() {
        let p = Partition::new(1_000_000_000, 256).unwrap();
        assert_eq!(p.trials_per_worker(), 3_906_250);
        assert_eq!(p.total_samples(), 1_000_000_000);

        let p = Partition::new(1_000, 7).unwrap();
        assert_eq!(p.trials_per_worker(), 142);
        assert_eq!(p.total_samples(), 994);
        assert_eq!(p.dropped_samples(), 6);
    }

    #[test]
    fn test_more_workers_than_samples() {
        let p = Partition::new(5, 64).unwrap();
        assert_eq!(p.trials_per_worker(), 0);
        assert_eq!(p.total_samples(), 0);
    }

    #[test]
    fn test_zero_workers_is_config_error() {
        let err = Partition::new(1_000, 0).unwrap_err();
        assert!(err.is_config());

        let err = Partition::from_capability(1_000, WorkerCapability::new(0, 0), None).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_trials_must_fit_kernel_argument() {
        let err = Partition::new(u64::from(u32::MAX) * 2 + 2, 1).unwrap_err();
        assert!(err.is_config());
        assert!(Partition::new(u64::from(u32::MAX), 1).is_ok());
    }

    #[test]
    fn test_capability_selection() {
        let cap = WorkerCapability::new(256, 4096);

        let p = Partition::from_capability(1 << 20, cap, None).unwrap();
        assert_eq!(p.worker_count(), 256);

        let p = Partition::from_capability(1 << 20, cap, Some(1024)).unwrap();
        assert_eq!(p.worker_count(), 1024);

        assert!(Partition::from_capability(1 << 20, cap, Some(4097)).is_err());
        assert!(Partition::from_capability(1 << 20, cap, Some(0)).is_err());
    }

    #[test]
    fn test_never_exceeds_budget() {
        let mut rng = Pcg64::seed_from_u64(0x5eed);

        for _ in 0..10_000 {
            let budget = rng.gen_range(0..=10_000_000_000u64);
            let workers = rng.gen_range(1..=1_000_000u32);
            let Ok(p) = Partition::new(budget, workers) else {
                continue;
            };

            assert!(p.total_samples() <= budget);
            assert_eq!(
                p.total_samples(),
                u64::from(p.trials_per_worker()) * u64::from(p.worker_count())
            );
            assert!(p.dropped_samples() < u64::from(workers));
        }
    }
}
