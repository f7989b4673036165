//! Host-side sampler.
//!
//! This is the reference implementation of the `count_points` kernel in
//! `kernels/count_points.wgsl`: the generator, the coordinate mapping and the
//! containment test use the same integer and `f32` arithmetic, so a worker
//! seeded with the same index and run seed draws the same points on either
//! side.
//!
//! Each worker owns a PCG stream. The stream selector (increment) is derived
//! from the worker index, and the starting state is a hash of the index mixed
//! with the run seed, so neighbouring workers neither share a sequence nor
//! start at correlated offsets.

use crate::error::{Error, Result};
use crate::partition::Partition;

const PCG_MULTIPLIER: u32 = 747_796_405;
const PCG_INCREMENT: u32 = 2_891_336_453;
const RXS_MULTIPLIER: u32 = 277_803_737;

/// Apothem of the regular hexagon inscribed in the unit circle (`√3/2`).
pub const APOTHEM: f32 = 0.866_025_4;
/// Height of the box holding one circular segment (`1 − √3/2`).
pub const SEGMENT_HEIGHT: f32 = 1.0 - APOTHEM;

fn rxs_m_xs(state: u32) -> u32 {
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(RXS_MULTIPLIER);
    (word >> 22) ^ word
}

/// Stateless PCG hash.
pub fn pcg_hash(input: u32) -> u32 {
    rxs_m_xs(input.wrapping_mul(PCG_MULTIPLIER).wrapping_add(PCG_INCREMENT))
}

/// Per-worker 32-bit PCG generator (RXS-M-XS output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRng {
    state: u32,
    increment: u32,
}

impl WorkerRng {
    /// Generator of worker `worker_index` under run seed `seed`.
    pub fn new(worker_index: u32, seed: u32) -> Self {
        Self {
            state: pcg_hash(worker_index ^ pcg_hash(seed)),
            increment: (worker_index << 1) | 1,
        }
    }

    /// Next 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG_MULTIPLIER).wrapping_add(self.increment);
        rxs_m_xs(old)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f32 {
        unit_f32(self.next_u32())
    }
}

/// Maps the top 24 bits of `bits` onto `[0, 1)`; every result is exact in `f32`.
pub fn unit_f32(bits: u32) -> f32 {
    (bits >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Containment test for one draw.
///
/// `(u, v)` in `[0, 1)²` is mapped onto the box
/// `[−½, ½] × [√3/2, 1]` spanning one side of the inscribed hexagon; the
/// point counts when it lies inside the unit circle, i.e. in the circular
/// segment between that side and the arc.
pub fn in_segment(u: f32, v: f32) -> bool {
    let x = u - 0.5;
    let y = APOTHEM + v * SEGMENT_HEIGHT;
    x * x + y * y <= 1.0
}

/// Runs one worker's trials and returns its hit count.
pub fn count_points(worker_index: u32, trials: u32, seed: u32) -> u32 {
    let mut rng = WorkerRng::new(worker_index, seed);
    let mut hits = 0u32;

    for _ in 0..trials {
        let u = rng.next_unit();
        let v = rng.next_unit();
        if in_segment(u, v) {
            hits += 1;
        }
    }

    hits
}

/// Runs every worker of a partition on host threads.
#[derive(Debug, Clone)]
pub struct HostSampler {
    threads: usize,
    seed: u32,
}

impl HostSampler {
    /// Sampler on `threads` threads (at least one).
    pub fn new(threads: usize, seed: u32) -> Self {
        Self {
            threads: threads.max(1),
            seed,
        }
    }

    /// Threads the sampler spawns.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// One count per worker, in worker order.
    ///
    /// The output is split into disjoint chunks up front; a thread only ever
    /// writes the slots of the workers it was handed. Fails with
    /// `Error::OutOfMemory` when the host cannot hold one count per worker.
    pub fn sample(&self, partition: &Partition) -> Result<Vec<u32>> {
        let workers = partition.worker_count() as usize;
        let trials = partition.trials_per_worker();
        let mut counts = reserve_counts(workers)?;
        counts.resize(workers, 0);

        let chunk = workers.div_ceil(self.threads).max(1);
        log::debug!(
            "host sampler: {} workers x {} trials on {} threads",
            workers,
            trials,
            self.threads
        );

        std::thread::scope(|s| {
            for (chunk_index, slots) in counts.chunks_mut(chunk).enumerate() {
                let first = chunk_index * chunk;
                let seed = self.seed;
                s.spawn(move || {
                    for (offset, slot) in slots.iter_mut().enumerate() {
                        *slot = count_points((first + offset) as u32, trials, seed);
                    }
                });
            }
        });

        Ok(counts)
    }
}

/// Empty count vector with room for `workers` slots.
///
/// Fails with `Error::OutOfMemory` instead of aborting when the host cannot
/// provide the buffer.
pub(crate) fn reserve_counts(workers: usize) -> Result<Vec<u32>> {
    let mut counts = Vec::new();
    counts.try_reserve_exact(workers).map_err(|_| {
        Error::out_of_memory(
            "host count buffer",
            (workers as u64).saturating_mul(std::mem::size_of::<u32>() as u64),
        )
    })?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_range() {
        assert_eq!(unit_f32(0), 0.0);
        assert!(unit_f32(u32::MAX) < 1.0);
        assert_eq!(unit_f32(1 << 31), 0.5);
    }

    #[test]
    fn test_predicate_corners() {
        // Bottom edge of the box is the hexagon side, entirely inside the circle.
        assert!(in_segment(0.5, 0.0));
        assert!(in_segment(0.01, 0.0));
        // Top corners are outside the circle, top centre touches it.
        assert!(!in_segment(0.0, 0.999));
        assert!(in_segment(0.5, 0.999));
    }

    #[test]
    fn test_worker_rng_is_reproducible() {
        let mut a = WorkerRng::new(17, 42);
        let mut b = WorkerRng::new(17, 42);
        for _ in 0..1_000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_workers_get_distinct_streams() {
        let first: Vec<u32> = (0..256)
            .map(|i| WorkerRng::new(i, 0).next_u32())
            .collect();
        let mut dedup = first.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), first.len());
    }

    #[test]
    fn test_seed_changes_stream() {
        assert_ne!(WorkerRng::new(3, 1), WorkerRng::new(3, 2));
        assert_ne!(WorkerRng::new(3, 1).next_u32(), WorkerRng::new(3, 2).next_u32());
    }

    #[test]
    fn test_zero_trials() {
        assert_eq!(count_points(0, 0, 0), 0);
    }

    #[test]
    fn test_hit_rate_near_segment_ratio() {
        let expected = (std::f64::consts::PI / 6.0 - 3f64.sqrt() / 4.0) / (1.0 - 3f64.sqrt() / 2.0);
        let hits = count_points(9, 1_000_000, 7);
        let rate = f64::from(hits) / 1_000_000.0;
        assert!((rate - expected).abs() < 0.005, "rate {rate} vs {expected}");
    }

    #[test]
    fn test_host_sampler_matches_single_worker_runs() {
        let partition = Partition::new(10_000, 13).unwrap();
        let counts = HostSampler::new(4, 5).sample(&partition).unwrap();

        assert_eq!(counts.len(), 13);
        for (i, &c) in counts.iter().enumerate() {
            assert_eq!(c, count_points(i as u32, partition.trials_per_worker(), 5));
        }
    }

    #[test]
    fn test_thread_count_does_not_change_counts() {
        let partition = Partition::new(50_000, 37).unwrap();
        let one = HostSampler::new(1, 11).sample(&partition).unwrap();
        let many = HostSampler::new(8, 11).sample(&partition).unwrap();
        assert_eq!(one, many);
    }

    #[test]
    fn test_count_buffer_allocation_failure_is_reported() {
        let workers = usize::MAX / 2;
        let err = reserve_counts(workers).unwrap_err();
        assert_eq!(err.exit_code(), 5);
        match err {
            Error::OutOfMemory { what, bytes } => {
                assert_eq!(what, "host count buffer");
                assert_eq!(bytes, (workers as u64).saturating_mul(4));
            }
            other => panic!("expected out of memory, got {:?}", other),
        }
    }

    #[test]
    fn test_reserve_counts_has_room() {
        let counts = reserve_counts(1_024).unwrap();
        assert!(counts.is_empty());
        assert!(counts.capacity() >= 1_024);
    }
}
