//! Host-side reduction of per-worker counts into a π estimate.

use crate::error::{Error, Result};
use crate::partition::Partition;
use serde::Serialize;

/// Area of the regular hexagon inscribed in the unit circle, `3√3/2`.
pub const HEXAGON_AREA: f64 = 2.598_076_211_353_316;

/// Area of the box around one circular segment, `1 × (1 − √3/2)`.
pub const SEGMENT_BOX_AREA: f64 = 0.133_974_596_215_561_35;

/// Maps the observed in-segment fraction onto π: the hexagon plus six
/// segments, each segment being `fraction` of its box.
pub fn pi_from_fraction(fraction: f64) -> f64 {
    HEXAGON_AREA + fraction * 6.0 * SEGMENT_BOX_AREA
}

/// Result of reducing one run's counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    /// Points that fell inside the circle.
    pub hits: u64,
    /// Points drawn.
    pub total_samples: u64,
    /// `hits / total_samples`.
    pub fraction: f64,
    /// Estimated value of π.
    pub pi: f64,
}

impl Estimate {
    /// Distance from `std::f64::consts::PI`.
    pub fn abs_error(&self) -> f64 {
        (self.pi - std::f64::consts::PI).abs()
    }
}

/// Rejects a partition that would execute no samples. Callers run this
/// before dispatching; [`reduce`] runs it again before dividing.
pub fn check_partition(partition: &Partition) -> Result<()> {
    if partition.total_samples() == 0 {
        return Err(Error::config(format!(
            "no samples executed ({} workers x {} trials); raise the sample budget",
            partition.worker_count(),
            partition.trials_per_worker()
        )));
    }
    Ok(())
}

/// Folds the partial counts of one dispatch.
pub fn reduce(counts: &[u32], partition: &Partition) -> Result<Estimate> {
    check_partition(partition)?;
    let total_samples = partition.total_samples();

    if counts.len() != partition.worker_count() as usize {
        return Err(Error::gpu(
            "reduce",
            format!(
                "expected {} partial counts, got {}",
                partition.worker_count(),
                counts.len()
            ),
        ));
    }

    let hits: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    if hits > total_samples {
        return Err(Error::gpu(
            "reduce",
            format!("{} hits out of {} samples", hits, total_samples),
        ));
    }

    let fraction = hits as f64 / total_samples as f64;

    Ok(Estimate {
        hits,
        total_samples,
        fraction,
        pi: pi_from_fraction(fraction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        let root3 = 3f64.sqrt();
        assert!((HEXAGON_AREA - 3.0 * root3 / 2.0).abs() < 1e-15);
        assert!((SEGMENT_BOX_AREA - (1.0 - root3 / 2.0)).abs() < 1e-15);
    }

    #[test]
    fn test_all_zero_counts() {
        let p = Partition::new(1_000, 10).unwrap();
        let e = reduce(&[0; 10], &p).unwrap();
        assert_eq!(e.fraction, 0.0);
        assert!((e.pi - 2.598).abs() < 1e-3);
    }

    #[test]
    fn test_all_hits() {
        let p = Partition::new(1_000, 10).unwrap();
        let e = reduce(&[100; 10], &p).unwrap();
        assert_eq!(e.fraction, 1.0);
        let root3 = 3f64.sqrt();
        assert!((e.pi - (3.0 * root3 / 2.0 + 6.0 - 3.0 * root3)).abs() < 1e-12);
        assert!((e.pi - 3.402).abs() < 1e-3);
    }

    #[test]
    fn test_exact_segment_fraction_gives_pi() {
        let fraction = (std::f64::consts::PI / 6.0 - 3f64.sqrt() / 4.0) / SEGMENT_BOX_AREA;
        assert!((pi_from_fraction(fraction) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_empty_run_is_config_error() {
        let p = Partition::new(3, 8).unwrap();
        let err = reduce(&[0; 8], &p).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_length_mismatch() {
        let p = Partition::new(1_000, 10).unwrap();
        assert!(reduce(&[1; 9], &p).is_err());
    }

    #[test]
    fn test_too_many_hits() {
        let p = Partition::new(100, 2).unwrap();
        assert!(reduce(&[50, 51], &p).is_err());
    }

    #[test]
    fn test_sum_does_not_overflow_u32() {
        let p = Partition::new(u64::from(u32::MAX) * 4, 4).unwrap();
        let e = reduce(&[u32::MAX; 4], &p).unwrap();
        assert_eq!(e.hits, u64::from(u32::MAX) * 4);
        assert_eq!(e.fraction, 1.0);
    }
}
