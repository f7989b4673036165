//! Device tests. Each one returns early when no adapter is available, so
//! they pass on machines without a GPU.

#![cfg(feature = "gpu")]

use gpu_pi::gpu::{ComputeSession, CountBuffers, GpuOptions, SamplerKernel};
use gpu_pi::prelude::*;
use gpu_pi::sampler::count_points;

async fn session() -> Option<ComputeSession> {
    ComputeSession::new(GpuOptions {
        allow_non_gpu: true,
        ..Default::default()
    })
    .await
    .ok()
}

async fn device_counts(session: &ComputeSession, partition: &Partition, seed: u32) -> Vec<u32> {
    let kernel = SamplerKernel::compile(session, &KernelSource::builtin(), "count_points")
        .await
        .unwrap();
    let buffers = CountBuffers::allocate(session, partition, seed).await.unwrap();
    kernel.dispatch(session, &buffers).await.unwrap();
    buffers.read_counts(session).await.unwrap()
}

#[tokio::test]
async fn test_device_counts_track_host_reference() {
    let Some(session) = session().await else {
        return;
    };

    let partition = Partition::new(100 * 4_096, 100).unwrap();
    let counts = device_counts(&session, &partition, 5).await;
    assert_eq!(counts.len(), 100);

    // Integer streams are identical; only points within rounding distance of
    // the circle may be classified differently.
    for (i, &c) in counts.iter().enumerate() {
        let host = count_points(i as u32, partition.trials_per_worker(), 5);
        assert!(c.abs_diff(host) <= 2, "worker {}: device {} host {}", i, c, host);
    }
}

#[tokio::test]
async fn test_device_run_is_reproducible() {
    let Some(session) = session().await else {
        return;
    };

    let partition = Partition::new(64 * 1_000, 64).unwrap();
    let a = device_counts(&session, &partition, 1).await;
    let b = device_counts(&session, &partition, 1).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_device_estimate_converges() {
    let Some(session) = session().await else {
        return;
    };

    let partition = Partition::from_capability(10_000_000, session.worker_capability(), None).unwrap();
    let counts = device_counts(&session, &partition, 0).await;
    let estimate = reduce(&counts, &partition).unwrap();

    assert!(estimate.abs_error() < 0.01, "pi = {}", estimate.pi);
}

#[tokio::test]
async fn test_worker_count_not_multiple_of_workgroup() {
    let Some(session) = session().await else {
        return;
    };

    // 70 workers span two workgroups; the tail invocations must not write.
    let partition = Partition::new(70 * 100, 70).unwrap();
    let counts = device_counts(&session, &partition, 9).await;
    assert_eq!(counts.len(), 70);
    assert!(counts.iter().all(|&c| c <= 100));
}
