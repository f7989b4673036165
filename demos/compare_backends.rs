//! Runs the same estimate on the GPU and on host threads and compares them

#[cfg(feature = "gpu")]
use gpu_pi::prelude::*;

#[cfg(feature = "gpu")]
fn run_on(backend: Backend, samples: u64) -> gpu_pi::Result<RunReport> {
    let config = Config::builder()
        .backend(backend)
        .sample_budget(samples)
        .workers(256)
        .allow_non_gpu(true)
        .build()?;

    run_blocking(&config)
}

#[cfg(feature = "gpu")]
fn main() -> gpu_pi::Result<()> {
    env_logger::init();

    let samples = 50_000_000;
    println!("=== {} samples, 256 workers ===\n", samples);

    let host = run_on(Backend::Host, samples)?;
    println!("host: pi = {:.6} in {:.3}s", host.estimate.pi, host.elapsed.as_secs_f64());

    match run_on(Backend::Gpu, samples) {
        Ok(gpu) => {
            println!(
                "gpu:  pi = {:.6} in {:.3}s on {} ({})",
                gpu.estimate.pi,
                gpu.elapsed.as_secs_f64(),
                gpu.device,
                gpu.platform
            );
            println!(
                "\nhits differ by {} of {}",
                gpu.estimate.hits.abs_diff(host.estimate.hits),
                host.estimate.total_samples
            );
        }
        Err(e) => {
            eprintln!("GPU run failed: {}", e);
            eprintln!("This may be expected if no GPU is available.");
        }
    }

    Ok(())
}

#[cfg(not(feature = "gpu"))]
fn main() {
    println!("This demo requires the 'gpu' feature.");
    println!("Run with: cargo run --example compare_backends --features gpu");
}
