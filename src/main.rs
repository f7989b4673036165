use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gpu_pi::config::{Backend, Config, PowerPreference, DEFAULT_ENTRY_POINT, DEFAULT_KERNEL_PATH, DEFAULT_SAMPLE_BUDGET};
use gpu_pi::telemetry::{ConsoleExporter, JsonExporter, ReportExporter};

/// Estimate pi by Monte-Carlo sampling on a GPU.
#[derive(Debug, Parser)]
#[command(name = "gpu-pi", version, about)]
struct Args {
    /// Total number of samples to request; truncated to a multiple of the worker count
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_BUDGET)]
    samples: u64,

    /// Where to run the sampler
    #[arg(short, long, value_enum, default_value_t = Backend::default())]
    backend: Backend,

    /// WGSL source of the sampler kernel
    #[arg(short, long, default_value = DEFAULT_KERNEL_PATH)]
    kernel: PathBuf,

    /// Kernel entry point
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    entry_point: String,

    /// Number of workers; defaults to what the device reports
    #[arg(short, long)]
    workers: Option<u32>,

    /// Run seed mixed into every worker's generator
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Adapter power preference
    #[arg(long, value_enum, default_value_t = PowerPreference::High)]
    power: PowerPreference,

    /// Accept CPU or unclassified adapters
    #[arg(long)]
    allow_non_gpu: bool,

    /// Threads for the host backend
    #[arg(long)]
    threads: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the JSON report to this file as well
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print partitioning details and the absolute error
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> gpu_pi::Result<Config> {
        let mut builder = Config::builder()
            .sample_budget(self.samples)
            .backend(self.backend)
            .kernel_path(&self.kernel)
            .entry_point(&self.entry_point)
            .seed(self.seed)
            .power_preference(self.power)
            .allow_non_gpu(self.allow_non_gpu);

        if let Some(n) = self.workers {
            builder = builder.workers(n);
        }
        if let Some(n) = self.threads {
            builder = builder.host_threads(n);
        }

        builder.build()
    }
}

fn run(args: &Args) -> gpu_pi::Result<()> {
    let config = args.config()?;
    let report = gpu_pi::run_blocking(&config)?;

    if args.json {
        JsonExporter::stdout().export(&report)?;
    } else {
        ConsoleExporter::new(args.verbose).export(&report)?;
    }

    if let Some(path) = &args.report {
        JsonExporter::to_file(path).export(&report)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {} (exit code {})", e, e.exit_code());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
