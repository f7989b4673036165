//! gpu-pi - Monte-Carlo estimation of π on a GPU
//!
//! Every worker of a single compute dispatch samples points in the box around
//! one circular segment of the regular hexagon inscribed in the unit circle
//! and counts the hits. The host sums the per-worker counts and turns the hit
//! fraction into an estimate:
//!
//! ```text
//! π ≈ 3√3/2 + fraction · 6 · (1 − √3/2)
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use gpu_pi::prelude::*;
//!
//! let config = Config::builder()
//!     .sample_budget(100_000_000)
//!     .build()
//!     .unwrap();
//!
//! let report = gpu_pi::run_blocking(&config).unwrap();
//! println!("pi ≈ {}", report.estimate.pi);
//! ```
//!
//! # Features
//!
//! - **gpu** (default): the wgpu compute backend. Without it only the host
//!   backend, which runs the same sampler on CPU threads, is available.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod kernel_source;
pub mod partition;
pub mod prelude;
pub mod reducer;
pub mod runtime;
pub mod sampler;
pub mod telemetry;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use config::{Backend, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use partition::{Partition, WorkerCapability};
pub use reducer::{reduce, Estimate};
pub use runtime::{run, run_blocking, RunReport};
