//! Run timing and report export.

pub mod export;
pub mod tracing;

pub use export::{ConsoleExporter, JsonExporter, ReportExporter};
pub use tracing::{Phase, PhaseGuard, PhaseTimer};
