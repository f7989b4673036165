//! Report export to the console or a JSON file.

use crate::error::Result;
use crate::runtime::RunReport;
use std::io::Write;

/// Trait for writing a run report somewhere
pub trait ReportExporter {
    /// Writes `report`.
    fn export(&self, report: &RunReport) -> Result<()>;
}

/// Human-readable report on stdout
#[derive(Debug, Default)]
pub struct ConsoleExporter {
    verbose: bool,
}

impl ConsoleExporter {
    /// `verbose` adds partition and error lines.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Writes the report lines to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W, report: &RunReport) -> Result<()> {
        writeln!(out, "Using platform: {}.", report.platform)?;
        writeln!(out, "Using device: {}.", report.device)?;

        if self.verbose {
            writeln!(
                out,
                "Workers: {} x {} trials = {} samples ({} requested).",
                report.partition.worker_count(),
                report.partition.trials_per_worker(),
                report.partition.total_samples(),
                report.partition.requested()
            )?;
            writeln!(
                out,
                "Hits: {} (fraction {:.6}).",
                report.estimate.hits, report.estimate.fraction
            )?;
        }

        writeln!(
            out,
            "Computation and reading of buffer finished in {:.6}s.",
            report.elapsed.as_secs_f64()
        )?;
        writeln!(out, "pi approximation:\t{:.6}", report.estimate.pi)?;
        writeln!(out, "pi:\t\t\t{:.6}", report.reference)?;

        if self.verbose {
            writeln!(out, "error:\t\t\t{:.6}", report.abs_error)?;
        }

        Ok(())
    }
}

impl ReportExporter for ConsoleExporter {
    fn export(&self, report: &RunReport) -> Result<()> {
        let stdout = std::io::stdout();
        self.write_to(&mut stdout.lock(), report)
    }
}

/// Pretty-printed JSON on stdout, or in a file when a path is given
#[derive(Debug, Default)]
pub struct JsonExporter {
    output_path: Option<std::path::PathBuf>,
}

impl JsonExporter {
    /// Exporter printing to stdout.
    pub fn stdout() -> Self {
        Self { output_path: None }
    }

    /// Exporter writing to `output_path`.
    pub fn to_file(output_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            output_path: Some(output_path.into()),
        }
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &RunReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;

        match &self.output_path {
            Some(path) => std::fs::write(path, json)?,
            None => println!("{}", json),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use crate::partition::Partition;
    use crate::reducer;
    use std::time::Duration;

    fn dummy_report() -> RunReport {
        let partition = Partition::new(1_000, 10).unwrap();
        let estimate = reducer::reduce(&[68; 10], &partition).unwrap();

        RunReport {
            backend: Backend::Host,
            platform: "host".into(),
            device: "4 threads".into(),
            partition,
            estimate,
            reference: std::f64::consts::PI,
            abs_error: estimate.abs_error(),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_console_lines() {
        let mut out = Vec::new();
        ConsoleExporter::new(false).write_to(&mut out, &dummy_report()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Using platform: host."));
        assert!(text.contains("Using device: 4 threads."));
        assert!(text.contains("finished in 1.500000s"));
        assert!(text.contains("pi approximation:\t"));
        assert!(text.contains("pi:\t\t\t3.141593"));
        assert!(!text.contains("Hits:"));
    }

    #[test]
    fn test_console_verbose() {
        let mut out = Vec::new();
        ConsoleExporter::new(true).write_to(&mut out, &dummy_report()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Workers: 10 x 100 trials = 1000 samples"));
        assert!(text.contains("Hits: 680"));
    }

    #[test]
    fn test_json_exporter() {
        let path = std::env::temp_dir().join(format!("gpu_pi_report_{}.json", std::process::id()));
        let exporter = JsonExporter::to_file(&path);

        assert!(exporter.export(&dummy_report()).is_ok());
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["estimate"]["hits"], 680);
        assert_eq!(json["elapsed"], 1.5);

        let _ = std::fs::remove_file(&path);
    }
}
