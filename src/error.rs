//! Error type shared by every stage of a run.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a run can report. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid settings or partition.
    #[error("config error: {0}")]
    Config(String),

    /// The kernel source file could not be read.
    #[error("could not read kernel source file \"{}\": {source}", path.display())]
    KernelSource {
        /// File that was requested.
        path: PathBuf,
        /// Underlying read failure.
        #[source]
        source: std::io::Error,
    },

    /// No adapter of any backend was found.
    #[error("no compute platform available")]
    NoPlatform,

    /// The only adapter found is not a GPU.
    #[error("no GPU device available on platform \"{platform}\" (found {found})")]
    NoDevice {
        /// Backend the adapter belongs to.
        platform: String,
        /// Description of the adapter that was rejected.
        found: String,
    },

    /// Shader or pipeline creation failed.
    #[error("building kernel \"{entry_point}\" failed:\n{log}")]
    Build {
        /// Entry point being built.
        entry_point: String,
        /// Full validation diagnostic.
        log: String,
    },

    /// A device operation failed.
    #[error("{op} failed: {message}")]
    Gpu {
        /// Name of the failing operation.
        op: &'static str,
        /// What the device reported.
        message: String,
    },

    /// A device or host allocation could not be satisfied.
    #[error("out of memory: {what} ({bytes} bytes)")]
    OutOfMemory {
        /// Buffer being allocated.
        what: &'static str,
        /// Requested size.
        bytes: u64,
    },

    /// Report output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Configuration-class error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Runtime error naming the failing operation.
    pub fn gpu<S: Into<String>>(op: &'static str, msg: S) -> Self {
        Error::Gpu {
            op,
            message: msg.into(),
        }
    }

    /// Allocation failure of `bytes` for `what`.
    pub fn out_of_memory(what: &'static str, bytes: u64) -> Self {
        Error::OutOfMemory { what, bytes }
    }

    /// Process exit code for this error class. Every class is fatal, so
    /// every code is non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::KernelSource { .. } => 2,
            Error::NoPlatform | Error::NoDevice { .. } => 2,
            Error::Build { .. } => 3,
            Error::Gpu { .. } => 4,
            Error::OutOfMemory { .. } => 5,
            Error::Io(_) | Error::Json(_) => 6,
        }
    }

    /// Whether this error is in the configuration class (bad input or an
    /// unusable environment, detected before any computation).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::KernelSource { .. } | Error::NoPlatform | Error::NoDevice { .. }
        )
    }
}
