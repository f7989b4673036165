//! Kernel source text.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const BUILTIN: &str = include_str!("../kernels/count_points.wgsl");

/// WGSL text of the sampler kernel, loaded once per run.
#[derive(Debug, Clone)]
pub struct KernelSource {
    origin: Option<PathBuf>,
    text: String,
}

impl KernelSource {
    /// Reads the kernel from `path`. A missing or unreadable file fails the
    /// run before anything else is attempted.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::KernelSource {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("loaded kernel source {} ({} bytes)", path.display(), text.len());

        Ok(Self {
            origin: Some(path.to_path_buf()),
            text,
        })
    }

    /// The kernel shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            origin: None,
            text: BUILTIN.to_string(),
        }
    }

    /// WGSL text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the source came from; `None` for the built-in kernel.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}
