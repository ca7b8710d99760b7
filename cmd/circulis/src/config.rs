//! Run configuration.
//!
//! Values come from three layers: built-in defaults, an optional YAML file
//! passed with `-f`, and command line flags. Later layers win.
//!
//! ```yaml
//! bench:
//!   capacity: 4096
//!   chunk: 512
//!   total: 16777216
//!   producers: 4
//!   consumers: 4
//!   mode: blocking
//!   retry_us: 1
//! pipe:
//!   capacity: 65536
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Deserialize;

/// Whether callers wait or fail fast on a full/empty buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Blocking,
    #[default]
    Nonblocking,
}

impl Mode {
    pub fn is_blocking(self) -> bool {
        self == Mode::Blocking
    }
}

/// Top-level YAML document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub bench: BenchConfig,
    pub pipe: PipeConfig,
}

/// Settings for `circulis bench`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Requested buffer capacity in bytes (rounded up to a power of two).
    pub capacity: usize,
    /// Bytes per write call.
    pub chunk: usize,
    /// Bytes each producer sends.
    pub total: usize,
    pub producers: usize,
    pub consumers: usize,
    pub mode: Mode,
    /// Sleep between non-blocking retries, in microseconds.
    pub retry_us: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            capacity: 1024,
            chunk: 512,
            total: 16 << 20,
            producers: 1,
            consumers: 1,
            mode: Mode::Nonblocking,
            retry_us: 1,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            bail!("capacity must be greater than 0");
        }
        if self.chunk == 0 {
            bail!("chunk must be greater than 0");
        }
        if self.producers == 0 || self.consumers == 0 {
            bail!("need at least one producer and one consumer");
        }
        Ok(())
    }
}

/// Settings for `circulis pipe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    pub capacity: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        PipeConfig { capacity: 64 << 10 }
    }
}

impl RunConfig {
    /// Loads the YAML file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(RunConfig::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(RunConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_missing() {
        let config = RunConfig::load(None).unwrap();
        assert_eq!(config.bench, BenchConfig::default());
        assert_eq!(config.pipe.capacity, 65536);

        let config = RunConfig::parse("").unwrap();
        assert_eq!(config.bench.mode, Mode::Nonblocking);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RunConfig::parse("bench:\n  producers: 4\n  mode: blocking\n").unwrap();
        assert_eq!(config.bench.producers, 4);
        assert_eq!(config.bench.mode, Mode::Blocking);
        assert_eq!(config.bench.capacity, 1024);
        assert_eq!(config.pipe, PipeConfig::default());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(RunConfig::parse("bench:\n  mode: sometimes\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pipe:\n  capacity: 100").unwrap();

        let config = RunConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.pipe.capacity, 100);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunConfig::load(Some(Path::new("/nonexistent/circulis.yaml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_validate() {
        assert!(BenchConfig::default().validate().is_ok());

        let config = BenchConfig {
            producers: 0,
            ..BenchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = BenchConfig {
            chunk: 0,
            ..BenchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
