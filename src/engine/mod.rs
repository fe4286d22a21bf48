//! Boundary to the external conversion engine (sigma-cli).
//!
//! The converter only needs "run `convert` with these arguments and hand back
//! exit code + stdout + stderr". Keeping that behind a trait lets the
//! classification and aggregation logic run against a scripted engine in tests.

pub mod sigma_cli;
pub mod tls;

#[cfg(test)]
pub(crate) mod testing;

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

pub use sigma_cli::SigmaCli;

/// Wall-clock limit for one engine run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Arguments for a single `convert` run.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// sigma-cli backend id (`-t`).
    pub backend: &'a str,
    /// Processing pipeline (`-p`).
    pub pipeline: &'a str,
    /// Rule file to convert.
    pub rule_path: &'a Path,
}

impl Invocation<'_> {
    /// Argument vector: `convert -t <backend> -p <pipeline> <rule_path>`.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "convert".into(),
            "-t".into(),
            self.backend.into(),
            "-p".into(),
            self.pipeline.into(),
            self.rule_path.as_os_str().to_os_string(),
        ]
    }
}

/// What the engine produced when it ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// Exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// The engine could not be run to completion.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("conversion engine not found: {0}")]
    NotFound(String),

    #[error("Conversion timed out after {} seconds.", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Runs the conversion engine.
pub trait Engine {
    fn run(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn run(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, EngineError> {
        (**self).run(invocation)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn run(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, EngineError> {
        (**self).run(invocation)
    }
}
