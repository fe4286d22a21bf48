//! Conversion of one Sigma rule to one SIEM query.

pub mod classify;

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::engine::{Engine, EngineError, Invocation};
use crate::registry::{self, SiemBackend, DEFAULT_PIPELINE};

pub use classify::classify;

/// Input for a single conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    /// Full YAML text of the Sigma rule.
    pub rule_text: &'a str,
    /// SIEM id, matched case-insensitively against the registry.
    pub siem: &'a str,
    pub pipeline: &'a str,
    /// Existing rule file. When absent the text goes to a temp file.
    pub rule_path: Option<&'a Path>,
}

impl<'a> ConversionRequest<'a> {
    pub fn new(rule_text: &'a str, siem: &'a str) -> Self {
        Self {
            rule_text,
            siem,
            pipeline: DEFAULT_PIPELINE,
            rule_path: None,
        }
    }

    pub fn pipeline(mut self, pipeline: &'a str) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn rule_path(mut self, path: Option<&'a Path>) -> Self {
        self.rule_path = path;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownSiem,
    EngineNotFound,
    Timeout,
    EngineFailed,
    Invocation,
}

/// Why a conversion produced no query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ConversionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_siem(id: &str) -> Self {
        Self::new(FailureKind::UnknownSiem, registry::unknown_siem_message(id))
    }

    pub fn engine_not_found(siem: &SiemBackend) -> Self {
        Self::new(
            FailureKind::EngineNotFound,
            format!(
                "sigma-cli not found. Install it with: pip install sigma-cli\n\
                 Then install backends: sigma plugin install {}",
                siem.backend
            ),
        )
    }
}

impl std::fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Rule file handed to the engine. A temp file is deleted when dropped.
enum RuleFile<'a> {
    Existing(&'a Path),
    Temp(NamedTempFile),
}

impl<'a> RuleFile<'a> {
    fn prepare(rule_text: &str, path: Option<&'a Path>) -> std::io::Result<Self> {
        if let Some(path) = path {
            return Ok(Self::Existing(path));
        }
        let mut file = tempfile::Builder::new()
            .prefix("sigma_")
            .suffix(".yml")
            .tempfile()?;
        file.write_all(rule_text.as_bytes())?;
        file.flush()?;
        Ok(Self::Temp(file))
    }

    fn path(&self) -> &Path {
        match self {
            Self::Existing(path) => path,
            Self::Temp(file) => file.path(),
        }
    }
}

/// Converts rules by driving an [`Engine`].
pub struct Converter<E> {
    engine: E,
}

impl<E: Engine> Converter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Convert one rule for one SIEM.
    ///
    /// Unknown SIEM ids fail before any file is written or engine started.
    /// A temp rule file created here is removed before returning, whatever
    /// the outcome.
    pub fn convert(&self, request: &ConversionRequest<'_>) -> Result<String, ConversionFailure> {
        let Some(siem) = registry::lookup(request.siem) else {
            return Err(ConversionFailure::unknown_siem(request.siem));
        };

        let rule_file = RuleFile::prepare(request.rule_text, request.rule_path).map_err(|e| {
            ConversionFailure::new(
                FailureKind::Invocation,
                format!("Failed to write temp rule file: {e}"),
            )
        })?;

        let invocation = Invocation {
            backend: siem.backend,
            pipeline: request.pipeline,
            rule_path: rule_file.path(),
        };

        let result = match self.engine.run(&invocation) {
            Ok(output) => classify(output.exit_code, &output.stdout, &output.stderr, siem),
            Err(EngineError::NotFound(program)) => {
                debug!(program = %program, "engine executable not found");
                Err(ConversionFailure::engine_not_found(siem))
            }
            Err(e @ EngineError::Timeout(_)) => {
                Err(ConversionFailure::new(FailureKind::Timeout, e.to_string()))
            }
            Err(EngineError::Io(e)) => {
                Err(ConversionFailure::new(FailureKind::Invocation, e.to_string()))
            }
        };

        match &result {
            Ok(_) => info!(siem = siem.id, backend = siem.backend, "converted"),
            Err(f) => debug!(siem = siem.id, kind = ?f.kind, "conversion failed"),
        }
        result
    }
}
