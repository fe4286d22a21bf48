use once_cell::sync::Lazy;
use regex::Regex;

use super::{ConversionFailure, FailureKind};
use crate::registry::SiemBackend;

/// Engine errors that mean the target backend plugin is missing.
static MISSING_BACKEND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Unknown target|(?i:backend)").unwrap());

/// Python could not import sigma-cli.
static MISSING_ENGINE_MODULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"No module named '?sigma'?").unwrap());

/// Turn a completed engine run into a conversion result.
///
/// Exit code 0 is success: trimmed stdout, or `(no output)` when empty.
/// Anything else is a failure carrying stderr, then stdout, then a generic
/// exit-code message, with install hints appended when the text shows the
/// backend or the engine itself is missing.
pub fn classify(
    exit_code: i32,
    stdout: &str,
    stderr: &str,
    siem: &SiemBackend,
) -> Result<String, ConversionFailure> {
    let out = stdout.trim();
    let err = stderr.trim();

    if exit_code == 0 {
        return Ok(if out.is_empty() {
            "(no output)".to_string()
        } else {
            out.to_string()
        });
    }

    let mut message = if !err.is_empty() {
        err.to_string()
    } else if !out.is_empty() {
        out.to_string()
    } else {
        format!("sigma convert exited with code {exit_code}")
    };

    if MISSING_ENGINE_MODULE.is_match(&message) {
        return Err(ConversionFailure::engine_not_found(siem));
    }

    if MISSING_BACKEND.is_match(&message) {
        message.push_str(&install_hint(siem));
    }

    Err(ConversionFailure::new(FailureKind::EngineFailed, message))
}

/// Remediation appended to backend-related failures.
pub fn install_hint(siem: &SiemBackend) -> String {
    format!(
        "\n\nInstall the backend: sigma plugin install {}\nOr: pip install {}",
        siem.backend, siem.package
    )
}
