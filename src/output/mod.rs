pub mod json;
pub mod listing;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::RunReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render the successful conversions of a run.
pub fn render(report: &RunReport, format: OutputFormat, headers: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render(&report.blocks, headers)),
        OutputFormat::Json => json::render(report),
    }
}
