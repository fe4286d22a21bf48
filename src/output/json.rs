use crate::error::Result;
use crate::session::RunReport;

/// Render a run (conversions and errors) as pretty JSON.
pub fn render(report: &RunReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}
