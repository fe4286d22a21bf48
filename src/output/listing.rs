//! `--list-siem` and `--list-pipelines` output.

use serde::Serialize;

use super::OutputFormat;
use crate::error::Result;
use crate::registry::{self, SiemBackend};

#[derive(Serialize)]
struct SiemListing<'a> {
    platforms: Vec<&'a SiemBackend>,
    aliases: Vec<&'a SiemBackend>,
    other_targets: Vec<&'a SiemBackend>,
    coming_soon: &'a [&'a str],
}

/// Supported SIEM platforms with their backend ids.
pub fn render_siem_list(format: OutputFormat) -> Result<String> {
    let platforms: Vec<&SiemBackend> = registry::canonical_order()
        .iter()
        .filter_map(|id| registry::lookup(id))
        .collect();

    if format == OutputFormat::Json {
        let listing = SiemListing {
            platforms,
            aliases: registry::aliases().collect(),
            other_targets: registry::extra_targets().collect(),
            coming_soon: registry::COMING_SOON,
        };
        return Ok(serde_json::to_string_pretty(&listing)?);
    }

    let mut out = String::from("Supported SIEM / XDR platforms (use -s <id>):\n\n");
    for siem in &platforms {
        out.push_str(&format!("  {:<22} -> backend: {}\n", siem.id, siem.backend));
    }

    let aliases: Vec<String> = registry::aliases()
        .map(|a| format!("{} ({})", a.id, a.alias_of.unwrap_or(a.backend)))
        .collect();
    out.push_str(&format!("\nAliases: {}\n", aliases.join(", ")));
    out.push_str("         wazuh/graylog use the elasticsearch backend.\n");

    let extras: Vec<String> = registry::extra_targets()
        .map(|b| format!("{} (backend: {})", b.id, b.backend))
        .collect();
    if !extras.is_empty() {
        out.push_str(&format!("Also accepted: {}\n", extras.join(", ")));
    }

    out.push_str(&format!(
        "\nComing soon (no backend yet): {}\n",
        registry::COMING_SOON.join(", ")
    ));
    out.push_str("\nInstall backends: sigma plugin install <backend_id>\n");
    Ok(out)
}

/// Known processing pipelines.
pub fn render_pipelines() -> String {
    let mut out = String::from("Common Sigma processing pipelines (use -p <name>):\n\n");
    for (name, description) in registry::KNOWN_PIPELINES {
        out.push_str(&format!("  {:<10} - {}\n", name, description));
    }
    out.push_str("  (Others may be available via sigma-cli; run: sigma list pipelines)\n");
    out
}
