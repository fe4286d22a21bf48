//! SIEM backend registry.
//!
//! Maps user-facing SIEM names to sigma-cli backend ids and the pip package
//! that provides each backend. The table is compiled in and never changes.

use serde::Serialize;

/// A registered SIEM / XDR target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SiemBackend {
    /// User-facing platform id (lowercase).
    pub id: &'static str,
    /// sigma-cli backend id passed to `convert -t`.
    pub backend: &'static str,
    /// pip package that installs the backend.
    pub package: &'static str,
    /// Canonical platform id when this entry is an alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<&'static str>,
}

const fn entry(id: &'static str, backend: &'static str, package: &'static str) -> SiemBackend {
    SiemBackend {
        id,
        backend,
        package,
        alias_of: None,
    }
}

const fn alias(
    id: &'static str,
    of: &'static str,
    backend: &'static str,
    package: &'static str,
) -> SiemBackend {
    SiemBackend {
        id,
        backend,
        package,
        alias_of: Some(of),
    }
}

static SIEM_BACKENDS: &[SiemBackend] = &[
    entry("splunk", "splunk", "pysigma-backend-splunk"),
    entry("elasticsearch", "elasticsearch", "pysigma-backend-elasticsearch"),
    alias("elk", "elasticsearch", "elasticsearch", "pysigma-backend-elasticsearch"),
    entry("azure-sentinel", "kusto", "pysigma-backend-kusto"),
    alias("microsoft-sentinel", "azure-sentinel", "kusto", "pysigma-backend-kusto"),
    alias("kusto", "azure-sentinel", "kusto", "pysigma-backend-kusto"),
    entry("ibm-qradar", "qradar", "pysigma-backend-qradar"),
    alias("qradar", "ibm-qradar", "qradar", "pysigma-backend-qradar"),
    entry("ibm-qradar-aql", "ibm-qradar-aql", "pysigma-backend-qradar-aql"),
    entry("logpoint", "logpoint", "pysigma-backend-logpoint"),
    entry("sentinelone", "sentinelone", "pysigma-backend-sentinelone"),
    entry("crowdstrike", "crowdstrike", "pysigma-backend-crowdstrike"),
    entry("trellix-helix", "trellix_helix", "pysigma-backend-helix"),
    alias("helix", "trellix-helix", "trellix_helix", "pysigma-backend-helix"),
    entry("opensearch", "opensearch", "pysigma-backend-opensearch"),
    entry("rapid7-insightidr", "insightidr", "pysigma-backend-insightidr"),
    alias("insightidr", "rapid7-insightidr", "insightidr", "pysigma-backend-insightidr"),
    entry("cortex-xdr", "cortexxdr", "pysigma-backend-cortexxdr"),
    alias("cortexxdr", "cortex-xdr", "cortexxdr", "pysigma-backend-cortexxdr"),
    entry("carbon-black", "carbonblack", "pysigma-backend-carbonblack"),
    alias("carbonblack", "carbon-black", "carbonblack", "pysigma-backend-carbonblack"),
    entry("panther", "panther", "pysigma-backend-panther"),
    entry("datadog", "datadog", "pysigma-backend-datadog"),
    entry("loki", "loki", "pysigma-backend-loki"),
    alias("grafana-loki", "loki", "loki", "pysigma-backend-loki"),
    entry("netwitness", "netwitness", "pysigma-backend-netwitness"),
    // Wazuh indexer is Elastic-based.
    entry("wazuh", "elasticsearch", "pysigma-backend-elasticsearch"),
    // Lucene-style queries.
    entry("graylog", "elasticsearch", "pysigma-backend-elasticsearch"),
];

/// Display order for listings, interactive menus and `all` expansion.
static DISPLAY_ORDER: &[&str] = &[
    "splunk",
    "elasticsearch",
    "azure-sentinel",
    "ibm-qradar",
    "crowdstrike",
    "sentinelone",
    "logpoint",
    "trellix-helix",
    "opensearch",
    "rapid7-insightidr",
    "cortex-xdr",
    "carbon-black",
    "panther",
    "datadog",
    "loki",
    "netwitness",
    "wazuh",
    "graylog",
];

/// Platforms without a pySigma backend yet.
pub const COMING_SOON: &[&str] = &[
    "exabeam",
    "logrhythm",
    "securonix",
    "arcsight",
    "fortinet-fortisiem",
    "fortisiem",
];

/// Pseudo-platform that expands to the whole display order.
pub const ALL: &str = "all";

/// Pipeline used when none is given.
pub const DEFAULT_PIPELINE: &str = "sysmon";

/// Common sigma-cli processing pipelines with a one-line description.
pub const KNOWN_PIPELINES: &[(&str, &str)] = &[
    ("sysmon", "Map generic log sources to Sysmon events (default)"),
    ("windows", "Windows logsource to Channel / Windows audit events"),
];

/// Look up a platform id, ignoring case and surrounding whitespace.
pub fn lookup(id: &str) -> Option<&'static SiemBackend> {
    let id = id.trim();
    SIEM_BACKENDS.iter().find(|b| b.id.eq_ignore_ascii_case(id))
}

/// Canonical platform ids in display order.
pub fn canonical_order() -> &'static [&'static str] {
    DISPLAY_ORDER
}

/// Every registry entry, aliases included, in table order.
pub fn all_backends() -> &'static [SiemBackend] {
    SIEM_BACKENDS
}

/// Entries that are aliases of a canonical platform.
pub fn aliases() -> impl Iterator<Item = &'static SiemBackend> {
    SIEM_BACKENDS.iter().filter(|b| b.alias_of.is_some())
}

/// Registered, non-alias entries that are not part of the display order.
pub fn extra_targets() -> impl Iterator<Item = &'static SiemBackend> {
    SIEM_BACKENDS
        .iter()
        .filter(|b| b.alias_of.is_none() && !DISPLAY_ORDER.contains(&b.id))
}

/// Whether `id` names a platform that has no pySigma backend yet.
pub fn is_coming_soon(id: &str) -> bool {
    let id = id.trim();
    COMING_SOON.iter().any(|c| c.eq_ignore_ascii_case(id))
}

/// Resolve a requested platform list into the ids to convert.
///
/// Any `all` entry yields the full display order. Otherwise ids are
/// lowercased and deduplicated, keeping the first occurrence.
pub fn expand_selection<S: AsRef<str>>(requested: &[S]) -> Vec<String> {
    if requested
        .iter()
        .any(|s| s.as_ref().trim().eq_ignore_ascii_case(ALL))
    {
        return DISPLAY_ORDER.iter().map(|s| s.to_string()).collect();
    }

    let mut ids: Vec<String> = Vec::with_capacity(requested.len());
    for s in requested {
        let id = s.as_ref().trim().to_lowercase();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Closest registered id to a mistyped one, within edit distance 2.
pub fn suggest(unknown: &str) -> Option<&'static str> {
    let unknown = unknown.trim().to_lowercase();
    SIEM_BACKENDS
        .iter()
        .map(|b| (b.id, levenshtein::levenshtein(&unknown, b.id)))
        .filter(|&(_, d)| d > 0 && d <= 2)
        .min_by_key(|&(_, d)| d)
        .map(|(id, _)| id)
}

/// Message for a platform id missing from the registry.
pub fn unknown_siem_message(id: &str) -> String {
    let mut msg = format!("Unknown SIEM: {id}.");
    if is_coming_soon(id) {
        msg.push_str(" No pySigma backend exists for this platform yet.");
    } else if let Some(close) = suggest(id) {
        msg.push_str(&format!(" Did you mean '{close}'?"));
    }
    msg.push_str(" Use --list-siem to see supported platforms.");
    msg
}
