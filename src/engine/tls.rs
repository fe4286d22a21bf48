//! CA trust-anchor environment for the engine subprocess.
//!
//! sigma-cli may fetch remote data (e.g. the MITRE ATT&CK catalogue) over
//! HTTPS. Python's `ssl` and `requests` read their CA bundle from
//! `SSL_CERT_FILE` and `REQUESTS_CA_BUNDLE`; both are pointed at a known
//! bundle unless the parent environment already sets them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variables that carry the CA bundle path.
pub const CA_ENV_VARS: [&str; 2] = ["SSL_CERT_FILE", "REQUESTS_CA_BUNDLE"];

/// Well-known system CA bundle locations, most common first.
const SYSTEM_BUNDLES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/tls/cacert.pem",
    "/etc/ssl/cert.pem",
    "/usr/local/etc/openssl/cert.pem",
    "/opt/homebrew/etc/openssl@3/cert.pem",
];

/// First existing system CA bundle.
pub fn find_system_bundle() -> Option<PathBuf> {
    SYSTEM_BUNDLES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

/// Variables to add to the engine environment.
///
/// `parent` reports the current value of a variable in the parent
/// environment. Variables already present are never overridden. The bundle
/// is `bundle` if given, else whichever of the two variables the parent
/// already sets.
pub fn engine_env<F>(parent: F, bundle: Option<&Path>) -> Vec<(&'static str, OsString)>
where
    F: Fn(&str) -> Option<OsString>,
{
    let bundle = bundle
        .map(|p| p.as_os_str().to_os_string())
        .or_else(|| CA_ENV_VARS.iter().find_map(|var| parent(var)));

    let Some(bundle) = bundle else {
        tracing::debug!("no CA bundle found, engine inherits default trust store");
        return Vec::new();
    };

    CA_ENV_VARS
        .iter()
        .filter(|var| parent(var).is_none())
        .map(|&var| (var, bundle.clone()))
        .collect()
}
