use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::SigmaCli;
use crate::error::{ForgeError, Result};
use crate::output::OutputFormat;
use crate::registry::DEFAULT_PIPELINE;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".sigmaforge.toml";

/// Top-level configuration from `.sigmaforge.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Defaults for flags not given on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_pipeline")]
    pub pipeline: String,
    #[serde(default)]
    pub no_header: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            pipeline: default_pipeline(),
            no_header: false,
            format: OutputFormat::Text,
        }
    }
}

/// How to run sigma-cli.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Explicit command line, e.g. `["python3", "-m", "sigma"]`.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// CA bundle for the engine's HTTPS fetches.
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: default_timeout_secs(),
            ca_bundle: None,
        }
    }
}

fn default_pipeline() -> String {
    DEFAULT_PIPELINE.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the engine. `command_override` (from `--engine` or
    /// `SIGMAFORGE_ENGINE`) wins over the configured command; with neither,
    /// sigma-cli is discovered on `PATH`.
    pub fn build(&self, command_override: Option<&str>) -> Result<SigmaCli> {
        let engine = match (command_override, &self.command) {
            (Some(cmd), _) => {
                let argv: Vec<&str> = cmd.split_whitespace().collect();
                SigmaCli::from_command(&argv)?
            }
            (None, Some(argv)) => SigmaCli::from_command(argv)?,
            (None, None) => SigmaCli::discover(),
        };
        Ok(engine
            .with_timeout(self.timeout())
            .with_ca_bundle(self.ca_bundle.clone()))
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.engine.timeout_secs == 0 {
            return Err(ForgeError::Config("engine.timeout_secs must be positive".into()));
        }
        if self.defaults.pipeline.trim().is_empty() {
            return Err(ForgeError::Config("defaults.pipeline must not be empty".into()));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r##"# SigmaForge configuration

[defaults]
# Processing pipeline used when -p is not given.
pipeline = "sysmon"

# Omit "# --- SIEM ---" headers above each query.
no_header = false

# Output format (text, json).
format = "text"

[engine]
# sigma-cli command line. Discovered on PATH when unset.
# command = ["python3", "-m", "sigma"]

# Seconds before a conversion is abandoned.
timeout_secs = 60

# CA bundle for HTTPS fetches made by sigma-cli.
# ca_bundle = "/etc/ssl/certs/ca-certificates.crt"
"##
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("/no/such/.sigmaforge.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.defaults.pipeline, "sysmon");
        assert_eq!(config.engine.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn starter_matches_defaults() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn starter_keeps_header_comment() {
        let starter = Config::starter_toml();
        assert!(starter.contains(r##"# Omit "# --- SIEM ---" headers above each query."##));
        assert!(starter.trim_end().ends_with("ca-certificates.crt\""));
        assert!(toml::from_str::<Config>(starter).is_ok());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "[engine]\ncommand = [\"python3\", \"-m\", \"sigma\"]\ntimeout_secs = 5\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.defaults, Defaults::default());
        assert_eq!(config.engine.timeout_secs, 5);
        assert_eq!(
            config.engine.command.as_deref(),
            Some(&["python3".to_string(), "-m".to_string(), "sigma".to_string()][..])
        );
    }

    #[test]
    fn json_default_format() {
        let config: Config = toml::from_str("[defaults]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.defaults.format, OutputFormat::Json);
    }

    #[test]
    fn zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[engine]\ntimeout_secs = 0\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[engine\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ForgeError::Toml(_))));
    }

    #[test]
    fn override_beats_configured_command() {
        let config = EngineConfig {
            command: Some(vec!["configured-sigma".into()]),
            ..EngineConfig::default()
        };
        let engine = config.build(Some("/opt/sigma/bin/sigma")).unwrap();
        assert_eq!(engine.program(), Path::new("/opt/sigma/bin/sigma"));

        let engine = config.build(None).unwrap();
        assert_eq!(engine.program(), Path::new("configured-sigma"));
    }

    #[test]
    fn override_is_split_on_whitespace() {
        let engine = EngineConfig::default()
            .build(Some("python3  -m sigma"))
            .unwrap();
        assert_eq!(engine.program(), Path::new("python3"));

        let inv = crate::engine::Invocation {
            backend: "splunk",
            pipeline: "sysmon",
            rule_path: Path::new("r.yml"),
        };
        let argv: Vec<String> = engine
            .command_line(&inv)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(argv[..3], ["python3", "-m", "sigma"]);
    }

    #[test]
    fn empty_override_rejected() {
        assert!(EngineConfig::default().build(Some("   ")).is_err());
    }
}
