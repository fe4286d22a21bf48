//! SigmaForge: convert Sigma detection rules into native SIEM/XDR queries.
//!
//! The rule language itself is handled by sigma-cli, run as a subprocess
//! once per target. This crate maps SIEM names to sigma-cli backends, runs
//! the conversions, classifies engine failures (with install hints) and
//! aggregates the queries.
//!
//! # Quick Start
//!
//! ```no_run
//! use sigmaforge::convert::Converter;
//! use sigmaforge::engine::SigmaCli;
//! use sigmaforge::session::RunOptions;
//!
//! let rule = std::fs::read_to_string("rule.yml").unwrap();
//! let converter = Converter::new(SigmaCli::discover());
//! let report = sigmaforge::convert_rule(&converter, &rule, &["splunk", "elk"], &RunOptions::default());
//! println!("{} converted, {} failed", report.blocks.len(), report.errors.len());
//! ```

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod interactive;
pub mod output;
pub mod registry;
pub mod session;
pub mod validate;

use convert::Converter;
use engine::Engine;
use error::Result;
use output::OutputFormat;
use session::{RunOptions, RunReport};

/// Convert a rule for the requested SIEMs. `all` expands to every
/// supported platform.
pub fn convert_rule<E: Engine, S: AsRef<str>>(
    converter: &Converter<E>,
    rule_text: &str,
    siems: &[S],
    options: &RunOptions<'_>,
) -> RunReport {
    let ids = registry::expand_selection(siems);
    session::run(converter, rule_text, &ids, options)
}

/// Render a run report in the specified format.
pub fn render_report(report: &RunReport, format: OutputFormat, headers: bool) -> Result<String> {
    output::render(report, format, headers)
}
