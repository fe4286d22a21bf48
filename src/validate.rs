//! Backend check: convert one rule for every SIEM and tabulate the results.
//!
//! Useful after `sigma plugin install ...` to see which targets produce a
//! query on this machine.

use std::path::Path;

use serde::Serialize;

use crate::convert::{ConversionRequest, Converter};
use crate::engine::Engine;
use crate::registry;

const SNIPPET_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRow {
    pub siem: String,
    pub passed: bool,
    /// Start of the query on success, first error line on failure.
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub rule: String,
    pub pipeline: String,
    pub rows: Vec<ValidationRow>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.rows.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.passed()
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed() == 0 {
            0
        } else {
            1
        }
    }

    /// Status table with summary.
    pub fn render(&self) -> String {
        let rule_line = "-".repeat(100);
        let mut out = format!("Rule: {}\nPipeline: {}\n\n", self.rule, self.pipeline);
        out.push_str(&format!(
            "{:<22} {:<6} Output (first {SNIPPET_LEN} chars)\n",
            "SIEM", "Status"
        ));
        out.push_str(&rule_line);
        out.push('\n');
        for row in &self.rows {
            let status = if row.passed { "OK" } else { "FAIL" };
            out.push_str(&format!("{:<22} {:<6} {}\n", row.siem, status, row.snippet));
        }
        out.push_str(&rule_line);
        out.push('\n');
        out.push_str(&format!(
            "Passed: {}  Failed: {}\n",
            self.passed(),
            self.failed()
        ));
        if self.failed() > 0 {
            out.push_str(
                "\nInstall missing backends: sigma plugin install <backend>  \
                 (e.g. splunk, elasticsearch, kusto)\n",
            );
        }
        out
    }
}

/// Convert the rule for every SIEM in display order.
pub fn validate<E: Engine>(
    converter: &Converter<E>,
    rule_text: &str,
    rule_path: Option<&Path>,
    pipeline: &str,
) -> ValidationReport {
    let rows = registry::canonical_order()
        .iter()
        .map(|&siem| {
            let request = ConversionRequest::new(rule_text, siem)
                .pipeline(pipeline)
                .rule_path(rule_path);
            match converter.convert(&request) {
                Ok(query) => ValidationRow {
                    siem: siem.to_string(),
                    passed: true,
                    snippet: snippet(&query.replace('\n', " ")),
                },
                Err(failure) => ValidationRow {
                    siem: siem.to_string(),
                    passed: false,
                    snippet: snippet(failure.message.lines().next().unwrap_or_default()),
                },
            }
        })
        .collect();

    ValidationReport {
        rule: rule_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<inline>".into()),
        pipeline: pipeline.to_string(),
        rows,
    }
}

fn snippet(text: &str) -> String {
    text.trim().chars().take(SNIPPET_LEN).collect()
}
