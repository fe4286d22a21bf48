//! Fan-out of one rule over several SIEMs.
//!
//! Conversions run one at a time in the requested order. A failing SIEM is
//! recorded and never stops the ones after it.

use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::convert::{ConversionFailure, ConversionRequest, Converter, FailureKind};
use crate::engine::Engine;
use crate::registry::{self, DEFAULT_PIPELINE};

/// Settings shared by every conversion in a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions<'a> {
    pub pipeline: &'a str,
    /// Source file of the rule, handed to the engine as-is when present.
    pub rule_path: Option<&'a Path>,
}

impl Default for RunOptions<'_> {
    fn default() -> Self {
        Self {
            pipeline: DEFAULT_PIPELINE,
            rule_path: None,
        }
    }
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionBlock {
    pub siem: String,
    pub backend: String,
    pub query: String,
}

/// A failed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiemError {
    pub siem: String,
    pub kind: FailureKind,
    pub message: String,
}

impl std::fmt::Display for SiemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            // Already reads "Unknown SIEM: <id>. ..."
            FailureKind::UnknownSiem => write!(f, "{}", self.message),
            _ => write!(f, "{}: {}", self.siem, self.message),
        }
    }
}

/// Everything a run produced, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub blocks: Vec<ConversionBlock>,
    pub errors: Vec<SiemError>,
}

impl RunReport {
    /// 0 when every requested SIEM converted, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.errors.is_empty() {
            0
        } else {
            1
        }
    }

    pub fn has_output(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Convert `rule_text` for each id in `siems`, in order.
pub fn run<E: Engine, S: AsRef<str>>(
    converter: &Converter<E>,
    rule_text: &str,
    siems: &[S],
    options: &RunOptions<'_>,
) -> RunReport {
    let mut report = RunReport {
        pipeline: options.pipeline.to_string(),
        ..RunReport::default()
    };

    for id in siems {
        let id = id.as_ref();
        let Some(backend) = registry::lookup(id) else {
            warn!(siem = id, "unknown SIEM, skipping");
            report.errors.push(error_for(id, ConversionFailure::unknown_siem(id)));
            continue;
        };

        let request = ConversionRequest::new(rule_text, id)
            .pipeline(options.pipeline)
            .rule_path(options.rule_path);

        match converter.convert(&request) {
            Ok(query) => report.blocks.push(ConversionBlock {
                siem: id.to_string(),
                backend: backend.backend.to_string(),
                query,
            }),
            Err(failure) => {
                warn!(siem = id, kind = ?failure.kind, "conversion failed");
                report.errors.push(error_for(id, failure));
            }
        }
    }

    report
}

fn error_for(siem: &str, failure: ConversionFailure) -> SiemError {
    SiemError {
        siem: siem.to_string(),
        kind: failure.kind,
        message: failure.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{MockEngine, Reply};
    use crate::registry::{canonical_order, expand_selection};

    const RULE: &str = "title: Test\ndetection:\n  sel:\n    Image: '*whoami*'\n  condition: sel";

    #[test]
    fn all_converts_each_canonical_siem_once_in_order() {
        let converter = Converter::new(MockEngine::succeeding("q"));
        let ids = expand_selection(&["all", "splunk", "all"]);
        let report = run(&converter, RULE, &ids, &RunOptions::default());

        let siems: Vec<&str> = report.blocks.iter().map(|b| b.siem.as_str()).collect();
        assert_eq!(siems, canonical_order());
        assert_eq!(converter.engine().calls().len(), canonical_order().len());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn unknown_siem_recorded_and_skipped() {
        let converter = Converter::new(MockEngine::succeeding("q"));
        let report = run(&converter, RULE, &["nope", "splunk"], &RunOptions::default());

        assert_eq!(converter.engine().calls().len(), 1);
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, FailureKind::UnknownSiem);
        assert!(report.errors[0].to_string().starts_with("Unknown SIEM: nope."));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn partial_failure_keeps_successes() {
        let engine = MockEngine::succeeding("index=main Image=*whoami*").on_backend(
            "elasticsearch",
            Reply::Exit {
                code: 1,
                stdout: "",
                stderr: "Unknown target: elasticsearch",
            },
        );
        let converter = Converter::new(engine);
        let report = run(
            &converter,
            RULE,
            &["splunk", "elasticsearch"],
            &RunOptions::default(),
        );

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].siem, "splunk");
        assert_eq!(report.errors.len(), 1);
        let line = report.errors[0].to_string();
        assert!(line.starts_with("elasticsearch: Unknown target: elasticsearch"));
        assert!(line.contains("sigma plugin install elasticsearch"));
    }

    #[test]
    fn all_failed_has_no_output() {
        let converter = Converter::new(MockEngine::failing(1, "Unknown target: splunk"));
        let report = run(&converter, RULE, &["splunk"], &RunOptions::default());
        assert!(!report.has_output());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn rule_path_and_pipeline_reach_engine() {
        let rule = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        std::fs::write(rule.path(), RULE).unwrap();
        let converter = Converter::new(MockEngine::succeeding("q"));
        let options = RunOptions {
            pipeline: "windows",
            rule_path: Some(rule.path()),
        };
        run(&converter, RULE, &["splunk", "loki"], &options);

        for call in converter.engine().calls() {
            assert_eq!(call.pipeline, "windows");
            assert_eq!(call.rule_path, rule.path());
        }
    }

    #[test]
    fn each_conversion_gets_its_own_temp_file() {
        let converter = Converter::new(MockEngine::succeeding("q"));
        run(&converter, RULE, &["splunk", "datadog"], &RunOptions::default());
        let calls = converter.engine().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.rule_existed && !c.rule_path.exists()));
    }
}
