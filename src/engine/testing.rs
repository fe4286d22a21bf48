//! Scripted engine for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::{Engine, EngineError, EngineOutput, Invocation};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Exit {
        code: i32,
        stdout: &'static str,
        stderr: &'static str,
    },
    NotFound,
    Timeout,
}

/// One recorded engine run.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub backend: String,
    pub pipeline: String,
    pub rule_path: PathBuf,
    pub rule_existed: bool,
    pub rule_text: String,
}

pub(crate) struct MockEngine {
    default: Reply,
    per_backend: HashMap<&'static str, Reply>,
    calls: RefCell<Vec<Call>>,
}

impl MockEngine {
    pub fn replying(default: Reply) -> Self {
        Self {
            default,
            per_backend: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn succeeding(stdout: &'static str) -> Self {
        Self::replying(Reply::Exit {
            code: 0,
            stdout,
            stderr: "",
        })
    }

    pub fn failing(code: i32, stderr: &'static str) -> Self {
        Self::replying(Reply::Exit {
            code,
            stdout: "",
            stderr,
        })
    }

    /// Use a different reply for one backend id.
    pub fn on_backend(mut self, backend: &'static str, reply: Reply) -> Self {
        self.per_backend.insert(backend, reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Engine for MockEngine {
    fn run(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, EngineError> {
        self.calls.borrow_mut().push(Call {
            backend: invocation.backend.to_string(),
            pipeline: invocation.pipeline.to_string(),
            rule_path: invocation.rule_path.to_path_buf(),
            rule_existed: invocation.rule_path.exists(),
            rule_text: std::fs::read_to_string(invocation.rule_path).unwrap_or_default(),
        });

        let reply = self
            .per_backend
            .get(invocation.backend)
            .unwrap_or(&self.default);
        match reply {
            Reply::Exit {
                code,
                stdout,
                stderr,
            } => Ok(EngineOutput {
                exit_code: *code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
            Reply::NotFound => Err(EngineError::NotFound("sigma".into())),
            Reply::Timeout => Err(EngineError::Timeout(Duration::from_secs(60))),
        }
    }
}
