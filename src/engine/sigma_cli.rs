//! Subprocess engine: runs sigma-cli with a timeout.

use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::{tls, Engine, EngineError, EngineOutput, Invocation, DEFAULT_TIMEOUT};
use crate::error::{ForgeError, Result};

/// sigma-cli invoked as a child process.
#[derive(Debug, Clone)]
pub struct SigmaCli {
    program: PathBuf,
    /// Arguments placed before `convert`, e.g. `-m sigma` for the module form.
    prefix: Vec<OsString>,
    timeout: Duration,
    ca_bundle: Option<PathBuf>,
}

impl SigmaCli {
    /// Locate sigma-cli: the `sigma` executable on `PATH`, else the Python
    /// module through `python3 -m sigma` / `python -m sigma`.
    ///
    /// When nothing is found the bare `sigma` name is kept so the spawn fails
    /// with a not-found error at conversion time.
    pub fn discover() -> Self {
        if let Ok(exe) = which::which("sigma") {
            return Self::new(exe, Vec::new());
        }
        for interpreter in ["python3", "python"] {
            if let Ok(python) = which::which(interpreter) {
                debug!(interpreter = %python.display(), "sigma not on PATH, using module form");
                return Self::new(python, vec!["-m".into(), "sigma".into()]);
            }
        }
        Self::new(PathBuf::from("sigma"), Vec::new())
    }

    /// Use an explicit command line, e.g. `["python3", "-m", "sigma"]`.
    pub fn from_command<S: AsRef<str>>(command: &[S]) -> Result<Self> {
        let (program, rest) = command
            .split_first()
            .ok_or_else(|| ForgeError::Config("engine command must not be empty".into()))?;
        let program = program.as_ref().trim();
        if program.is_empty() {
            return Err(ForgeError::Config("engine command must not be empty".into()));
        }
        let prefix = rest.iter().map(|a| OsString::from(a.as_ref())).collect();
        Ok(Self::new(PathBuf::from(program), prefix))
    }

    fn new(program: PathBuf, prefix: Vec<OsString>) -> Self {
        Self {
            program,
            prefix,
            timeout: DEFAULT_TIMEOUT,
            ca_bundle: tls::find_system_bundle(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the CA bundle handed to the engine.
    pub fn with_ca_bundle(mut self, bundle: Option<PathBuf>) -> Self {
        if bundle.is_some() {
            self.ca_bundle = bundle;
        }
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full command line for an invocation (program first).
    pub fn command_line(&self, invocation: &Invocation<'_>) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(1 + self.prefix.len() + 6);
        argv.push(self.program.as_os_str().to_os_string());
        argv.extend(self.prefix.iter().cloned());
        argv.extend(invocation.args());
        argv
    }
}

impl Engine for SigmaCli {
    fn run(&self, invocation: &Invocation<'_>) -> std::result::Result<EngineOutput, EngineError> {
        debug!(
            program = %self.program.display(),
            backend = invocation.backend,
            pipeline = invocation.pipeline,
            rule = %invocation.rule_path.display(),
            "running sigma convert"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (var, value) in tls::engine_env(|var| std::env::var_os(var), self.ca_bundle.as_deref())
        {
            cmd.env(var, value);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => EngineError::NotFound(self.program.display().to_string()),
            _ => EngineError::Io(e),
        })?;

        // Drain both pipes while waiting so a large query cannot fill the
        // pipe buffer and stall the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let waited = match child.wait_timeout(self.timeout) {
            Ok(waited) => waited,
            Err(e) => {
                reap(&mut child);
                return Err(EngineError::Io(e));
            }
        };

        match waited {
            Some(status) => {
                let output = EngineOutput {
                    exit_code: status.code().unwrap_or(-1),
                    stdout: stdout.join().unwrap_or_default(),
                    stderr: stderr.join().unwrap_or_default(),
                };
                debug!(exit_code = output.exit_code, "sigma convert finished");
                Ok(output)
            }
            None => {
                warn!(
                    backend = invocation.backend,
                    timeout_secs = self.timeout.as_secs(),
                    "sigma convert timed out, killing"
                );
                reap(&mut child);
                Err(EngineError::Timeout(self.timeout))
            }
        }
    }
}

/// Kill a child we are giving up on and collect its exit status.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
