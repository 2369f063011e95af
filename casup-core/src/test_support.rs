// casup-core/src/test_support.rs
//! Scripted stand-in for the `casuploader` binary.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use casup_aio::process::{CommandOutput, CommandRunner, Invocation};
use casup_common::error::{CasupError, Result};

#[derive(Debug, Clone)]
pub(crate) enum FakeResponse {
    Digest(String),
    DigestWithDetails(String, String),
    EmptyDigest,
    Exit(i32),
    Timeout,
}

pub(crate) struct FakeClient {
    version_output: String,
    version_fails: bool,
    default: FakeResponse,
    responses: HashMap<String, FakeResponse>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeClient {
    pub(crate) fn with_version(version_output: &str) -> Self {
        Self {
            version_output: version_output.to_string(),
            version_fails: false,
            default: FakeResponse::Digest("0000/0".to_string()),
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_version_probe(mut self) -> Self {
        self.version_fails = true;
        self
    }

    pub(crate) fn by_default(mut self, response: FakeResponse) -> Self {
        self.default = response;
        self
    }

    /// Scripts the response for an input file. `key` is either a basename or
    /// `<mode>:<basename>` with mode `zip`, `file` or `dir`.
    pub(crate) fn respond(mut self, key: &str, response: FakeResponse) -> Self {
        self.responses.insert(key.to_string(), response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn upload_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| !c.has_flag("-version"))
            .collect()
    }

    fn input_of(invocation: &Invocation) -> (&'static str, String) {
        for (flag, mode) in [("-zip-path", "zip"), ("-file-path", "file")] {
            if let Some(path) = invocation.arg_value(flag) {
                return (mode, basename(Path::new(path)));
            }
        }
        let dir = invocation.arg_value("-dir-path").unwrap_or_default();
        let name = fs::read_dir(dir)
            .ok()
            .and_then(|mut entries| entries.next())
            .and_then(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .unwrap_or_default();
        ("dir", name)
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn exited(code: i32) -> CommandOutput {
    CommandOutput {
        success: code == 0,
        status: format!("exit status: {code}"),
        stdout: String::new(),
        stderr: String::new(),
    }
}

impl CommandRunner for FakeClient {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if invocation.has_flag("-version") {
            if self.version_fails {
                return Ok(exited(1));
            }
            return Ok(CommandOutput {
                stdout: self.version_output.clone(),
                ..exited(0)
            });
        }

        let (mode, name) = Self::input_of(invocation);
        let response = self
            .responses
            .get(&format!("{mode}:{name}"))
            .or_else(|| self.responses.get(&name))
            .unwrap_or(&self.default)
            .clone();

        let digest_path = invocation
            .arg_value("-dump-digest")
            .expect("uploader invoked without -dump-digest");
        let details_path = invocation.arg_value("-dump-file-details");

        match response {
            FakeResponse::Digest(digest) => {
                fs::write(digest_path, digest)?;
                Ok(exited(0))
            }
            FakeResponse::DigestWithDetails(digest, details) => {
                fs::write(digest_path, digest)?;
                if let Some(path) = details_path {
                    fs::write(path, details)?;
                }
                Ok(exited(0))
            }
            FakeResponse::EmptyDigest => Ok(exited(0)),
            FakeResponse::Exit(code) => Ok(exited(code)),
            FakeResponse::Timeout => Err(CasupError::CommandTimeout(
                invocation.program.display().to_string(),
                invocation.timeout,
            )),
        }
    }
}
