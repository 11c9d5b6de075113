//! Invocation of the `git` executable and classification of its failures

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use mdnote_core::domain::{GitOperation, RepoError};
use tokio::process::Command;
use tracing::{debug, trace};

/// Stderr fragments git prints when the remote has no matching branch
const MISSING_REMOTE_REF_MARKERS: &[&str] =
    &["couldn't find remote ref", "remote ref does not exist"];

/// Commit author passed as `-c user.name=.. -c user.email=..`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Captured result of one git process
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs git with a fixed environment
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
}

impl Default for Git {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl Git {
    /// Uses a specific git binary instead of the one on `PATH`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs git in `cwd` and returns its output regardless of exit status
    ///
    /// Only a failure to start the process is an error here.
    pub async fn output<I, S>(
        &self,
        cwd: &Path,
        identity: Option<&Identity>,
        args: I,
    ) -> Result<GitOutput, RepoError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(id) = identity {
            cmd.arg("-c")
                .arg(format!("user.name={}", id.name))
                .arg("-c")
                .arg(format!("user.email={}", id.email));
        }
        cmd.args(args);

        trace!(command = ?cmd.as_std(), "Running git");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RepoError::GitUnavailable(format!("{}: {}", self.program, e))
            } else {
                RepoError::Io(e)
            }
        })?;

        let out = GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        debug!(code = ?out.code, cwd = %cwd.display(), "git exited");
        Ok(out)
    }

    /// Runs git and returns stdout, mapping a non-zero exit to a [`RepoError`]
    pub async fn run<I, S>(
        &self,
        operation: GitOperation,
        cwd: &Path,
        identity: Option<&Identity>,
        args: I,
    ) -> Result<String, RepoError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = self.output(cwd, identity, args).await?;
        if out.success() {
            Ok(out.stdout)
        } else {
            Err(classify_failure(operation, out.code, &out.stderr))
        }
    }
}

/// Returns true when stderr says the remote branch does not exist yet
pub fn is_missing_remote_ref(stderr: &str) -> bool {
    MISSING_REMOTE_REF_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// Maps a failed git exit to the error taxonomy
///
/// Operations that talk to a remote become `TransportFailure` carrying the
/// headline line of stderr and the full text as details. Anything else is a
/// plain `Command` failure.
pub fn classify_failure(operation: GitOperation, code: Option<i32>, stderr: &str) -> RepoError {
    match operation {
        GitOperation::Pull | GitOperation::Push | GitOperation::Clone => {
            RepoError::TransportFailure {
                operation,
                message: headline(stderr, code),
                details: (!stderr.is_empty()).then(|| stderr.to_string()),
            }
        }
        _ => RepoError::Command {
            operation,
            code,
            stderr: stderr.to_string(),
        },
    }
}

/// The most telling line of git's stderr
fn headline(stderr: &str, code: Option<i32>) -> String {
    let lines = || stderr.lines().map(str::trim).filter(|l| !l.is_empty());

    lines()
        .find_map(|l| {
            l.strip_prefix("fatal:")
                .or_else(|| l.strip_prefix("error:"))
                .map(|rest| rest.trim().to_string())
        })
        .or_else(|| lines().next().map(str::to_string))
        .unwrap_or_else(|| match code {
            Some(c) => format!("git exited with code {}", c),
            None => "git was terminated by a signal".to_string(),
        })
}
