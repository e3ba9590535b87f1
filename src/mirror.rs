//! Local mirror of the remote document repository.
//!
//! Clone when the mirror directory is absent, otherwise fetch and hard-reset
//! to the remote branch. Git runs as a subprocess with a bounded per-command
//! timeout; every failure mode is a [`SyncError`] and nothing is retried.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::MirrorConfig;
use crate::error::SyncError;

/// What `ensure_up_to_date` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Pulled,
}

pub struct Mirror {
    dir: PathBuf,
    url: String,
    branch: String,
    shallow: bool,
    timeout: Duration,
}

impl Mirror {
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            dir: config.mirror_dir(),
            url: config.url.clone(),
            branch: config.branch.clone(),
            shallow: config.shallow,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clone if no local mirror exists, otherwise pull the remote branch.
    pub fn ensure_up_to_date(&self) -> Result<SyncOutcome, SyncError> {
        if self.dir.join(".git").exists() {
            self.pull()?;
            Ok(SyncOutcome::Pulled)
        } else {
            self.clone_fresh()?;
            Ok(SyncOutcome::Cloned)
        }
    }

    fn clone_fresh(&self) -> Result<(), SyncError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SyncError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut args = vec!["clone", "--branch", self.branch.as_str(), "--single-branch"];
        if self.shallow {
            args.extend(["--depth", "1"]);
        }
        let dest = self.dir.to_string_lossy().to_string();
        args.push(self.url.as_str());
        args.push(dest.as_str());

        self.run_git(None, &args).map(|_| ())
    }

    fn pull(&self) -> Result<(), SyncError> {
        self.run_git(Some(&self.dir), &["fetch", "origin", self.branch.as_str()])?;
        let remote_ref = format!("origin/{}", self.branch);
        self.run_git(Some(&self.dir), &["reset", "--hard", &remote_ref])
            .map(|_| ())
    }

    /// File contents by mirror-relative path.
    ///
    /// `Ok(None)` when the path does not exist, is not a regular file, or
    /// escapes the mirror root — absence is a defined result, not an error.
    pub fn read_relative(&self, relative: &str) -> std::io::Result<Option<String>> {
        if !self.dir.exists() {
            return Ok(None);
        }
        let root = self.dir.canonicalize()?;
        let full = match root.join(relative).canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if !full.starts_with(&root) || !full.is_file() {
            return Ok(None);
        }
        std::fs::read_to_string(&full).map(Some)
    }

    /// One-line HEAD summary (`<short-sha> <iso-date> <subject>`) for the
    /// status command. Requires a synced mirror.
    pub fn head_summary(&self) -> Result<String, SyncError> {
        let out = self.run_git(Some(&self.dir), &["log", "-1", "--format=%h %cI %s"])?;
        Ok(out.trim().to_string())
    }

    /// Run one git command under the configured timeout, returning stdout.
    fn run_git(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, SyncError> {
        let mut cmd = Command::new("git");
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(SyncError::Spawn)?;
        let subcommand = args.first().copied().unwrap_or("git").to_string();
        let output = wait_with_timeout(child, self.timeout).map_err(|e| match e {
            WaitError::Timeout => SyncError::Timeout {
                command: subcommand.clone(),
                seconds: self.timeout.as_secs(),
            },
            WaitError::Io(source) => SyncError::Spawn(source),
        })?;

        if !output.status_success {
            return Err(SyncError::Command {
                command: subcommand,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

struct GitOutput {
    status_success: bool,
    stdout: String,
    stderr: String,
}

enum WaitError {
    Timeout,
    Io(std::io::Error),
}

/// Poll the child until exit or deadline. Output is drained after exit;
/// git's output on these commands is small enough not to fill the pipe.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<GitOutput, WaitError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut stdout = String::new();
                let mut stderr = String::new();
                if let Some(mut out) = child.stdout.take() {
                    let _ = out.read_to_string(&mut stdout);
                }
                if let Some(mut err) = child.stderr.take() {
                    let _ = err.read_to_string(&mut stderr);
                }
                return Ok(GitOutput {
                    status_success: status.success(),
                    stdout,
                    stderr,
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(WaitError::Timeout);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(WaitError::Io(e)),
        }
    }
}
