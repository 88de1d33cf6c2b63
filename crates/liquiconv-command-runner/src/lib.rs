//! Thin wrapper around [`std::process::Command`] for the handful of ways the
//! converter talks to external tools:
//!
//! - [`CommandRunner::status_silent`]: only the exit status matters, all
//!   standard streams are redirected to the null device.
//! - [`CommandRunner::capture`]: stdout and stderr are merged into a single
//!   pipe (so the interleaving matches what a terminal would show) and
//!   returned with ANSI escapes stripped.
//! - [`CommandRunner::status`]: stdio is inherited, the child talks to the
//!   user directly.
//!
//! Programs are looked up on `PATH` before spawning so that a missing tool
//! produces an error naming it instead of a bare `No such file or directory`.

use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("'{program}' was not found on PATH")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to run '{program}'")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    /// Name of the program that could not be run.
    pub fn program(&self) -> &str {
        match self {
            RunError::NotFound { program, .. } | RunError::Io { program, .. } => program,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Exit status plus everything the child wrote to stdout and stderr.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run with every standard stream redirected to the null device.
    pub fn status_silent(&self) -> Result<ExitStatus> {
        let mut cmd = self.command()?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd.status().map_err(|e| self.io_error(e))
    }

    /// Run with inherited stdio.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.command()?;
        cmd.status().map_err(|e| self.io_error(e))
    }

    /// Run with stdout and stderr merged into one captured stream.
    pub fn capture(&self) -> Result<CommandOutput> {
        let mut cmd = self.command()?;
        let (mut reader, writer) = os_pipe::pipe().map_err(|e| self.io_error(e))?;
        let writer_clone = writer.try_clone().map_err(|e| self.io_error(e))?;
        cmd.stdin(Stdio::null()).stdout(writer).stderr(writer_clone);

        let mut child = cmd.spawn().map_err(|e| self.io_error(e))?;
        // The command still owns the write ends; drop it or the read below never sees EOF.
        drop(cmd);

        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|e| self.io_error(e))?;
        let status = child.wait().map_err(|e| self.io_error(e))?;

        let output = String::from_utf8_lossy(&strip_ansi_escapes::strip(&raw)).into_owned();
        log::debug!(
            "{} exited with {status} ({} bytes of output)",
            self.program,
            output.len()
        );
        Ok(CommandOutput { status, output })
    }

    fn command(&self) -> Result<Command> {
        let resolved = which::which(&self.program).map_err(|source| RunError::NotFound {
            program: self.program.clone(),
            source,
        })?;

        let mut cmd = Command::new(resolved);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        log::debug!("Running {}", self.display());
        Ok(cmd)
    }

    fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        if let Some(cwd) = &self.cwd {
            line.push_str(&format!(" (in {})", cwd.display()));
        }
        line
    }

    fn io_error(&self, source: io::Error) -> RunError {
        RunError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn capture_merges_stdout_and_stderr() {
        let out = CommandRunner::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .capture()
            .unwrap();

        assert!(!out.success());
        assert_eq!(out.status.code(), Some(3));
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[test]
    fn capture_strips_ansi_escapes() {
        let out = CommandRunner::new("sh")
            .args(["-c", r"printf '\033[1;32m[INFO]\033[0m done\n'"])
            .capture()
            .unwrap();

        assert!(out.success());
        assert_eq!(out.output, "[INFO] done\n");
    }

    #[test]
    fn current_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let out = CommandRunner::new("cat")
            .arg("marker.txt")
            .current_dir(dir.path())
            .capture()
            .unwrap();

        assert!(out.success());
        assert_eq!(out.output, "here");
    }

    #[test]
    fn status_silent_reports_exit_code() {
        let ok = CommandRunner::new("sh")
            .args(["-c", "echo ignored"])
            .status_silent()
            .unwrap();
        assert!(ok.success());

        let failed = CommandRunner::new("sh")
            .args(["-c", "exit 1"])
            .status_silent()
            .unwrap();
        assert!(!failed.success());
    }

    #[test]
    fn missing_program_is_named() {
        let err = CommandRunner::new("liquiconv-definitely-not-installed")
            .status_silent()
            .unwrap_err();

        assert!(matches!(err, RunError::NotFound { .. }));
        assert_eq!(err.program(), "liquiconv-definitely-not-installed");
        assert!(err.to_string().contains("not found on PATH"));
    }
}
