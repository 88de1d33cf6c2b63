//! Hermetic sandbox for end-to-end tests of the `liquiconv` binary.
//! - A work tree to scan, optionally turned into a git repository
//! - A private `bin/` placed first on `PATH` for fake `mvn`/`curl`/`java`
//! - A private `TMPDIR`, also the place tests point the jar cache at
//! - A call log fake tools append to through `$SANDBOX_LOG`
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ## Quick example
//! ```no_run
//! use liquiconv_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.write("pom.xml", "<project/>")
//!     .tool("mvn", r#"echo "mvn $*" >> "$SANDBOX_LOG""#)
//!     .init_git()
//!     .commit("init");
//!
//! let out = sb.run("liquiconv", ["--root", "."]);
//! assert_eq!(out.code, Some(0));
//! ```

use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use duct::Expression;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Sandbox {
    root: TempDir,
    pub work: PathBuf,
    pub bin: PathBuf,
    pub tmp: PathBuf,
    pub home: PathBuf,
    log: PathBuf,
}

/// Exit code and captured streams of a finished command.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create a new sandbox; all state is under an auto-cleaned TempDir.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let work = root.child("work").to_path_buf();
        let bin = root.child("bin").to_path_buf();
        let tmp = root.child("tmp").to_path_buf();
        let home = root.child("home").to_path_buf();
        let log = root.child("calls.log").to_path_buf();

        for dir in [&work, &bin, &tmp, &home] {
            fs::create_dir_all(dir).expect("create sandbox dir");
        }
        fs::write(&log, "").expect("create call log");

        Self {
            root,
            work,
            bin,
            tmp,
            home,
            log,
        }
    }

    /// The tree commands run in and `write` is relative to.
    pub fn root_path(&self) -> &Path {
        &self.work
    }

    /// Write/overwrite a file relative to the work tree.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.work.join(rel);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    /// Install a fake executable named `name` whose body is a POSIX shell
    /// script. Replaces any earlier tool of the same name.
    pub fn tool(&mut self, name: &str, body: &str) -> &mut Self {
        let path = self.bin.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake tool");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("make fake tool executable");
        }
        self
    }

    /// Place a file in the sandbox temp dir, e.g. a pre-downloaded jar.
    pub fn write_tmp<S: AsRef<[u8]>>(&mut self, name: &str, contents: S) -> &mut Self {
        fs::write(self.tmp.join(name), contents).expect("write tmp file");
        self
    }

    /// `git init` the work tree.
    pub fn init_git(&mut self) -> &mut Self {
        self.git(&["init", "-q"]);
        self
    }

    /// Stage everything and commit.
    pub fn commit<S: AsRef<str>>(&mut self, msg: S) -> &mut Self {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", msg.as_ref()]);
        self
    }

    /// Everything fake tools appended to `$SANDBOX_LOG`, with sandbox paths
    /// replaced by `<root>` and `<tmp>`.
    pub fn calls(&self) -> String {
        let raw = fs::read_to_string(&self.log).expect("read call log");
        self.redact(&raw)
    }

    /// Forget previous calls.
    pub fn clear_calls(&mut self) -> &mut Self {
        fs::write(&self.log, "").expect("truncate call log");
        self
    }

    /// Replace sandbox paths (canonical and as created) with placeholders.
    pub fn redact(&self, s: &str) -> String {
        let mut out = s.to_string();
        for (dir, label) in [(&self.work, "<root>"), (&self.tmp, "<tmp>")] {
            if let Ok(canonical) = fs::canonicalize(dir) {
                out = out.replace(&*canonical.to_string_lossy(), label);
            }
            out = out.replace(&*dir.to_string_lossy(), label);
        }
        out
    }

    /// Build a `duct::Expression` pre-wired with the sandbox env, run in the
    /// work tree. Useful for system binaries.
    pub fn cmd<S: AsRef<OsStr>, I: IntoIterator>(&self, program: S, args: I) -> Expression
    where
        I::Item: AsRef<OsStr>,
    {
        let program_str = program.as_ref().to_string_lossy();
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();
        let expr = duct::cmd(program_str.as_ref(), args).dir(&self.work);
        self.inject_env(expr)
    }

    /// Run a cargo binary of the current package inside the sandbox. Never
    /// fails on a non-zero exit; inspect [`RunOutput::code`] instead.
    pub fn run<I>(&self, program: &str, args: I) -> RunOutput
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let cargo_bin_path = assert_cmd::cargo::cargo_bin(program);
        let output = self
            .cmd(cargo_bin_path, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .unwrap_or_else(|e| panic!("failed to start {program}: {e}"));

        RunOutput {
            code: output.status.code(),
            stdout: self.redact(&String::from_utf8_lossy(&output.stdout)),
            stderr: self.redact(&String::from_utf8_lossy(&output.stderr)),
        }
    }

    pub fn inject_env(&self, expr: Expression) -> Expression {
        let mut env_map: HashMap<String, String> = HashMap::new();

        let mut path = self.bin.to_string_lossy().into_owned();
        if let Ok(system_path) = std::env::var("PATH") {
            path.push(':');
            path.push_str(&system_path);
        }
        env_map.insert("PATH".into(), path);
        env_map.insert("HOME".into(), self.home.to_string_lossy().into_owned());
        env_map.insert("TMPDIR".into(), self.tmp.to_string_lossy().into_owned());
        env_map.insert("SANDBOX_LOG".into(), self.log.to_string_lossy().into_owned());
        env_map.insert("NO_COLOR".into(), "1".into());

        // Keep git from finding a repository above the sandbox or any user config.
        let ceiling =
            fs::canonicalize(self.root.path()).unwrap_or_else(|_| self.root.path().to_path_buf());
        env_map.insert(
            "GIT_CEILING_DIRECTORIES".into(),
            ceiling.to_string_lossy().into_owned(),
        );
        env_map.insert("GIT_CONFIG_NOSYSTEM".into(), "1".into());
        env_map.insert(
            "GIT_CONFIG_GLOBAL".into(),
            if cfg!(windows) { "NUL" } else { "/dev/null" }.into(),
        );
        for key in ["GIT_AUTHOR_NAME", "GIT_COMMITTER_NAME"] {
            env_map.insert(key.into(), "Sandbox".into());
        }
        for key in ["GIT_AUTHOR_EMAIL", "GIT_COMMITTER_EMAIL"] {
            env_map.insert(key.into(), "test@example.com".into());
        }

        expr.full_env(&env_map)
    }

    fn git(&self, args: &[&str]) {
        self.cmd("git", args)
            .stdout_null()
            .stderr_null()
            .run()
            .unwrap_or_else(|e| panic!("git {args:?} failed: {e}"));
    }
}
