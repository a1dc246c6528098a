//! Toolchain process execution.
//!
//! Every compiler and linker call goes through a [`CommandRunner`], so the
//! pipeline can be driven by a fake toolchain in tests.

use crate::error::BuildError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A single toolchain command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs an invocation to completion and captures its output.
///
/// Only a failure to start the process is an `Err`; a non-zero exit is
/// reported through [`ProcessOutput::success`].
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessOutput, BuildError>;
}

/// Spawns real processes and blocks until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessOutput, BuildError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().map_err(|source| BuildError::Toolchain {
            program: invocation.program.clone(),
            source,
        })?;

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display_quotes_spaces() {
        let inv = Invocation::new("clang++")
            .arg("-c")
            .arg("my file.cpp")
            .args(["-o", "out.o"]);
        assert_eq!(inv.to_string(), "clang++ -c \"my file.cpp\" -o out.o");
        assert!(inv.has_arg("-c"));
        assert!(!inv.has_arg("-MM"));
    }

    #[test]
    fn test_missing_program_is_toolchain_error() {
        let inv = Invocation::new("/definitely/not/a/compiler");
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, BuildError::Toolchain { .. }));
        assert_eq!(err.exit_code(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_status() {
        let out = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "echo hi; exit 3"]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hi");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_path_reaches_toolchain_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.cpp");
        std::fs::write(tmp.path().join(name), "").unwrap();

        let inv = Invocation::new("ls").arg("-d").arg(name).cwd(tmp.path());
        assert_eq!(inv.args[1].as_bytes(), b"caf\xe9.cpp");
        assert!(inv.to_string().starts_with("ls -d caf"));

        let out = SystemRunner.run(&inv).unwrap();
        assert!(out.success, "{}", out.stderr);
    }
}
