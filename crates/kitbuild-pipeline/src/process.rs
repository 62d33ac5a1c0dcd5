//! External tool invocation.
//!
//! Every compiler, bundler, doc generator and package manager call goes through
//! [`CommandRunner`], which keeps process spawning in one place and lets tests
//! substitute a recording runner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::paths::ProjectPaths;

/// A single external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Name of the program without its directory, for log lines.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a non-zero exit into a [`ToolError`].
    pub fn check(self, invocation: &Invocation) -> Result<Self, ToolError> {
        if self.success {
            return Ok(self);
        }
        Err(ToolError::Failed {
            program: invocation.program_name(),
            status: self
                .code
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "a signal".to_string()),
            stderr: self.stderr,
        })
    }
}

/// Errors from running an external tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} terminated with {status}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Runs external commands.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, capturing output. Only spawn failures are errors;
    /// a non-zero exit is reported through [`ToolOutput::success`].
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;

    /// Start a long-running command without waiting for it.
    fn spawn_detached(&self, invocation: &Invocation) -> Result<(), ToolError>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        tracing::debug!("$ {} (in {})", invocation, invocation.cwd.display());

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ToolError::Spawn {
                program: invocation.program.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&self, invocation: &Invocation) -> Result<(), ToolError> {
        tracing::debug!("$ {} & (in {})", invocation, invocation.cwd.display());

        Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| ToolError::Spawn {
                program: invocation.program.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }
}

/// Program locations of the external tools.
///
/// A value containing a path separator is resolved against the project root;
/// a bare name is left for `PATH` lookup.
#[derive(Debug, Clone)]
pub struct Tools {
    pub compiler: String,
    pub bundler: String,
    pub doc_generator: String,
    pub package_manager: String,
    pub dev_server: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            compiler: "./node_modules/@cloukit/library-build-chain/node_modules/.bin/ngc"
                .to_string(),
            bundler: "./node_modules/@cloukit/library-build-chain/node_modules/.bin/rollup"
                .to_string(),
            doc_generator: "./node_modules/compodoc/bin/index-cli.js".to_string(),
            package_manager: "yarn".to_string(),
            dev_server: "ng".to_string(),
        }
    }
}

impl Tools {
    /// Resolve a configured tool location to the program to execute.
    pub fn program(&self, paths: &ProjectPaths, tool: &str) -> PathBuf {
        let path = Path::new(tool);
        if tool.contains('/') || tool.contains('\\') || path.is_absolute() {
            paths.resolve(path)
        } else {
            PathBuf::from(tool)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Layout;

    #[test]
    fn relative_tools_resolve_against_root() {
        let paths = ProjectPaths::new("/repo", Layout::default());
        let tools = Tools::default();

        assert_eq!(
            tools.program(&paths, &tools.compiler),
            PathBuf::from("/repo/./node_modules/@cloukit/library-build-chain/node_modules/.bin/ngc")
        );
        assert_eq!(
            tools.program(&paths, &tools.package_manager),
            PathBuf::from("yarn")
        );
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let inv = Invocation::new("doc", "/repo").args(["--name", "toggle v1.0.0"]);
        assert_eq!(inv.to_string(), "doc --name \"toggle v1.0.0\"");
    }

    #[test]
    fn check_reports_exit_code() {
        let inv = Invocation::new("/bin/ngc", "/repo");
        let err = ToolOutput::failed(2, "boom").check(&inv).unwrap_err();
        assert_eq!(err.to_string(), "ngc terminated with exit code 2");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("sh", dir.path()).args(["-c", "echo hello; exit 3"]);

        let output = SystemRunner.run(&inv).unwrap();

        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("definitely-not-a-real-tool-kitbuild", dir.path());
        assert!(matches!(
            SystemRunner.run(&inv),
            Err(ToolError::Spawn { .. })
        ));
    }
}
