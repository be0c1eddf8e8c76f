//! Invoking the compiler executable.

use super::{TscError, error_lines};
use camino::{Utf8Path, Utf8PathBuf};
use shinobi_env::{NODE_ENV, NODE_PROGRAM, TSC_ENV, TSC_PROGRAM};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Node.js program asking the `typescript` package for emitted file names.
const EMITTED_FILES_SCRIPT: &str = include_str!("emitted_files.cjs");

/// Exit status of [`EMITTED_FILES_SCRIPT`] when `typescript` cannot be loaded.
const TYPESCRIPT_MISSING: i32 = 3;

/// What one compiler run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOutput {
    /// `true` when the compiler exited with status zero.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CompilerOutput {
    /// Standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// The seam between the resolver and the compiler executable.
pub trait Compiler {
    /// Run the compiler in `cwd` with `args` and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`TscError::Spawn`] when the compiler cannot be started.
    fn invoke(&self, cwd: &Utf8Path, args: &[String]) -> Result<CompilerOutput, TscError>;

    /// Ask the compiler which files a run in `cwd` with `args` would emit,
    /// relative to `cwd`.
    ///
    /// `None` means the compiler cannot name its outputs and the caller must
    /// derive them.
    ///
    /// # Errors
    ///
    /// Returns [`TscError::CompilationFailed`] when the compiler rejects the
    /// command line and [`TscError::EmittedFiles`] when its answer cannot be
    /// parsed.
    fn emitted_files(
        &self,
        _cwd: &Utf8Path,
        _args: &[String],
    ) -> Result<Option<Vec<String>>, TscError> {
        Ok(None)
    }
}

/// Runs a `tsc` executable as a child process.
///
/// Output names come from the `typescript` package itself, loaded by Node.js
/// from the compile's working directory or from beside the `tsc` executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCompiler {
    program: Utf8PathBuf,
    node: Utf8PathBuf,
}

impl ProcessCompiler {
    /// Use the compiler named by `SHINOBI_TSC`, or `tsc` from `PATH`, and the
    /// Node.js named by `SHINOBI_NODE`, or `node` from `PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(resolve_tsc_program()).with_node(resolve_node_program())
    }

    /// Use the compiler at `program`.
    #[must_use]
    pub fn new(program: Utf8PathBuf) -> Self {
        Self {
            program,
            node: Utf8PathBuf::from(NODE_PROGRAM),
        }
    }

    /// Load `typescript` through the Node.js executable at `node`.
    #[must_use]
    pub fn with_node(mut self, node: Utf8PathBuf) -> Self {
        self.node = node;
        self
    }

    /// Executable this compiler runs.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Node.js executable used to name outputs.
    #[must_use]
    pub fn node(&self) -> &Utf8Path {
        &self.node
    }
}

impl Default for ProcessCompiler {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Compiler for ProcessCompiler {
    fn invoke(&self, cwd: &Utf8Path, args: &[String]) -> Result<CompilerOutput, TscError> {
        debug!(program = %self.program, cwd = %cwd, args = args.join(" "), "invoking compiler");
        let output = Command::new(self.program.as_std_path())
            .current_dir(cwd.as_std_path())
            .args(args)
            .output()
            .map_err(|source| TscError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!(status = %output.status, "compiler exited");
        Ok(CompilerOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn emitted_files(
        &self,
        cwd: &Utf8Path,
        args: &[String],
    ) -> Result<Option<Vec<String>>, TscError> {
        debug!(node = %self.node, cwd = %cwd, args = args.join(" "), "asking typescript for output names");
        let spawned = Command::new(self.node.as_std_path())
            .current_dir(cwd.as_std_path())
            .args(["--input-type=commonjs", "--eval", EMITTED_FILES_SCRIPT, "--"])
            .arg(self.program.as_str())
            .args(args)
            .output();
        let output = match spawned {
            Ok(output) => output,
            Err(err) => {
                debug!(node = %self.node, error = %err, "node unavailable; deriving output names");
                return Ok(None);
            }
        };
        if output.status.code() == Some(TYPESCRIPT_MISSING) {
            debug!(cwd = %cwd, "typescript package not found; deriving output names");
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TscError::CompilationFailed {
                diagnostics: error_lines(&format!("{stdout}{stderr}")),
            });
        }
        let files = serde_json::from_str(&stdout).map_err(|source| TscError::EmittedFiles {
            program: self.node.clone(),
            source,
        })?;
        Ok(Some(files))
    }
}

fn resolve_program_with<F>(key: &str, default: &str, mut read_env: F) -> Utf8PathBuf
where
    F: FnMut(&str) -> Option<OsString>,
{
    read_env(key)
        .and_then(|value| {
            let path = PathBuf::from(value);
            Utf8PathBuf::from_path_buf(path).ok()
        })
        .unwrap_or_else(|| Utf8PathBuf::from(default))
}

/// Resolve the compiler executable, honouring the `SHINOBI_TSC` override.
#[must_use]
pub fn resolve_tsc_program() -> Utf8PathBuf {
    resolve_program_with(TSC_ENV, TSC_PROGRAM, |key| env::var_os(key))
}

/// Resolve the Node.js executable, honouring the `SHINOBI_NODE` override.
#[must_use]
pub fn resolve_node_program() -> Utf8PathBuf {
    resolve_program_with(NODE_ENV, NODE_PROGRAM, |key| env::var_os(key))
}
