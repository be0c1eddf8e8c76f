//! Fake TypeScript compiler executables.
//!
//! A [`FakeTsc`] prints canned output, exits with a chosen status and
//! records the directory and arguments it was invoked with, so tests can
//! drive `shinobi tsc` without a Node.js toolchain.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use shinobi_env::TSC_ENV;
use std::fs;
use tempfile::TempDir;

/// A shell script standing in for `tsc`.
#[derive(Debug)]
pub struct FakeTsc {
    _dir: TempDir,
    root: Utf8PathBuf,
    program: Utf8PathBuf,
}

/// Make a script file executable on Unix platforms.
#[cfg(unix)]
fn make_script_executable(path: &Utf8Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("read metadata {path}"))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).with_context(|| format!("set permissions {path}"))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_script_executable(_path: &Utf8Path) -> Result<()> {
    Ok(())
}

impl FakeTsc {
    /// Create a compiler that prints `stdout` and exits with `exit_code`.
    ///
    /// # Errors
    ///
    /// Returns an error when the script cannot be written.
    pub fn new(stdout: &str, exit_code: i32) -> Result<Self> {
        let dir = TempDir::new().context("create fake tsc dir")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("temp dir {} is not UTF-8", path.display()))?;
        fs::write(root.join("stdout.txt"), stdout).context("write canned output")?;
        let program = root.join("tsc");
        let script = format!(
            concat!(
                "#!/bin/sh\n",
                "dir='{root}'\n",
                "pwd -P > \"$dir/cwd.txt\"\n",
                ": > \"$dir/args.txt\"\n",
                "for arg in \"$@\"; do\n",
                "  printf '%s\\n' \"$arg\" >> \"$dir/args.txt\"\n",
                "done\n",
                "cat \"$dir/stdout.txt\"\n",
                "exit {exit_code}\n",
            ),
            root = root,
            exit_code = exit_code,
        );
        fs::write(&program, script).with_context(|| format!("write script {program}"))?;
        make_script_executable(&program)?;
        Ok(Self {
            _dir: dir,
            root,
            program,
        })
    }

    /// Path of the executable.
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// The `SHINOBI_TSC` assignment selecting this compiler.
    pub fn env(&self) -> (&'static str, &str) {
        (TSC_ENV, self.program.as_str())
    }

    /// An assignment of `key` selecting this executable, for standing in
    /// for a program other than `tsc`.
    pub fn env_as(&self, key: &'static str) -> (&'static str, &str) {
        (key, self.program.as_str())
    }

    /// Arguments of the most recent invocation.
    ///
    /// # Errors
    ///
    /// Returns an error when the compiler has not run yet.
    pub fn recorded_args(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(self.root.join("args.txt")).context("read recorded args")?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    /// Working directory of the most recent invocation.
    ///
    /// # Errors
    ///
    /// Returns an error when the compiler has not run yet.
    pub fn recorded_cwd(&self) -> Result<Utf8PathBuf> {
        let text = fs::read_to_string(self.root.join("cwd.txt")).context("read recorded cwd")?;
        Ok(Utf8PathBuf::from(text.trim_end()))
    }
}
