//! Helpers for invoking the built `shinobi` binary in tests.
//!
//! These utilities use `assert_cmd` to locate the current workspace's
//! `shinobi` executable and run it in a controlled working directory,
//! capturing stdout/stderr for assertions.

use anyhow::{Context, Result};
use assert_cmd::Command;
use camino::Utf8Path;

/// Captured output from a `shinobi` invocation.
#[derive(Debug)]
pub struct ShinobiRun {
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
}

/// A `shinobi` command rooted at `current_dir`.
///
/// # Errors
///
/// Returns an error when the binary cannot be located.
pub fn shinobi_in(current_dir: &Utf8Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("shinobi").context("locate shinobi binary")?;
    cmd.current_dir(current_dir);
    Ok(cmd)
}

/// Run `shinobi` in `current_dir` with the supplied args and environment.
///
/// # Errors
///
/// Returns an error when `shinobi` cannot be located or the process cannot
/// be spawned.
pub fn run_shinobi_in(
    current_dir: &Utf8Path,
    args: &[&str],
    envs: &[(&str, &str)],
) -> Result<ShinobiRun> {
    let mut cmd = shinobi_in(current_dir)?;
    for (key, value) in envs {
        cmd.env(key, value);
    }
    let output = cmd.args(args).output().context("run shinobi command")?;
    Ok(ShinobiRun {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
    })
}
