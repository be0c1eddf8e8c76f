//! Spawning captured programs and streaming their output.
//! Internal to `runner`; the command flow lives in `runner/mod.rs`.

use super::RunnerError;
use crate::file_io;
use camino::Utf8Path;
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
};
use tracing::info;

mod redaction;
mod streaming;

use redaction::redact_sensitive_args;
use streaming::{ForwardStats, forward_child_output};

/// Where a program's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutTarget<'a> {
    /// Forward to this process's standard output.
    Parent,
    /// Replace the contents of this file.
    File(&'a Utf8Path),
}

fn log_command_execution(argv: &[String]) {
    let redacted = redact_sensitive_args(argv);
    info!("Running command: {}", redacted.join(" "));
}

/// Run `argv` to completion, streaming its output.
///
/// Standard error is always forwarded; standard output follows `target`.
/// Returns the exit status without judging it.
///
/// # Errors
///
/// Returns [`RunnerError::Spawn`] when the program cannot be started,
/// [`RunnerError::StdoutTarget`] when the output file cannot be created or
/// written, and [`RunnerError::Forward`] when waiting on the child fails.
pub fn run_program(argv: &[String], target: StdoutTarget<'_>) -> Result<ExitStatus, RunnerError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(RunnerError::MissingProgram);
    };
    let sink = open_stdout_sink(target)?;
    log_command_execution(argv);
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;
    let (status, stdout_stats) =
        spawn_and_stream_output(child, sink).map_err(|source| RunnerError::Forward {
            program: program.clone(),
            source,
        })?;
    if let (StdoutTarget::File(path), Some(kind)) =
        (target, stdout_stats.and_then(|stats| stats.failure))
    {
        return Err(RunnerError::StdoutTarget {
            path: path.to_path_buf(),
            source: io::Error::from(kind),
        });
    }
    Ok(status)
}

fn open_stdout_sink(target: StdoutTarget<'_>) -> Result<Box<dyn Write + Send>, RunnerError> {
    match target {
        StdoutTarget::Parent => Ok(Box::new(io::stdout())),
        StdoutTarget::File(path) => {
            let target_err = |source| RunnerError::StdoutTarget {
                path: path.to_path_buf(),
                source,
            };
            file_io::ensure_parent_dir(path).map_err(target_err)?;
            let file = File::create(path).map_err(target_err)?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

fn handle_forwarding_thread_result(
    result: thread::Result<ForwardStats>,
    stream_name: &str,
) -> Option<ForwardStats> {
    match result {
        Ok(stats) => {
            if stats.write_failed() {
                tracing::debug!("{stream_name} forwarding failed; output truncated");
            }
            Some(stats)
        }
        Err(err) => {
            tracing::warn!("{stream_name} forwarding thread panicked: {err:?}");
            None
        }
    }
}

fn spawn_and_stream_output(
    mut child: Child,
    sink: Box<dyn Write + Send>,
) -> io::Result<(ExitStatus, Option<ForwardStats>)> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(io::Error::other("child process missing stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(io::Error::other("child process missing stderr pipe"));
    };

    let out_handle =
        thread::spawn(move || forward_child_output(BufReader::new(stdout), sink, "stdout"));
    let err_handle = thread::spawn(move || {
        let mut lock = io::stderr().lock();
        forward_child_output(BufReader::new(stderr), &mut lock, "stderr")
    });

    let status = child.wait()?;
    let stdout_stats = handle_forwarding_thread_result(out_handle.join(), "stdout");
    handle_forwarding_thread_result(err_handle.join(), "stderr");
    Ok((status, stdout_stats))
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        tracing::debug!("failed to kill child after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        tracing::debug!("failed to reap child after {context}: {err}");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_owned(), "-c".to_owned(), script.to_owned()]
    }

    #[test]
    fn stdout_can_be_redirected_to_a_file() -> Result<()> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8Path::from_path(temp.path()).context("utf8 temp dir")?;
        let out = root.join("nested/out.txt");
        let status = run_program(&sh("printf 'hello\\n'"), StdoutTarget::File(&out))?;
        ensure!(status.success());
        let written = std::fs::read_to_string(&out).context("read redirected output")?;
        ensure!(written == "hello\n", "unexpected output {written:?}");
        Ok(())
    }

    #[test]
    fn exit_status_is_reported_unjudged() -> Result<()> {
        let status = run_program(&sh("exit 3"), StdoutTarget::Parent)?;
        ensure!(status.code() == Some(3));
        Ok(())
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let argv = vec!["shinobi-test-no-such-program".to_owned()];
        let err = run_program(&argv, StdoutTarget::Parent).expect_err("spawn fails");
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = run_program(&[], StdoutTarget::Parent).expect_err("no program");
        assert!(matches!(err, RunnerError::MissingProgram));
    }
}
