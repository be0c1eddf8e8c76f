//! In-process tests for [`shinobi::runner::run`].
//!
//! `-C` changes the working directory of the whole test process, so every
//! test here is serialised.

use anyhow::{Context, Result, ensure};
use clap::Parser;
use serial_test::serial;
use shinobi::capture::CaptureError;
use shinobi::cli::Cli;
use shinobi::depfile::{DependencyRecord, sorted_inputs};
use shinobi::runner::{self, RunnerError};
use test_support::Fixture;

fn parse(args: &[&str]) -> Result<Cli> {
    Cli::try_parse_from(args).context("parse arguments")
}

#[test]
#[serial]
fn capture_runs_relative_to_the_directory_flag() -> Result<()> {
    let fixture = Fixture::with_files(&[
        ("gen.cjs", "require('./lib');\n"),
        ("lib/index.js", "module.exports = {};\n"),
    ])?;
    let cli = parse(&[
        "shinobi", "-C", fixture.root().as_str(), "capture", "--out", "out/gen.txt", "--entry",
        "gen.cjs",
    ])?;
    runner::run(&cli)?;
    let record = DependencyRecord::read(&fixture.path("out/gen.txt.depfile"))
        .context("read dependency record")?;
    ensure!(sorted_inputs(&record) == ["gen.cjs", "lib/index.js"]);
    Ok(())
}

#[cfg(unix)]
#[test]
#[serial]
fn failing_program_surfaces_its_exit_status() -> Result<()> {
    let fixture = Fixture::with_files(&[("gen.mjs", "")])?;
    let cli = parse(&[
        "shinobi", "-C", fixture.root().as_str(), "capture", "--out", "out.txt", "--entry",
        "gen.mjs", "--", "sh", "-c", "exit 7",
    ])?;
    let err = runner::run(&cli).expect_err("program fails");
    let runner_err = err
        .downcast_ref::<RunnerError>()
        .context("runner error expected")?;
    ensure!(
        matches!(runner_err, RunnerError::ProgramFailed { status, .. } if status.code() == Some(7))
    );
    ensure!(!fixture.path("out.txt.depfile").exists());
    Ok(())
}

#[test]
#[serial]
fn missing_entry_is_a_capture_error() -> Result<()> {
    let fixture = Fixture::new()?;
    let cli = parse(&[
        "shinobi", "-C", fixture.root().as_str(), "capture", "--out", "out.txt", "--entry",
        "absent.mjs",
    ])?;
    let err = runner::run(&cli).expect_err("entry is missing");
    ensure!(matches!(
        err.downcast_ref::<CaptureError>(),
        Some(CaptureError::Canonicalize { .. })
    ));
    ensure!(!fixture.path("out.txt.depfile").exists());
    Ok(())
}

#[test]
#[serial]
fn missing_directory_is_reported() -> Result<()> {
    let fixture = Fixture::new()?;
    let missing = fixture.path("nowhere");
    let cli = parse(&["shinobi", "-C", missing.as_str(), "outputs", "a.ts"])?;
    let err = runner::run(&cli).expect_err("directory is missing");
    ensure!(err.to_string().contains("nowhere"), "got {err}");
    Ok(())
}
