//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution. Every command runs relative to the working
//! directory, which `-C` changes before dispatch; that directory is the
//! Ninja build directory when invoked from a generated graph.

mod error;
mod process;

pub use error::RunnerError;
pub use process::{StdoutTarget, run_program};

use crate::canonical::Canonicalizer;
use crate::capture::{self, CaptureContext};
use crate::cli::{CaptureArgs, Cli, Commands, OutputsArgs, TscArgs};
use crate::tsc::{CompilerOptions, Mode, ProcessCompiler, ProjectConfig, TscRun, declared_outputs};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the working directory cannot be changed or the
/// selected command fails.
pub fn run(cli: &Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("change directory to {}", dir.display()))?;
        debug!(directory = %dir.display(), "changed working directory");
    }
    match &cli.command {
        Commands::Capture(args) => handle_capture(args),
        Commands::Tsc(args) => handle_tsc(args),
        Commands::Outputs(args) => handle_outputs(args),
    }
}

/// Open the record, trace the entry, add explicit dependencies, then run the
/// program. Any failure removes the partial record.
fn handle_capture(args: &CaptureArgs) -> Result<()> {
    if args.stdout && args.program.is_empty() {
        return Err(RunnerError::MissingProgram.into());
    }
    let mut ctx = CaptureContext::open(args.out.as_str())?;
    match record_and_run(&mut ctx, args) {
        Ok(()) => {
            let record = ctx.finish()?;
            info!(
                output = %args.out,
                dependencies = record.inputs().count(),
                "wrote dependency record"
            );
            Ok(())
        }
        Err(err) => {
            if let Err(cleanup) = ctx.abandon() {
                warn!(error = %cleanup, "failed to remove partial dependency record");
            }
            Err(err)
        }
    }
}

fn record_and_run(ctx: &mut CaptureContext, args: &CaptureArgs) -> Result<()> {
    if let Some(entry) = &args.entry {
        capture::trace(ctx, entry)?;
    }
    for dep in &args.deps {
        ctx.add_dependency(dep)?;
    }
    if args.program.is_empty() {
        return Ok(());
    }
    let target = if args.stdout {
        StdoutTarget::File(&args.out)
    } else {
        StdoutTarget::Parent
    };
    let status = run_program(&args.program, target)?;
    if status.success() {
        Ok(())
    } else {
        Err(RunnerError::ProgramFailed {
            program: args.program.join(" "),
            status,
        }
        .into())
    }
}

fn handle_tsc(args: &TscArgs) -> Result<()> {
    let mode = match (&args.dyndep_for, args.typecheck) {
        (Some(target), _) => Mode::Dyndep {
            target: target.clone(),
        },
        (None, true) => Mode::Typecheck,
        (None, false) => Mode::Compile,
    };
    let (project, inputs) = split_project(&args.inputs);
    let run = TscRun {
        mode,
        out: args.out.clone(),
        cwd: args.cwd.clone(),
        project,
        inputs,
        args: args.args.clone(),
    };
    let canon = Canonicalizer::current_dir().context("resolve the build directory")?;
    let compiler = ProcessCompiler::from_env();
    debug!(compiler = %compiler.program(), "resolved compiler");
    let dependencies = run.execute(&compiler, &canon)?;
    info!(
        output = %args.out,
        dependencies = dependencies.len(),
        "recorded compiler dependencies"
    );
    Ok(())
}

/// A lone `.json` input is a project file rather than an entry point.
fn split_project(inputs: &[Utf8PathBuf]) -> (Option<Utf8PathBuf>, Vec<Utf8PathBuf>) {
    match inputs {
        [only] if only.extension() == Some("json") => (Some(only.clone()), Vec::new()),
        _ => (None, inputs.to_vec()),
    }
}

fn handle_outputs(args: &OutputsArgs) -> Result<()> {
    let options = args
        .options
        .as_deref()
        .map(CompilerOptions::from_json)
        .transpose()?
        .unwrap_or_default();
    let compiler = ProcessCompiler::from_env();
    let outputs = match &args.project {
        Some(project) => {
            ProjectConfig::resolve(&compiler, &args.cwd.join(project), &options)?
                .declared_outputs(&compiler)?
        }
        None => declared_outputs(&compiler, &args.inputs, &options, &args.cwd)?,
    };
    let mut stdout = io::stdout().lock();
    for path in outputs {
        writeln!(stdout, "{path}").context("write to stdout")?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(())
}
