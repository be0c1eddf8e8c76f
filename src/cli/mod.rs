//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Generated
//! Ninja files invoke the `capture` and `tsc` subcommands; `outputs` is a
//! debugging aid for the output naming applied at configure time.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Runtime helpers for Ninja graphs whose edges discover their own
/// dependencies.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if started in this directory.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available top-level commands for shinobi.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Run a script and record every module it loads in `<out>.depfile`.
    Capture(CaptureArgs),

    /// Run the TypeScript compiler and record the files it consulted.
    Tsc(TscArgs),

    /// Print the files the TypeScript compiler would emit.
    Outputs(OutputsArgs),
}

/// Arguments accepted by the `capture` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct CaptureArgs {
    /// Output the dependency record belongs to.
    #[arg(long, value_name = "FILE")]
    pub out: Utf8PathBuf,

    /// Script whose module graph is traced.
    #[arg(long, value_name = "SCRIPT")]
    pub entry: Option<Utf8PathBuf>,

    /// Extra file to record; may be repeated.
    #[arg(long = "dep", value_name = "FILE")]
    pub deps: Vec<Utf8PathBuf>,

    /// Write the program's standard output to `--out`.
    #[arg(long)]
    pub stdout: bool,

    /// Program to run, with its arguments.
    #[arg(last = true, value_name = "PROGRAM")]
    pub program: Vec<String>,
}

/// Arguments accepted by the `tsc` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct TscArgs {
    /// Directory the compiler runs in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub cwd: Utf8PathBuf,

    /// The edge's primary output, stamp or dyndep file.
    #[arg(long, value_name = "FILE")]
    pub out: Utf8PathBuf,

    /// Type-check only and touch `--out` on success.
    #[arg(long, conflicts_with = "dyndep_for")]
    pub typecheck: bool,

    /// Write a dyndep file naming the inputs of this output.
    #[arg(long, value_name = "TARGET")]
    pub dyndep_for: Option<String>,

    /// Compiler options, passed through unchanged.
    #[arg(allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,

    /// Entry points, or a single project file ending in `.json`.
    #[arg(last = true, value_name = "INPUTS")]
    pub inputs: Vec<Utf8PathBuf>,
}

/// Arguments accepted by the `outputs` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct OutputsArgs {
    /// Directory the inputs and options are relative to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub cwd: Utf8PathBuf,

    /// Compiler options as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub options: Option<String>,

    /// Resolve the inputs from this project file.
    #[arg(long, value_name = "FILE", conflicts_with = "inputs")]
    pub project: Option<Utf8PathBuf>,

    /// Entry points.
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<String>,
}
